#![warn(missing_docs)]
//! Height fields, the layered stack model, and WRLD parsing.

mod heightfield;
mod parser;
mod stack;
mod terrain;

pub use heightfield::*;
pub use parser::*;
pub use stack::*;
pub use terrain::*;
