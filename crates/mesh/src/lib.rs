#![warn(missing_docs)]
//! Grid mesh construction and the regeneration entry points built on it.

mod generator;
mod mesh;

pub use generator::{build_terrain, LandscapeGenerator, WorldGenerator, WorldScene};
pub use mesh::{Aabb, GridMesh, GridMeshBuilder, MeshHash, MeshSummary, MeshVertex};
