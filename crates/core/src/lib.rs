#![warn(missing_docs)]
//! Core primitives shared across the workspace.

pub mod config;
mod error;
mod quantize;

pub use config::{
    GeneratorConfig, LandscapeSettings, MissingCellPolicy, ParserSettings, StructureSettings,
    TerrainSettings, UvReference,
};
pub use error::{GenerationError, GenerationResult};
pub use quantize::Quantizer;

use glam::Vec3;
use serde::Serialize;

/// Local transform handed to the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    /// Per-axis scale.
    pub scale: Vec3,
    /// Position relative to the parent.
    pub position: Vec3,
}

/// Linear interpolation with `t` clamped to `[0, 1]`.
///
/// Height levels in WRLD files routinely exceed 1.0, so every lerp in the
/// generator saturates at its bounds instead of extrapolating.
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Linear interpolation without clamping `t`.
pub fn lerp_unclamped(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Stack heights in WRLD files are authored on a 0-10 slider.
pub const STACK_HEIGHT_RANGE: f32 = 10.0;
