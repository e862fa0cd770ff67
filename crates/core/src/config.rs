//! Tunable generation parameters.
//!
//! Every knob the generators read lives here as plain data. Callers build a
//! [`GeneratorConfig`] (usually from TOML), call [`GeneratorConfig::validate`]
//! once, and pass it to a generator. Nothing is computed from an invalid
//! configuration.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, GenerationResult};
use crate::quantize::{Quantizer, MAX_STEPS};

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Image-driven landscape mesh.
    pub landscape: LandscapeSettings,
    /// Terrain mesh built from the first WRLD layer.
    pub terrain: TerrainSettings,
    /// Stacked marker structures.
    pub structures: StructureSettings,
    /// Reference maxima for UV generation.
    pub uv: UvReference,
    /// WRLD parsing behaviour.
    pub parser: ParserSettings,
}

impl GeneratorConfig {
    /// Reject out-of-range values before any computation begins.
    pub fn validate(&self) -> GenerationResult<()> {
        self.landscape.validate()?;
        self.terrain.validate()?;
        self.structures.validate()?;
        self.uv.validate()?;
        Ok(())
    }
}

/// Settings for a mesh lifted from a grayscale image.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LandscapeSettings {
    /// Cells along X.
    pub width: u32,
    /// Cells along Z.
    pub depth: u32,
    /// Uniform scale applied to the mesh holder.
    pub scale: f32,
    /// Height reached at 100% darkness.
    pub max_height: f32,
}

impl Default for LandscapeSettings {
    fn default() -> Self {
        Self {
            width: 50,
            depth: 50,
            scale: 0.004,
            max_height: 12.0,
        }
    }
}

impl LandscapeSettings {
    fn validate(&self) -> GenerationResult<()> {
        require_grid("landscape", self.width, self.depth)?;
        require_positive("landscape.scale", self.scale)?;
        require_non_negative("landscape.max_height", self.max_height)?;
        Ok(())
    }
}

/// Settings for the terrain mesh derived from WRLD layer 0.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TerrainSettings {
    /// Uniform scale applied to the terrain holder (0.05 - 0.5).
    pub scale: f32,
    /// Overall height multiplier (0 - 5).
    pub height: f32,
    /// Quantization step count (1 - 20).
    pub steps: u32,
    /// Lower lerp bound for cell heights.
    pub min_height: f32,
    /// Upper lerp bound for cell heights.
    pub max_height: f32,
    /// Anchor the terrain holder is offset from.
    pub origin: Vec3,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            scale: 0.05,
            height: 0.1,
            steps: 3,
            min_height: 0.001,
            max_height: 4.0,
            origin: Vec3::ZERO,
        }
    }
}

impl TerrainSettings {
    /// Quantizer for the configured step count.
    pub fn quantizer(&self) -> GenerationResult<Quantizer> {
        Quantizer::new(self.steps)
    }

    fn validate(&self) -> GenerationResult<()> {
        require_range("terrain.scale", self.scale, 0.05, 0.5)?;
        require_range("terrain.height", self.height, 0.0, 5.0)?;
        if self.steps == 0 || self.steps > MAX_STEPS {
            return Err(GenerationError::configuration(format!(
                "terrain.steps must be within 1..={MAX_STEPS}, got {}",
                self.steps
            )));
        }
        require_bounds("terrain", self.min_height, self.max_height)?;
        if !self.origin.is_finite() {
            return Err(GenerationError::configuration(
                "terrain.origin must be finite",
            ));
        }
        Ok(())
    }
}

/// Settings for stacked marker structures.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StructureSettings {
    /// Height a floored structure collapses to.
    pub min_height: f32,
    /// Tallest a single structure may be (0.1 - 0.25).
    pub max_height: f32,
    /// Edge length of the square the structures are laid out in.
    pub stage_size: f32,
    /// Cells at or below this height level are floored.
    pub visibility_threshold: f32,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            min_height: 0.001,
            max_height: 0.2,
            stage_size: 1.0,
            visibility_threshold: 0.65,
        }
    }
}

impl StructureSettings {
    fn validate(&self) -> GenerationResult<()> {
        require_range("structures.max_height", self.max_height, 0.1, 0.25)?;
        require_bounds("structures", self.min_height, self.max_height)?;
        require_positive("structures.stage_size", self.stage_size)?;
        if !self.visibility_threshold.is_finite() {
            return Err(GenerationError::configuration(
                "structures.visibility_threshold must be finite",
            ));
        }
        Ok(())
    }
}

/// Fixed maxima UVs are divided by. UVs are not normalized to mesh extents.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UvReference {
    /// Divisor for the U coordinate (vertex X).
    pub x_max: f32,
    /// Divisor for the V coordinate (vertex height).
    pub y_max: f32,
}

impl Default for UvReference {
    fn default() -> Self {
        Self {
            x_max: 4.0,
            y_max: 4.0,
        }
    }
}

impl UvReference {
    fn validate(&self) -> GenerationResult<()> {
        require_positive("uv.x_max", self.x_max)?;
        require_positive("uv.y_max", self.y_max)?;
        Ok(())
    }
}

/// How the WRLD parser treats cells that carry no `heightLevel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MissingCellPolicy {
    /// Fail with a parse error naming the cell.
    #[default]
    Reject,
    /// Treat the cell as height level 0.
    Zero,
}

/// WRLD parsing behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ParserSettings {
    /// Policy for cells without a `heightLevel`.
    pub missing_cells: MissingCellPolicy,
}

fn require_grid(section: &str, width: u32, depth: u32) -> GenerationResult<()> {
    if width == 0 || depth == 0 {
        return Err(GenerationError::configuration(format!(
            "{section} grid must be at least 1x1, got {width}x{depth}"
        )));
    }
    Ok(())
}

fn require_positive(name: &str, value: f32) -> GenerationResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(GenerationError::configuration(format!(
            "{name} must be a positive number, got {value}"
        )));
    }
    Ok(())
}

fn require_non_negative(name: &str, value: f32) -> GenerationResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(GenerationError::configuration(format!(
            "{name} must not be negative, got {value}"
        )));
    }
    Ok(())
}

fn require_range(name: &str, value: f32, min: f32, max: f32) -> GenerationResult<()> {
    if !value.is_finite() || value < min || value > max {
        return Err(GenerationError::configuration(format!(
            "{name} must be within {min}..={max}, got {value}"
        )));
    }
    Ok(())
}

fn require_bounds(section: &str, min: f32, max: f32) -> GenerationResult<()> {
    if !min.is_finite() || !max.is_finite() || min > max {
        return Err(GenerationError::configuration(format!(
            "{section}.min_height ({min}) must not exceed {section}.max_height ({max})"
        )));
    }
    Ok(())
}
