//! Terrain height functions fed to the grid mesh builder.
//!
//! Two flavours exist: a landscape lifted from a grayscale image (darker is
//! higher), and the WRLD terrain, which lifts one stack layer through the
//! quantizer and scales it by the layer's stack height.

use wrldgen_core::{
    lerp, GenerationError, GenerationResult, Quantizer, TerrainSettings, STACK_HEIGHT_RANGE,
};

use crate::heightfield::HeightSampler;
use crate::stack::{KernelProperties, StackModel};

/// Height of an image-driven landscape vertex: 100% darkness reaches `max_height`.
pub fn landscape_height(sampler: &HeightSampler<'_>, max_height: f32, x: u32, z: u32) -> f32 {
    if sampler.is_flat() {
        return 0.0;
    }
    max_height - sampler.sample(x, z) * max_height
}

/// Vertex heights for the terrain under a WRLD world.
///
/// The terrain grid has one vertex more than the world grid along each axis;
/// the extra row and column reuse the last cell.
#[derive(Debug)]
pub struct LayerTerrain<'a> {
    kernels: &'a [KernelProperties],
    cols: usize,
    rows: usize,
    quantizer: Quantizer,
    min_height: f32,
    max_height: f32,
    multiplier: f32,
}

impl<'a> LayerTerrain<'a> {
    /// Height function over `layer` of `model`.
    pub fn new(
        model: &'a StackModel,
        layer: usize,
        settings: &TerrainSettings,
    ) -> GenerationResult<Self> {
        let quantizer = settings.quantizer()?;
        let missing_layer = || {
            GenerationError::data_integrity(format!(
                "terrain needs layer {layer}, world has {} layers",
                model.layer_count()
            ))
        };
        let stack_height = model.stack_height(layer).map_err(|_| missing_layer())?;
        let kernels = model.layer_kernels(layer).map_err(|_| missing_layer())?;
        Ok(Self {
            kernels,
            cols: model.cols(),
            rows: model.rows(),
            quantizer,
            min_height: settings.min_height,
            max_height: settings.max_height,
            multiplier: settings.height * (stack_height / STACK_HEIGHT_RANGE),
        })
    }

    /// Columns of the terrain grid (`gridXNum`).
    pub fn width(&self) -> u32 {
        self.cols as u32
    }

    /// Rows of the terrain grid (`gridYNum`).
    pub fn depth(&self) -> u32 {
        self.rows as u32
    }

    /// Height at vertex `(x, z)`.
    pub fn height_at(&self, x: u32, z: u32) -> f32 {
        let col = (x as usize).min(self.cols - 1);
        let row = (z as usize).min(self.rows - 1);
        let level = self.kernels[row * self.cols + col].height_level;
        let lifted = lerp(self.min_height, self.max_height, level);
        self.multiplier * self.quantizer.quantize(lifted)
    }
}
