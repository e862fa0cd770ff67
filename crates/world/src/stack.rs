//! Layered stack model.
//!
//! A WRLD world is a set of layers ("stacks") laid over the same grid. Each
//! layer carries one `stack_height` and a raw height level per cell. The model
//! turns that into marker placements: every layer stands on top of the layers
//! before it, and cells at or below the visibility threshold collapse to the
//! floor.
//!
//! Cells are kept in one contiguous buffer addressed as
//! `layer * rows * cols + row * cols + col`.

use glam::Vec3;
use serde::Serialize;
use wrldgen_core::{
    lerp, lerp_unclamped, GenerationError, GenerationResult, Placement, StructureSettings,
    STACK_HEIGHT_RANGE,
};

use crate::heightfield::HeightSource;

/// Per-cell properties for one layer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct KernelProperties {
    /// Raw height level as authored (roughly 0-10).
    pub height_level: f32,
}

impl KernelProperties {
    /// Kernel with the given raw level.
    pub fn new(height_level: f32) -> Self {
        Self { height_level }
    }
}

/// Placement record for one structure marker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarkerInstance {
    /// Layer index.
    pub layer: usize,
    /// Grid row (Y in the WRLD file).
    pub row: usize,
    /// Grid column (X in the WRLD file).
    pub col: usize,
    /// Whether the cell collapsed to the floor.
    pub floored: bool,
    /// Scale `(width, depth, height)` and local position.
    ///
    /// Position X follows the row axis, Y the column axis, and structures
    /// stack along -Z.
    pub placement: Placement,
}

impl MarkerInstance {
    /// Stable display name for the scene object backing this marker.
    pub fn name(&self) -> String {
        format!(
            "GeneratedStructure_{}_{}_stack_{}",
            self.col, self.row, self.layer
        )
    }
}

/// Layered grid of kernel properties.
#[derive(Debug, Clone, PartialEq)]
pub struct StackModel {
    cols: usize,
    rows: usize,
    stack_heights: Vec<f32>,
    kernels: Vec<KernelProperties>,
}

impl StackModel {
    /// Empty model for a `cols` x `rows` world grid.
    pub fn new(cols: usize, rows: usize) -> GenerationResult<Self> {
        if cols == 0 || rows == 0 {
            return Err(GenerationError::configuration(format!(
                "world grid must be at least 1x1, got {cols}x{rows}"
            )));
        }
        Ok(Self {
            cols,
            rows,
            stack_heights: Vec::new(),
            kernels: Vec::new(),
        })
    }

    /// Columns per row (`gridXNum`).
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Rows per layer (`gridYNum`).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.stack_heights.len()
    }

    /// Whether the model has no layers.
    pub fn is_empty(&self) -> bool {
        self.stack_heights.is_empty()
    }

    /// Drop every layer, keeping the grid size.
    pub fn clear(&mut self) {
        self.stack_heights.clear();
        self.kernels.clear();
    }

    /// Append a layer. `levels` is indexed `[row][col]` and must match the grid exactly.
    ///
    /// Returns the new layer index. Nothing is stored when the shape is wrong.
    pub fn push_layer<R: AsRef<[f32]>>(
        &mut self,
        stack_height: f32,
        levels: &[R],
    ) -> GenerationResult<usize> {
        let layer = self.layer_count();
        if levels.len() != self.rows {
            return Err(GenerationError::data_integrity(format!(
                "layer {layer} has {} rows, world declares {}",
                levels.len(),
                self.rows
            )));
        }
        for (row, cells) in levels.iter().enumerate() {
            let cells = cells.as_ref();
            if cells.len() != self.cols {
                return Err(GenerationError::data_integrity(format!(
                    "layer {layer} row {row} has {} cells, world declares {}",
                    cells.len(),
                    self.cols
                )));
            }
        }

        self.kernels.reserve(self.layer_stride());
        for cells in levels {
            self.kernels
                .extend(cells.as_ref().iter().copied().map(KernelProperties::new));
        }
        self.stack_heights.push(stack_height);
        Ok(layer)
    }

    fn layer_stride(&self) -> usize {
        self.rows * self.cols
    }

    fn check_layer(&self, layer: usize) -> GenerationResult<()> {
        if layer >= self.layer_count() {
            return Err(GenerationError::data_integrity(format!(
                "layer {layer} out of range ({} layers)",
                self.layer_count()
            )));
        }
        Ok(())
    }

    fn index(&self, layer: usize, row: usize, col: usize) -> GenerationResult<usize> {
        self.check_layer(layer)?;
        if row >= self.rows || col >= self.cols {
            return Err(GenerationError::data_integrity(format!(
                "cell ({row}, {col}) outside {}x{} grid",
                self.rows, self.cols
            )));
        }
        Ok(layer * self.layer_stride() + row * self.cols + col)
    }

    /// Kernel at `(layer, row, col)`.
    pub fn kernel(&self, layer: usize, row: usize, col: usize) -> GenerationResult<&KernelProperties> {
        let idx = self.index(layer, row, col)?;
        Ok(&self.kernels[idx])
    }

    /// Mutable kernel at `(layer, row, col)`.
    pub fn kernel_mut(
        &mut self,
        layer: usize,
        row: usize,
        col: usize,
    ) -> GenerationResult<&mut KernelProperties> {
        let idx = self.index(layer, row, col)?;
        Ok(&mut self.kernels[idx])
    }

    /// Raw `stackHeight` of a layer.
    pub fn stack_height(&self, layer: usize) -> GenerationResult<f32> {
        self.check_layer(layer)?;
        Ok(self.stack_heights[layer])
    }

    /// Kernels of one layer, row-major.
    pub fn layer_kernels(&self, layer: usize) -> GenerationResult<&[KernelProperties]> {
        self.check_layer(layer)?;
        let start = layer * self.layer_stride();
        Ok(&self.kernels[start..start + self.layer_stride()])
    }

    /// View one layer as a [`HeightSource`] with levels normalized to `[0, 1]`.
    pub fn layer_heights(&self, layer: usize) -> GenerationResult<LayerHeights<'_>> {
        Ok(LayerHeights {
            cols: self.cols,
            rows: self.rows,
            kernels: self.layer_kernels(layer)?,
        })
    }

    /// Layer-wide structure height derived from the layer's `stack_height`.
    pub fn current_height(
        &self,
        layer: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<f32> {
        let stack_height = self.stack_height(layer)?;
        Ok(lerp(
            settings.min_height,
            settings.max_height,
            stack_height / STACK_HEIGHT_RANGE,
        ))
    }

    /// Whether the cell collapses to the floor.
    pub fn is_floored(
        &self,
        layer: usize,
        row: usize,
        col: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<bool> {
        let kernel = self.kernel(layer, row, col)?;
        Ok(kernel.height_level <= settings.visibility_threshold)
    }

    /// Height of the cell's structure: 0 when floored, otherwise the layer's
    /// current height clamped to the structure bounds.
    pub fn cell_height(
        &self,
        layer: usize,
        row: usize,
        col: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<f32> {
        if self.is_floored(layer, row, col, settings)? {
            return Ok(0.0);
        }
        let height = self.current_height(layer, settings)?;
        Ok(height.clamp(settings.min_height, settings.max_height))
    }

    /// Combined current height of every layer below `layer`.
    pub fn cumulative_offset(
        &self,
        layer: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<f32> {
        self.check_layer(layer)?;
        let mut offset = 0.0;
        for below in 0..layer {
            offset += self.current_height(below, settings)?;
        }
        Ok(offset)
    }

    /// Placement of the marker at `(layer, row, col)`.
    pub fn marker(
        &self,
        layer: usize,
        row: usize,
        col: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<MarkerInstance> {
        let current = self.current_height(layer, settings)?;
        let offset = self.cumulative_offset(layer, settings)?;
        let floored = self.is_floored(layer, row, col, settings)?;
        Ok(self.place(layer, row, col, current, offset, floored, settings))
    }

    #[allow(clippy::too_many_arguments)]
    fn place(
        &self,
        layer: usize,
        row: usize,
        col: usize,
        current: f32,
        offset: f32,
        floored: bool,
        settings: &StructureSettings,
    ) -> MarkerInstance {
        let footprint = settings.stage_size / self.rows as f32;
        let stand = if floored { 0.0 } else { current };
        let height = stand.clamp(settings.min_height, settings.max_height);
        let lift = if floored {
            0.0
        } else {
            -(current * 0.5 + offset)
        };

        MarkerInstance {
            layer,
            row,
            col,
            floored,
            placement: Placement {
                scale: Vec3::new(footprint, footprint, height),
                position: Vec3::new(
                    planar_offset(row, self.rows) * settings.stage_size,
                    planar_offset(col, self.cols) * settings.stage_size,
                    lift,
                ),
            },
        }
    }

    /// Markers for every cell of one layer, row-major.
    pub fn layer_markers(
        &self,
        layer: usize,
        settings: &StructureSettings,
    ) -> GenerationResult<Vec<MarkerInstance>> {
        let current = self.current_height(layer, settings)?;
        let offset = self.cumulative_offset(layer, settings)?;
        let kernels = self.layer_kernels(layer)?;

        let mut markers = Vec::with_capacity(kernels.len());
        for row in 0..self.rows {
            for col in 0..self.cols {
                let floored =
                    kernels[row * self.cols + col].height_level <= settings.visibility_threshold;
                markers.push(self.place(layer, row, col, current, offset, floored, settings));
            }
        }
        Ok(markers)
    }

    /// Markers for every layer, layer-major then row-major.
    pub fn markers(&self, settings: &StructureSettings) -> GenerationResult<Vec<MarkerInstance>> {
        let mut markers = Vec::with_capacity(self.kernels.len());
        for layer in 0..self.layer_count() {
            markers.extend(self.layer_markers(layer, settings)?);
        }
        Ok(markers)
    }
}

/// Centered offset of slot `coord` along an axis of `cells` slots, spanning `[-0.5, 0.5]`.
pub fn planar_offset(coord: usize, cells: usize) -> f32 {
    let cells = cells as f32;
    // Half the spacing between neighbouring slots.
    let boundary_shift =
        (lerp_unclamped(-0.5, 0.5, 1.0 / cells) - lerp_unclamped(-0.5, 0.5, 2.0 / cells)) * 0.5;
    boundary_shift - lerp_unclamped(-0.5, 0.5, coord as f32 / cells)
}

/// One layer of a [`StackModel`] read as a height field.
#[derive(Debug, Clone, Copy)]
pub struct LayerHeights<'a> {
    cols: usize,
    rows: usize,
    kernels: &'a [KernelProperties],
}

impl HeightSource for LayerHeights<'_> {
    fn dimensions(&self) -> (u32, u32) {
        (self.cols as u32, self.rows as u32)
    }

    fn value_at(&self, x: u32, z: u32) -> f32 {
        let level = self.kernels[z as usize * self.cols + x as usize].height_level;
        (level / STACK_HEIGHT_RANGE).clamp(0.0, 1.0)
    }
}
