//! Height-field sampling.
//!
//! A height source maps integer grid coordinates to a grayscale value in
//! `[0, 1]`. The [`HeightSampler`] wraps an optional source: without one the
//! terrain is flat, and with one every lookup is clamped into the source's
//! pixel range, since mesh grids routinely extend past the image edge.

use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use wrldgen_core::{GenerationError, GenerationResult};

/// Anything that can be read as a 2D grayscale height field.
pub trait HeightSource {
    /// Number of samples along X and Z.
    fn dimensions(&self) -> (u32, u32);

    /// Value in `[0, 1]` at `(x, z)`. Callers guarantee the coordinates are in range.
    fn value_at(&self, x: u32, z: u32) -> f32;
}

/// Dense grayscale height field stored row-major, one row per Z.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    width: u32,
    depth: u32,
    values: Vec<f32>,
}

impl HeightField {
    /// Create a height field from raw row-major values.
    ///
    /// Values are clamped to `[0, 1]`; non-finite values read as 0.
    pub fn from_raw(width: u32, depth: u32, values: Vec<f32>) -> GenerationResult<Self> {
        let expected = width as usize * depth as usize;
        if values.len() != expected {
            return Err(GenerationError::data_integrity(format!(
                "height field {width}x{depth} needs {expected} samples, got {}",
                values.len()
            )));
        }
        let values = values
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 })
            .collect();
        Ok(Self {
            width,
            depth,
            values,
        })
    }

    /// Convert a decoded image into grayscale heights.
    ///
    /// Grayscale uses the `0.299 R + 0.587 G + 0.114 B` weighting. Z runs up the
    /// image: pixel row 0 of the height field is the bottom row of the picture.
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image.to_rgb32f();
        let (width, depth) = rgb.dimensions();
        let mut values = Vec::with_capacity(width as usize * depth as usize);
        for z in 0..depth {
            let row = depth - 1 - z;
            for x in 0..width {
                let [r, g, b] = rgb.get_pixel(x, row).0;
                let gray = 0.299 * r + 0.587 * g + 0.114 * b;
                values.push(gray.clamp(0.0, 1.0));
            }
        }
        Self {
            width,
            depth,
            values,
        }
    }

    /// Decode an image file (PNG/JPEG) into a height field.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("Failed to load height image {}", path.display()))?;
        Ok(Self::from_image(&image))
    }

    /// Raw row-major values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

impl HeightSource for HeightField {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.depth)
    }

    fn value_at(&self, x: u32, z: u32) -> f32 {
        self.values[z as usize * self.width as usize + x as usize]
    }
}

/// Reads heights from an optional source, clamping coordinates to its bounds.
#[derive(Clone, Copy, Default)]
pub struct HeightSampler<'a> {
    source: Option<&'a dyn HeightSource>,
}

impl<'a> HeightSampler<'a> {
    /// Sampler over `source`.
    pub fn new(source: &'a dyn HeightSource) -> Self {
        Self {
            source: Some(source),
        }
    }

    /// Sampler that reports flat terrain everywhere.
    pub fn flat() -> Self {
        Self { source: None }
    }

    /// Whether a source is configured.
    pub fn is_flat(&self) -> bool {
        self.source.is_none()
    }

    /// Grayscale value at `(x, z)` in `[0, 1]`.
    pub fn sample(&self, x: u32, z: u32) -> f32 {
        let Some(source) = self.source else {
            return 0.0;
        };
        let (width, depth) = source.dimensions();
        if width == 0 || depth == 0 {
            return 0.0;
        }
        source.value_at(x.min(width - 1), z.min(depth - 1))
    }
}

impl std::fmt::Debug for HeightSampler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeightSampler")
            .field("dimensions", &self.source.map(|s| s.dimensions()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn ramp() -> HeightField {
        // 3x2, row-major by z
        HeightField::from_raw(3, 2, vec![0.0, 0.1, 0.2, 0.5, 0.6, 0.7]).unwrap()
    }

    #[test]
    fn flat_sampler_is_zero_everywhere() {
        let sampler = HeightSampler::flat();
        assert!(sampler.is_flat());
        for z in 0..10 {
            for x in 0..10 {
                assert_eq!(sampler.sample(x, z), 0.0);
            }
        }
    }

    #[test]
    fn in_range_samples_read_row_major() {
        let field = ramp();
        let sampler = HeightSampler::new(&field);
        assert_eq!(sampler.sample(0, 0), 0.0);
        assert_eq!(sampler.sample(2, 0), 0.2);
        assert_eq!(sampler.sample(1, 1), 0.6);
    }

    #[test]
    fn out_of_range_samples_clamp_to_edges() {
        let field = ramp();
        let sampler = HeightSampler::new(&field);
        assert_eq!(sampler.sample(50, 0), 0.2);
        assert_eq!(sampler.sample(0, 50), 0.5);
        assert_eq!(sampler.sample(u32::MAX, u32::MAX), 0.7);
    }

    #[test]
    fn raw_values_are_clamped_to_unit_range() {
        let field = HeightField::from_raw(2, 1, vec![-1.0, f32::NAN]).unwrap();
        assert_eq!(field.values(), &[0.0, 0.0]);
        let field = HeightField::from_raw(1, 1, vec![3.0]).unwrap();
        assert_eq!(field.values(), &[1.0]);
    }

    #[test]
    fn raw_length_mismatch_is_rejected() {
        let err = HeightField::from_raw(2, 2, vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, GenerationError::DataIntegrity(_)));
    }

    #[test]
    fn empty_source_samples_flat() {
        let field = HeightField::from_raw(0, 0, Vec::new()).unwrap();
        assert_eq!(HeightSampler::new(&field).sample(3, 3), 0.0);
    }

    #[test]
    fn image_rows_are_flipped_so_z_runs_up() {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([255, 255, 255])); // top-left
        img.put_pixel(1, 1, Rgb([0, 0, 0])); // bottom-right
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        img.put_pixel(0, 1, Rgb([0, 0, 0]));
        let field = HeightField::from_image(&DynamicImage::ImageRgb8(img));

        assert_eq!(field.dimensions(), (2, 2));
        assert!((field.value_at(0, 1) - 1.0).abs() < 1e-4);
        assert_eq!(field.value_at(0, 0), 0.0);
        assert_eq!(field.value_at(1, 0), 0.0);
    }

    #[test]
    fn grayscale_uses_luma_weights() {
        let mut img = RgbImage::new(1, 1);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let field = HeightField::from_image(&DynamicImage::ImageRgb8(img));
        assert!((field.value_at(0, 0) - 0.299).abs() < 1e-4);
    }
}
