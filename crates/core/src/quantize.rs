//! Height quantization.
//!
//! Locks continuous heights onto multiples of a fixed step. This is a coarse
//! level lock: `quantize(h)` lands on `k * steps`, not on `steps` subdivisions
//! of the input range.

use crate::error::{GenerationError, GenerationResult};

/// Upper bound accepted for the terrain step count.
pub const MAX_STEPS: u32 = 20;

/// Snaps heights to multiples of `steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantizer {
    steps: u32,
}

impl Quantizer {
    /// Create a quantizer, rejecting a zero step count.
    pub fn new(steps: u32) -> GenerationResult<Self> {
        if steps == 0 {
            return Err(GenerationError::configuration(
                "terrain step count must be at least 1",
            ));
        }
        Ok(Self { steps })
    }

    /// Step count this quantizer locks to.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// `round(height / steps) * steps`, ties rounding to even.
    pub fn quantize(&self, height: f32) -> f32 {
        let steps = self.steps as f32;
        (height / steps).round_ties_even() * steps
    }
}
