//! WRLD document fixtures.
//!
//! Builds WRLD text the way the authoring tool writes it: every number is a
//! JSON string.

use serde_json::{json, Value};

/// Builder for WRLD JSON documents.
#[derive(Debug, Clone)]
pub struct WorldDocBuilder {
    name: Option<String>,
    grid_x: usize,
    grid_y: usize,
    stacks: Vec<Value>,
}

impl WorldDocBuilder {
    /// Document for a `grid_x` x `grid_y` world with no layers.
    pub fn new(grid_x: usize, grid_y: usize) -> Self {
        Self {
            name: None,
            grid_x,
            grid_y,
            stacks: Vec::new(),
        }
    }

    /// Set `worldName`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a layer whose level at `(row, col)` comes from `level`.
    pub fn layer_fn<F>(mut self, stack_height: f32, level: F) -> Self
    where
        F: Fn(usize, usize) -> f32,
    {
        let rows: Vec<Value> = (0..self.grid_y)
            .map(|row| {
                (0..self.grid_x)
                    .map(|col| json!({ "heightLevel": level(row, col).to_string() }))
                    .collect()
            })
            .collect();
        self.stacks.push(json!({
            "stackHeight": stack_height.to_string(),
            "stacksMap": rows,
        }));
        self
    }

    /// Add a layer with the same level in every cell.
    pub fn uniform_layer(self, stack_height: f32, level: f32) -> Self {
        self.layer_fn(stack_height, |_, _| level)
    }

    /// Add a layer from explicit `[row][col]` levels; the shape is not checked.
    pub fn layer(mut self, stack_height: f32, levels: &[Vec<f32>]) -> Self {
        let rows: Vec<Value> = levels
            .iter()
            .map(|row| {
                row.iter()
                    .map(|level| json!({ "heightLevel": level.to_string() }))
                    .collect()
            })
            .collect();
        self.stacks.push(json!({
            "stackHeight": stack_height.to_string(),
            "stacksMap": rows,
        }));
        self
    }

    /// Document as a JSON value.
    pub fn to_value(&self) -> Value {
        let mut doc = json!({
            "gridXNum": self.grid_x.to_string(),
            "gridYNum": self.grid_y.to_string(),
            "stacks": self.stacks,
        });
        if let Some(name) = &self.name {
            doc["worldName"] = Value::String(name.clone());
        }
        doc
    }

    /// Document as WRLD text.
    pub fn build(&self) -> String {
        self.to_value().to_string()
    }
}

/// Remove `field` from the top level of a WRLD document.
pub fn without_field(text: &str, field: &str) -> String {
    let mut value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return text.to_owned(),
    };
    if let Some(object) = value.as_object_mut() {
        object.remove(field);
    }
    value.to_string()
}

/// Deterministic pseudo-random level in `[0, 10)` for `(seed, row, col)`.
pub fn scattered_level(seed: u64, row: usize, col: usize) -> f32 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    h ^= (row as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h ^= (col as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^= h >> 31;
    h = h.wrapping_mul(0xD6E8_FEB8_6659_FD93);
    h ^= h >> 32;
    (h % 1000) as f32 / 100.0
}
