//! WRLD document parsing.
//!
//! A WRLD file is JSON with numbers stored as strings:
//!
//! ```json
//! {
//!   "worldName": "harbour",
//!   "gridXNum": "2",
//!   "gridYNum": "2",
//!   "stacks": [
//!     { "stackHeight": "5",
//!       "stacksMap": [[{"heightLevel": "1.0"}, {"heightLevel": "0"}],
//!                     [{"heightLevel": "3.5"}, {"heightLevel": "0.7"}]] }
//!   ]
//! }
//! ```
//!
//! Numeric fields are converted through their text form, so plain JSON
//! numbers are accepted too. Every failure names the offending field path.

use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::{debug, info};
use wrldgen_core::{GenerationError, GenerationResult, MissingCellPolicy, ParserSettings};

use crate::stack::StackModel;

/// One parsed layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerRecord {
    /// Raw `stackHeight`.
    pub stack_height: f32,
    /// Height levels indexed `[row][col]`, shaped as found in the document.
    pub levels: Vec<Vec<f32>>,
}

/// Decoded WRLD document.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldDocument {
    /// Informational world name.
    pub world_name: Option<String>,
    /// `gridXNum`: columns per row.
    pub grid_x: usize,
    /// `gridYNum`: rows per layer.
    pub grid_y: usize,
    /// Layers in document order.
    pub layers: Vec<LayerRecord>,
}

impl WorldDocument {
    /// Build a stack model from the document, validating every layer's shape.
    pub fn to_stack_model(&self) -> GenerationResult<StackModel> {
        let mut model = StackModel::new(self.grid_x, self.grid_y)?;
        for layer in &self.layers {
            model.push_layer(layer.stack_height, &layer.levels)?;
        }
        Ok(model)
    }
}

/// Parser for WRLD text.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorldParser {
    missing_cells: MissingCellPolicy,
}

impl WorldParser {
    /// Parser using the given settings.
    pub fn new(settings: ParserSettings) -> Self {
        Self {
            missing_cells: settings.missing_cells,
        }
    }

    /// Decode `text` into a [`WorldDocument`].
    pub fn parse(&self, text: &str) -> GenerationResult<WorldDocument> {
        let root: Value = serde_json::from_str(text)
            .map_err(|err| GenerationError::parse("<document>", err.to_string()))?;
        let root = root
            .as_object()
            .ok_or_else(|| GenerationError::parse("<document>", "expected a JSON object"))?;

        let world_name = root
            .get("worldName")
            .and_then(Value::as_str)
            .map(str::to_owned);
        if let Some(name) = &world_name {
            info!(world = %name, "Generating world");
        }

        let grid_x = grid_dimension(root, "gridXNum")?;
        let grid_y = grid_dimension(root, "gridYNum")?;

        let stacks = required(root, "stacks", "stacks")?
            .as_array()
            .ok_or_else(|| GenerationError::parse("stacks", "expected an array of layers"))?;

        let mut layers = Vec::with_capacity(stacks.len());
        for (s, stack) in stacks.iter().enumerate() {
            layers.push(self.parse_layer(stack, s)?);
        }

        debug!(grid_x, grid_y, layers = layers.len(), "Parsed WRLD document");
        Ok(WorldDocument {
            world_name,
            grid_x,
            grid_y,
            layers,
        })
    }

    fn parse_layer(&self, stack: &Value, s: usize) -> GenerationResult<LayerRecord> {
        let path = format!("stacks[{s}]");
        let stack = stack
            .as_object()
            .ok_or_else(|| GenerationError::parse(&path, "expected a layer object"))?;

        let height_path = format!("{path}.stackHeight");
        let stack_height = number(required(stack, "stackHeight", &height_path)?, &height_path)?;

        let map_path = format!("{path}.stacksMap");
        let rows = required(stack, "stacksMap", &map_path)?
            .as_array()
            .ok_or_else(|| GenerationError::parse(&map_path, "expected an array of rows"))?;

        let mut levels = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row_path = format!("{map_path}[{y}]");
            let cells = row
                .as_array()
                .ok_or_else(|| GenerationError::parse(&row_path, "expected an array of cells"))?;
            let mut parsed = Vec::with_capacity(cells.len());
            for (x, cell) in cells.iter().enumerate() {
                parsed.push(self.parse_cell(cell, &format!("{row_path}[{x}]"))?);
            }
            levels.push(parsed);
        }

        Ok(LayerRecord {
            stack_height,
            levels,
        })
    }

    fn parse_cell(&self, cell: &Value, path: &str) -> GenerationResult<f32> {
        let cell = cell
            .as_object()
            .ok_or_else(|| GenerationError::parse(path, "expected a cell object"))?;
        let level_path = format!("{path}.heightLevel");
        match cell.get("heightLevel") {
            Some(value) if !value.is_null() => number(value, &level_path),
            _ => match self.missing_cells {
                MissingCellPolicy::Reject => Err(GenerationError::parse(
                    level_path,
                    "missing required field",
                )),
                MissingCellPolicy::Zero => Ok(0.0),
            },
        }
    }
}

/// Parse `text` with the default (strict) settings.
pub fn parse_world(text: &str) -> GenerationResult<WorldDocument> {
    WorldParser::default().parse(text)
}

fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> GenerationResult<&'a Value> {
    match object.get(key) {
        Some(value) if !value.is_null() => Ok(value),
        _ => Err(GenerationError::parse(path, "missing required field")),
    }
}

fn field_text(value: &Value, path: &str) -> GenerationResult<String> {
    match value {
        Value::String(s) => Ok(s.trim().to_owned()),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(GenerationError::parse(
            path,
            format!("expected a numeric string, got {other}"),
        )),
    }
}

fn convert<T: FromStr>(value: &Value, path: &str, kind: &str) -> GenerationResult<T> {
    let text = field_text(value, path)?;
    text.parse::<T>()
        .map_err(|_| GenerationError::parse(path, format!("expected {kind}, got {text:?}")))
}

fn number(value: &Value, path: &str) -> GenerationResult<f32> {
    let parsed: f32 = convert(value, path, "a number")?;
    if !parsed.is_finite() {
        return Err(GenerationError::parse(
            path,
            format!("expected a finite number, got {parsed}"),
        ));
    }
    Ok(parsed)
}

fn grid_dimension(root: &Map<String, Value>, key: &str) -> GenerationResult<usize> {
    let value: i64 = convert(required(root, key, key)?, key, "an integer")?;
    if value <= 0 {
        return Err(GenerationError::parse(
            key,
            format!("grid dimension must be positive, got {value}"),
        ));
    }
    usize::try_from(value)
        .map_err(|_| GenerationError::parse(key, format!("grid dimension {value} too large")))
}
