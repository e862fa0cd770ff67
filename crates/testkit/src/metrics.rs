//! Generation metrics records.
//!
//! One record per generation pass, written as JSON lines so CI can diff mesh
//! hashes and sizes across runs.

use serde::{Deserialize, Serialize};

/// Which generator produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    /// Image-driven landscape.
    Landscape,
    /// WRLD terrain + markers.
    World,
}

/// Metrics for one generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetric {
    /// Timestamp when the pass finished (ISO 8601).
    pub timestamp: String,
    /// Generator that ran.
    pub kind: GenerationKind,
    /// Input identifier (file path or fixture name).
    pub source: String,
    /// Mesh vertex count.
    pub vertices: usize,
    /// Mesh triangle count.
    pub triangles: usize,
    /// Marker placements emitted (0 for landscapes).
    pub markers: usize,
    /// Markers that stand above the floor.
    pub standing_markers: usize,
    /// Mesh content hash (hex).
    pub hash: String,
    /// Wall-clock time spent generating (microseconds).
    pub elapsed_us: u128,
}

impl GenerationMetric {
    /// Record stamped with the current time; counts start at zero.
    pub fn new(kind: GenerationKind, source: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            kind,
            source: source.into(),
            vertices: 0,
            triangles: 0,
            markers: 0,
            standing_markers: 0,
            hash: String::new(),
            elapsed_us: 0,
        }
    }

    /// Set mesh counts and hash.
    pub fn mesh(mut self, vertices: usize, triangles: usize, hash: impl Into<String>) -> Self {
        self.vertices = vertices;
        self.triangles = triangles;
        self.hash = hash.into();
        self
    }

    /// Set marker counts.
    pub fn markers(mut self, total: usize, standing: usize) -> Self {
        self.markers = total;
        self.standing_markers = standing;
        self
    }

    /// Set elapsed time.
    pub fn elapsed_us(mut self, elapsed_us: u128) -> Self {
        self.elapsed_us = elapsed_us;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::JsonlSink;
    use std::fs;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn metric_roundtrips_through_jsonl() {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("wrldgen_metrics_{timestamp}.jsonl"));

        let metric = GenerationMetric::new(GenerationKind::World, "fixture")
            .mesh(9, 8, "abc")
            .markers(8, 3)
            .elapsed_us(42);
        {
            let mut sink = JsonlSink::create(&path).unwrap();
            sink.write(&metric).unwrap();
        }
        {
            let mut sink = JsonlSink::append(&path).unwrap();
            sink.write(&metric).unwrap();
        }

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: GenerationMetric = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, metric);
        assert!(lines[0].contains("\"kind\":\"world\""));

        let _ = fs::remove_file(&path);
    }
}
