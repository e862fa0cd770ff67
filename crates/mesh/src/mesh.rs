//! Regular grid mesh construction.
//!
//! Vertices are laid out z-major (`index = z * (width + 1) + x`); the triangle
//! pass relies on that ordering. Every build produces fresh buffers, normals,
//! bounds, and a content hash.

use blake3::Hasher;
use glam::Vec3;
use serde::{Serialize, Serializer};
use wrldgen_core::{GenerationError, GenerationResult, UvReference};

/// Hash of the position, index, and UV buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl Serialize for MeshHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Interleaved vertex layout for upload by a rendering collaborator.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    /// Position in mesh-local coordinates.
    pub position: [f32; 3],
    /// Vertex normal (unit length).
    pub normal: [f32; 3],
    /// Texture coordinates.
    pub uv: [f32; 2],
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Tightest box around `points`; a zero box at the origin when empty.
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut iter = points.iter().map(|p| Vec3::from_array(*p));
        let Some(first) = iter.next() else {
            return Self {
                min: Vec3::ZERO,
                max: Vec3::ZERO,
            };
        };
        let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Self { min, max }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Triangulated grid with per-vertex UVs and normals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridMesh {
    /// Cells along X.
    pub width: u32,
    /// Cells along Z.
    pub depth: u32,
    /// `(x, height, z)` per vertex.
    pub positions: Vec<[f32; 3]>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
    /// `(x / x_max, height / y_max)` per vertex.
    pub uvs: Vec<[f32; 2]>,
    /// Accumulated face normals, normalized.
    pub normals: Vec<[f32; 3]>,
    /// Bounds of the final positions.
    pub bounds: Aabb,
    /// Content hash of positions, indices, and UVs.
    pub hash: MeshHash,
}

impl GridMesh {
    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertices in the interleaved GPU layout.
    pub fn interleaved(&self) -> Vec<MeshVertex> {
        self.positions
            .iter()
            .zip(&self.normals)
            .zip(&self.uvs)
            .map(|((position, normal), uv)| MeshVertex {
                position: *position,
                normal: *normal,
                uv: *uv,
            })
            .collect()
    }

    /// Compact description used for logs and metrics.
    pub fn summary(&self) -> MeshSummary {
        MeshSummary {
            width: self.width,
            depth: self.depth,
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            bounds: self.bounds,
            hash: self.hash,
        }
    }
}

/// Counts, bounds, and hash of a [`GridMesh`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeshSummary {
    /// Cells along X.
    pub width: u32,
    /// Cells along Z.
    pub depth: u32,
    /// Vertex count.
    pub vertices: usize,
    /// Triangle count.
    pub triangles: usize,
    /// Mesh bounds.
    pub bounds: Aabb,
    /// Content hash.
    pub hash: MeshHash,
}

/// Builds [`GridMesh`]es of a fixed size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMeshBuilder {
    width: u32,
    depth: u32,
    uv: UvReference,
}

impl GridMeshBuilder {
    /// Builder for a `width` x `depth` cell grid.
    pub fn new(width: u32, depth: u32, uv: UvReference) -> GenerationResult<Self> {
        if width == 0 || depth == 0 {
            return Err(GenerationError::configuration(format!(
                "mesh grid must be at least 1x1, got {width}x{depth}"
            )));
        }
        let vertices = (u64::from(width) + 1) * (u64::from(depth) + 1);
        if vertices > u64::from(u32::MAX) {
            return Err(GenerationError::configuration(format!(
                "mesh grid {width}x{depth} needs {vertices} vertices, more than 32-bit indices allow"
            )));
        }
        if !(uv.x_max.is_finite() && uv.x_max > 0.0 && uv.y_max.is_finite() && uv.y_max > 0.0) {
            return Err(GenerationError::configuration(
                "uv reference maxima must be positive",
            ));
        }
        Ok(Self { width, depth, uv })
    }

    /// Cells along X.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Cells along Z.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Build the mesh, calling `height_fn(x, z)` once per vertex in build order.
    pub fn build<F>(&self, mut height_fn: F) -> GridMesh
    where
        F: FnMut(u32, u32) -> f32,
    {
        let (width, depth) = (self.width, self.depth);
        let row = width + 1;

        let mut positions = Vec::with_capacity(row as usize * (depth as usize + 1));
        for z in 0..=depth {
            for x in 0..=width {
                positions.push([x as f32, height_fn(x, z), z as f32]);
            }
        }

        let mut indices = Vec::with_capacity(width as usize * depth as usize * 6);
        let mut vert = 0u32;
        for _z in 0..depth {
            for _x in 0..width {
                indices.extend_from_slice(&[
                    vert,
                    vert + row,
                    vert + 1,
                    vert + 1,
                    vert + row,
                    vert + row + 1,
                ]);
                vert += 1;
            }
            // Skip the last column so the next row starts at its own first vertex.
            vert += 1;
        }

        let uvs = positions
            .iter()
            .map(|p| [p[0] / self.uv.x_max, p[1] / self.uv.y_max])
            .collect::<Vec<_>>();
        let normals = vertex_normals(&positions, &indices);
        let bounds = Aabb::from_points(&positions);

        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&positions));
        hasher.update(bytemuck::cast_slice(&indices));
        hasher.update(bytemuck::cast_slice(&uvs));

        GridMesh {
            width,
            depth,
            positions,
            indices,
            uvs,
            normals,
            bounds,
            hash: MeshHash(*hasher.finalize().as_bytes()),
        }
    }
}

/// Area-weighted vertex normals from triangle winding.
fn vertex_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let pa = Vec3::from_array(positions[a]);
        let pb = Vec3::from_array(positions[b]);
        let pc = Vec3::from_array(positions[c]);
        let face = (pb - pa).cross(pc - pa);
        sums[a] += face;
        sums[b] += face;
        sums[c] += face;
    }
    sums.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO {
                Vec3::Y.to_array()
            } else {
                n.to_array()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder(width: u32, depth: u32) -> GridMeshBuilder {
        GridMeshBuilder::new(width, depth, UvReference::default()).unwrap()
    }

    #[test]
    fn single_cell_layout() {
        let mesh = builder(1, 1).build(|_, _| 0.0);
        assert_eq!(
            mesh.positions,
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0]
            ]
        );
        assert_eq!(mesh.indices, vec![0, 2, 1, 1, 2, 3]);
    }

    #[test]
    fn second_row_starts_after_skipped_column() {
        let mesh = builder(2, 2).build(|_, _| 0.0);
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(mesh.indices.len(), 24);
        // Third quad (x=0, z=1) starts at vertex 3.
        assert_eq!(&mesh.indices[12..18], &[3, 6, 4, 4, 6, 7]);
        // Last quad (x=1, z=1) uses the far corner.
        assert_eq!(&mesh.indices[18..24], &[4, 7, 5, 5, 7, 8]);
    }

    #[test]
    fn vertex_order_is_z_major() {
        let mesh = builder(3, 2).build(|x, z| (x * 10 + z) as f32);
        for z in 0..=2u32 {
            for x in 0..=3u32 {
                let idx = (z * 4 + x) as usize;
                assert_eq!(mesh.positions[idx], [x as f32, (x * 10 + z) as f32, z as f32]);
            }
        }
    }

    #[test]
    fn uvs_use_fixed_reference_maxima() {
        let mesh = builder(8, 1).build(|x, _| x as f32);
        // x = 8, height = 8 -> (2, 2) regardless of extents
        assert_eq!(mesh.uvs[8], [2.0, 2.0]);
        assert_eq!(mesh.uvs[2], [0.5, 0.5]);

        let custom = GridMeshBuilder::new(
            2,
            1,
            UvReference {
                x_max: 2.0,
                y_max: 8.0,
            },
        )
        .unwrap()
        .build(|_, _| 4.0);
        assert_eq!(custom.uvs[1], [0.5, 0.5]);
    }

    #[test]
    fn flat_grid_normals_point_up() {
        let mesh = builder(3, 3).build(|_, _| 0.0);
        for normal in &mesh.normals {
            let n = Vec3::from_array(*normal);
            assert!(n.abs_diff_eq(Vec3::Y, 1e-6), "normal {n} should point up");
        }
    }

    #[test]
    fn sloped_grid_normals_lean_away_from_rise() {
        let mesh = builder(2, 2).build(|x, _| x as f32);
        for normal in &mesh.normals {
            let n = Vec3::from_array(*normal);
            assert!((n.length() - 1.0).abs() < 1e-5);
            assert!(n.x < 0.0 && n.y > 0.0);
            assert!(n.z.abs() < 1e-5);
        }
    }

    #[test]
    fn bounds_cover_positions() {
        let mesh = builder(4, 2).build(|x, z| x as f32 - z as f32);
        assert_eq!(mesh.bounds.min, Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(mesh.bounds.max, Vec3::new(4.0, 4.0, 2.0));
        assert_eq!(mesh.bounds.size(), Vec3::new(4.0, 6.0, 2.0));
        assert_eq!(mesh.bounds.center(), Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn empty_points_give_zero_bounds() {
        let bounds = Aabb::from_points(&[]);
        assert_eq!(bounds.min, Vec3::ZERO);
        assert_eq!(bounds.max, Vec3::ZERO);
    }

    #[test]
    fn hash_tracks_content() {
        let a = builder(3, 3).build(|_, _| 0.0);
        let b = builder(3, 3).build(|_, _| 0.0);
        let c = builder(3, 3).build(|x, _| x as f32 * 0.5);
        assert_eq!(a.hash, b.hash);
        assert_ne!(a.hash, c.hash);
        assert_eq!(a.hash.to_hex().len(), 64);
    }

    #[test]
    fn interleaved_matches_parallel_buffers() {
        let mesh = builder(2, 1).build(|x, z| (x + z) as f32);
        let vertices = mesh.interleaved();
        assert_eq!(vertices.len(), mesh.vertex_count());
        for (i, v) in vertices.iter().enumerate() {
            assert_eq!(v.position, mesh.positions[i]);
            assert_eq!(v.normal, mesh.normals[i]);
            assert_eq!(v.uv, mesh.uvs[i]);
        }
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), vertices.len() * 32);
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(matches!(
            GridMeshBuilder::new(0, 4, UvReference::default()),
            Err(GenerationError::Configuration(_))
        ));
        assert!(GridMeshBuilder::new(4, 0, UvReference::default()).is_err());
    }

    #[test]
    fn oversized_grid_is_rejected() {
        assert!(GridMeshBuilder::new(u32::MAX, 2, UvReference::default()).is_err());
    }

    #[test]
    fn bad_uv_reference_is_rejected() {
        let uv = UvReference {
            x_max: 0.0,
            y_max: 4.0,
        };
        assert!(GridMeshBuilder::new(1, 1, uv).is_err());
    }

    #[test]
    fn height_fn_sees_every_vertex_once() {
        let mut calls = Vec::new();
        builder(2, 1).build(|x, z| {
            calls.push((x, z));
            0.0
        });
        assert_eq!(calls, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
    }
}
