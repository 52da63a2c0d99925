//! Render-side water mesh: committed vertex positions plus derived normals.
//!
//! The wave job never touches this type directly. After a frame completes the
//! orchestrator copies the job's vertex buffer in with [`WaterMesh::commit_vertices`]
//! and refreshes the normals. Those normals are for shading only; the wave mask
//! keeps using the rest normals captured at startup.

use bevy::math::Vec3;

use crate::error::ConfigError;

/// Triangle-list mesh with per-vertex normals.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WaterMesh {
    pub vertices: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Triangle indices, three per face.
    pub indices: Vec<u32>,
}

impl WaterMesh {
    /// Flat square grid on the XY channels with `+Z` normals.
    ///
    /// `resolution` is the number of cells per side and `size` the full side
    /// length, centered on the origin.
    pub fn grid(resolution: u32, size: f32) -> Self {
        let cells = resolution.max(1);
        let side = cells + 1;
        let step = size / cells as f32;
        let half = size * 0.5;

        let mut vertices = Vec::with_capacity((side * side) as usize);
        for row in 0..side {
            for column in 0..side {
                vertices.push(Vec3::new(
                    column as f32 * step - half,
                    row as f32 * step - half,
                    0.0,
                ));
            }
        }

        let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
        for row in 0..cells {
            for column in 0..cells {
                let a = row * side + column;
                let b = a + 1;
                let d = a + side;
                let c = d + 1;
                // Counter-clockwise seen from +Z
                indices.extend_from_slice(&[a, b, c, a, c, d]);
            }
        }

        let normals = vec![Vec3::Z; vertices.len()];
        Self {
            vertices,
            normals,
            indices,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vertices.is_empty() {
            return Err(ConfigError::EmptyMesh);
        }
        if self.vertices.len() != self.normals.len() {
            return Err(ConfigError::MeshChannelMismatch {
                vertices: self.vertices.len(),
                normals: self.normals.len(),
            });
        }
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&index| index as usize >= self.vertices.len())
        {
            return Err(ConfigError::IndexOutOfRange {
                index,
                vertex_count: self.vertices.len(),
            });
        }
        Ok(())
    }

    /// Replaces the vertex channel. Lengths must match.
    pub fn commit_vertices(&mut self, vertices: &[Vec3]) {
        debug_assert_eq!(self.vertices.len(), vertices.len());
        self.vertices.copy_from_slice(vertices);
    }

    /// Area-weighted smooth normals from the triangle list.
    ///
    /// Vertices that belong to no non-degenerate triangle keep their old normal.
    pub fn recompute_normals(&mut self) {
        let mut accumulated = vec![Vec3::ZERO; self.vertices.len()];

        for triangle in self.indices.chunks_exact(3) {
            let [a, b, c] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let face =
                (self.vertices[b] - self.vertices[a]).cross(self.vertices[c] - self.vertices[a]);
            accumulated[a] += face;
            accumulated[b] += face;
            accumulated[c] += face;
        }

        for (normal, sum) in self.normals.iter_mut().zip(accumulated) {
            if let Some(unit) = sum.try_normalize() {
                *normal = unit;
            }
        }
    }
}
