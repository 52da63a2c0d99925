//! Procedural wave displacement for the water mesh.
//!
//! Each masked vertex gets its third coordinate replaced by a coherent noise
//! sample taken at its first two coordinates, scrolled over time. The first
//! two coordinates are never written, and vertices rejected by the mask keep
//! their height bit for bit.

use std::sync::Arc;

use bevy::{math::Vec3, tasks::TaskPool};
use noise::{NoiseFn, Simplex};
use serde::{Deserialize, Serialize};

use crate::constants::WAVE_LIFT;
use crate::job::{spawn_batches, BatchTally, ElementFault, FaultKind, PendingBatches};

/// Decides which vertices belong to the animated surface, from their rest normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum SurfaceMask {
    /// Normal points into the positive third-axis half-space.
    #[default]
    UpFacing,
    /// Normal has a positive component along `axis`.
    Facing { axis: Vec3 },
    /// Every vertex is animated.
    All,
}

impl SurfaceMask {
    #[inline]
    pub fn accepts(&self, normal: Vec3) -> bool {
        match self {
            SurfaceMask::UpFacing => normal.z > 0.0,
            SurfaceMask::Facing { axis } => normal.dot(*axis) > 0.0,
            SurfaceMask::All => true,
        }
    }
}

/// Tunables and clock for one frame of waves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParams {
    /// Spatial frequency of the noise.
    pub scale: f32,
    /// Scroll speed of the noise over time.
    pub offset_speed: f32,
    /// Amplitude.
    pub height: f32,
    /// Seconds since the simulation started.
    pub elapsed: f32,
    pub mask: SurfaceMask,
}

/// Persistent vertex buffer plus the rest normals captured at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveSurface {
    pub vertices: Vec<Vec3>,
    /// Read-only for the whole run; shared with in-flight jobs.
    pub rest_normals: Arc<[Vec3]>,
}

impl WaveSurface {
    pub fn new(vertices: Vec<Vec3>, rest_normals: impl Into<Arc<[Vec3]>>) -> Self {
        Self {
            vertices,
            rest_normals: rest_normals.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Height for a vertex at planar coordinates `(x, y)`.
#[inline]
pub fn wave_height(noise: &Simplex, x: f32, y: f32, params: &WaveParams) -> f32 {
    let scroll = params.offset_speed * params.elapsed;
    let sample = noise.get([
        (x * params.scale + scroll) as f64,
        (y * params.scale + scroll) as f64,
    ]) as f32;
    sample * params.height + WAVE_LIFT
}

/// Displaces one vertex. Returns whether the mask let it through.
///
/// A non-finite height leaves the vertex untouched and reports a fault.
#[inline]
pub fn displace(
    index: usize,
    vertex: &mut Vec3,
    rest_normal: Vec3,
    noise: &Simplex,
    params: &WaveParams,
) -> Result<bool, ElementFault> {
    if !params.mask.accepts(rest_normal) {
        return Ok(false);
    }

    let height = wave_height(noise, vertex.x, vertex.y, params);
    if !height.is_finite() {
        return Err(ElementFault {
            index,
            kind: FaultKind::NonFiniteHeight,
        });
    }

    vertex.z = height;
    Ok(true)
}

fn displace_batch(
    first_index: usize,
    vertices: &mut [Vec3],
    normals: &[Vec3],
    noise: &Simplex,
    params: &WaveParams,
) -> BatchTally {
    let mut tally = BatchTally::default();
    for (offset, (vertex, normal)) in vertices.iter_mut().zip(normals).enumerate() {
        tally.processed += 1;
        match displace(first_index + offset, vertex, *normal, noise, params) {
            Ok(true) => tally.flagged += 1,
            Ok(false) => {}
            Err(fault) => tally.faults.push(fault),
        }
    }
    tally
}

/// A wave frame whose batches are still running.
pub struct PendingWaves {
    batches: PendingBatches<Vec3>,
    rest_normals: Arc<[Vec3]>,
}

impl PendingWaves {
    /// Blocks until every batch is done and hands the surface back.
    pub fn join(self) -> (WaveSurface, BatchTally) {
        let (vertices, tally) = self.batches.join();
        (WaveSurface::new(vertices, self.rest_normals), tally)
    }
}

/// The wave job for one frame.
#[derive(Clone)]
pub struct WaveJob {
    pub params: WaveParams,
    pub noise: Simplex,
    pub batch_size: usize,
}

impl WaveJob {
    /// Moves the vertex buffer into batches on `pool`. Join the result to get it back.
    pub fn spawn(&self, pool: &TaskPool, surface: WaveSurface) -> PendingWaves {
        debug_assert_eq!(surface.vertices.len(), surface.rest_normals.len());
        let WaveSurface {
            vertices,
            rest_normals,
        } = surface;
        let normals = Arc::clone(&rest_normals);
        let noise = self.noise.clone();
        let params = self.params;

        let batches = spawn_batches(
            pool,
            vertices,
            self.batch_size,
            move |first_index, batch: &mut [Vec3]| {
                let normals = &normals[first_index..first_index + batch.len()];
                displace_batch(first_index, batch, normals, &noise, &params)
            },
        );

        PendingWaves {
            batches,
            rest_normals,
        }
    }

    /// Spawns and joins in one call.
    pub fn run(&self, pool: &TaskPool, surface: WaveSurface) -> (WaveSurface, BatchTally) {
        self.spawn(pool, surface).join()
    }

    /// Single-threaded reference path.
    pub fn run_sequential(&self, surface: &mut WaveSurface) -> BatchTally {
        let normals = Arc::clone(&surface.rest_normals);
        displace_batch(
            0,
            &mut surface.vertices,
            &normals,
            &self.noise,
            &self.params,
        )
        .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(elapsed: f32) -> WaveParams {
        WaveParams {
            scale: 0.35,
            offset_speed: 0.8,
            height: 1.5,
            elapsed,
            mask: SurfaceMask::UpFacing,
        }
    }

    /// Vertices on a small grid with normals alternating up, down, sideways and -0.0.
    fn mixed_surface() -> WaveSurface {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        for i in 0..400 {
            let x = (i % 20) as f32 * 0.5 - 5.0;
            let y = (i / 20) as f32 * 0.5 - 5.0;
            vertices.push(Vec3::new(x, y, 0.123 + i as f32 * 1e-3));
            normals.push(match i % 4 {
                0 => Vec3::Z,
                1 => Vec3::NEG_Z,
                2 => Vec3::new(1.0, 0.0, 0.0),
                _ => Vec3::new(0.0, 1.0, -0.0),
            });
        }
        WaveSurface::new(vertices, normals)
    }

    fn job(elapsed: f32) -> WaveJob {
        WaveJob {
            params: params(elapsed),
            noise: Simplex::new(0),
            batch_size: 64,
        }
    }

    #[test]
    fn test_origin_height_matches_noise() {
        let noise = Simplex::new(0);
        let params = WaveParams {
            scale: 1.0,
            offset_speed: 0.0,
            height: 2.0,
            elapsed: 0.0,
            mask: SurfaceMask::UpFacing,
        };
        let mut vertex = Vec3::ZERO;

        let displaced = displace(0, &mut vertex, Vec3::Z, &noise, &params).unwrap();

        let expected = noise.get([0.0, 0.0]) as f32 * 2.0 + 0.3;
        assert!(displaced);
        assert_eq!(vertex.z, expected);
        assert!((-1.7..=2.3).contains(&vertex.z));
        assert_eq!((vertex.x, vertex.y), (0.0, 0.0));
    }

    #[test]
    fn test_masked_heights_unchanged_across_frames() {
        let start = mixed_surface();
        let mut surface = start.clone();

        for frame in 0..10 {
            job(frame as f32 * 0.016).run_sequential(&mut surface);
        }

        for (i, (before, after)) in start.vertices.iter().zip(&surface.vertices).enumerate() {
            if start.rest_normals[i].z <= 0.0 {
                assert_eq!(before.z.to_bits(), after.z.to_bits(), "vertex {i} moved");
            }
        }
    }

    #[test]
    fn test_planar_coordinates_preserved() {
        let start = mixed_surface();
        let mut surface = start.clone();
        let mut wild = job(12.0);
        wild.params.scale = 17.0;
        wild.params.height = -4.0;
        wild.params.mask = SurfaceMask::All;

        wild.run_sequential(&mut surface);

        for (before, after) in start.vertices.iter().zip(&surface.vertices) {
            assert_eq!(before.x.to_bits(), after.x.to_bits());
            assert_eq!(before.y.to_bits(), after.y.to_bits());
        }
    }

    #[test]
    fn test_up_facing_vertices_move() {
        let mut surface = mixed_surface();
        let tally = job(1.0).run_sequential(&mut surface);
        assert_eq!(tally.processed, 400);
        assert_eq!(tally.flagged, 100);
        assert!(tally.faults.is_empty());
    }

    #[test]
    fn test_facing_mask_generalizes_up_facing() {
        let sideways = SurfaceMask::Facing { axis: Vec3::X };
        assert!(sideways.accepts(Vec3::new(0.5, 0.0, -1.0)));
        assert!(!sideways.accepts(Vec3::Z));
        assert!(SurfaceMask::All.accepts(Vec3::NEG_Z));
        assert!(!SurfaceMask::UpFacing.accepts(Vec3::new(0.0, 0.0, -0.0)));
    }

    #[test]
    fn test_non_finite_height_keeps_previous_value() {
        let start = mixed_surface();
        let mut surface = start.clone();
        let mut broken = job(0.5);
        broken.params.height = f32::INFINITY;

        let tally = broken.run_sequential(&mut surface);

        assert_eq!(tally.faults.len(), 100);
        assert!(tally
            .faults
            .iter()
            .all(|fault| fault.kind == FaultKind::NonFiniteHeight && fault.index % 4 == 0));
        assert_eq!(surface, start);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let pool = TaskPool::new();
        let mut sequential = mixed_surface();

        let (parallel, parallel_tally) = job(2.5).run(&pool, mixed_surface());
        let sequential_tally = job(2.5).run_sequential(&mut sequential);

        assert_eq!(parallel, sequential);
        assert_eq!(parallel_tally, sequential_tally);
    }
}
