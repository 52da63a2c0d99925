//! Per-frame dispatch and join of the steering and wave jobs.
//!
//! ## Ownership windows
//!
//! ```text
//!   idle ──dispatch──▶ in flight ──complete──▶ idle
//!   buffers owned      buffers moved into      buffers returned,
//!   by orchestrator    two async tasks         mesh committed
//! ```
//!
//! `dispatch` splits the school and the vertex buffer into batches and moves
//! each batch into its own task on the [`AsyncComputeTaskPool`]. `complete`
//! blocks on every batch, reassembles the buffers, copies the vertices into
//! the render mesh and recomputes its normals. While a frame is in flight the
//! buffers are simply not reachable, and a second `dispatch` is refused.
//!
//! Batch tasks never wait on anything, so `complete` may be called from a
//! compute pool worker (an ordinary Bevy system) without starving them.

use std::sync::Arc;

use bevy::{
    math::Vec3,
    tasks::{AsyncComputeTaskPool, TaskPool},
    transform::components::Transform,
};
use bevy_log::{debug, info, warn};
use noise::Simplex;

use crate::config::SimulationConfig;
use crate::error::{ConfigError, SimError, SimResult};
use crate::job::ElementFault;
use crate::mesh::WaterMesh;
use crate::swimmer::{PendingSteering, School, SteeringJob, SteeringParams};
use crate::wave::{PendingWaves, WaveJob, WaveParams, WaveSurface};

/// Live inputs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// Seconds since the simulation started.
    pub elapsed: f32,
    /// Seconds since the previous frame.
    pub delta: f32,
    /// Coarse per-frame value mixed into every swimmer seed.
    pub salt: u32,
}

impl FrameClock {
    pub fn new(elapsed: f32, delta: f32, salt: u32) -> Self {
        Self {
            elapsed,
            delta,
            salt,
        }
    }

    /// Clock for frame `frame` of a fixed-step run.
    pub fn fixed_step(frame: u64, delta: f32, salt: u32) -> Self {
        Self::new(frame as f32 * delta, delta, salt)
    }
}

/// Outcome of one completed frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub swimmers: usize,
    /// Swimmers that were outside the bounds this frame.
    pub escaped: usize,
    pub vertices: usize,
    /// Vertices accepted by the surface mask.
    pub displaced: usize,
    pub steering_faults: Vec<ElementFault>,
    pub wave_faults: Vec<ElementFault>,
}

impl FrameReport {
    pub fn fault_count(&self) -> usize {
        self.steering_faults.len() + self.wave_faults.len()
    }
}

struct Buffers {
    school: School,
    surface: WaveSurface,
}

struct InFlightFrame {
    frame: u64,
    steering: PendingSteering,
    waves: PendingWaves,
}

/// Owns the persistent buffers and drives the frame lifecycle.
///
/// Dropping the orchestrator releases every buffer, including the ones held
/// by an in-flight frame, whose tasks are cancelled.
pub struct FrameOrchestrator {
    config: SimulationConfig,
    noise: Simplex,
    mesh: WaterMesh,
    idle: Option<Buffers>,
    in_flight: Option<InFlightFrame>,
    /// Frames dispatched so far.
    frame: u64,
}

impl FrameOrchestrator {
    /// Validates the setup and captures the persistent buffers.
    ///
    /// Initializes the async compute task pool if the host has not done so
    /// already.
    pub fn init(
        config: SimulationConfig,
        transforms: Vec<Transform>,
        mesh: WaterMesh,
    ) -> SimResult<Self> {
        config.validate()?;
        if transforms.len() != config.school.swimmer_count {
            return Err(ConfigError::SwimmerCountMismatch {
                expected: config.school.swimmer_count,
                actual: transforms.len(),
            }
            .into());
        }
        mesh.validate()?;

        AsyncComputeTaskPool::get_or_init(TaskPool::default);

        let rest_normals: Arc<[Vec3]> = mesh.normals.clone().into();
        let surface = WaveSurface::new(mesh.vertices.clone(), rest_normals);
        let school = School::new(transforms);

        info!(
            "Simulation initialized: {} swimmers, {} surface vertices",
            school.len(),
            surface.len()
        );

        Ok(Self {
            noise: Simplex::new(config.waves.noise_seed),
            config,
            mesh,
            idle: Some(Buffers { school, surface }),
            in_flight: None,
            frame: 0,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Frames dispatched so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Swimmer transforms, unavailable while a frame is in flight.
    pub fn transforms(&self) -> Option<&[Transform]> {
        self.idle.as_ref().map(|buffers| &buffers.school.transforms[..])
    }

    /// Swimmer headings, unavailable while a frame is in flight.
    pub fn velocities(&self) -> Option<&[Vec3]> {
        self.idle.as_ref().map(|buffers| &buffers.school.velocities[..])
    }

    /// The render mesh as of the last completed frame.
    pub fn mesh(&self) -> &WaterMesh {
        &self.mesh
    }

    pub fn steering_params(&self, clock: &FrameClock) -> SteeringParams {
        let school = &self.config.school;
        SteeringParams {
            bounds: school.bounds,
            delta: clock.delta,
            elapsed: clock.elapsed,
            salt: clock.salt,
            swim_speed: school.swim_speed,
            turn_speed: school.turn_speed,
            swim_change_frequency: school.swim_change_frequency,
        }
    }

    pub fn wave_params(&self, clock: &FrameClock) -> WaveParams {
        let waves = &self.config.waves;
        WaveParams {
            scale: waves.scale,
            offset_speed: waves.offset_speed,
            height: waves.height,
            elapsed: clock.elapsed,
            mask: waves.mask,
        }
    }

    /// Starts both jobs for a new frame and returns its number.
    pub fn dispatch(&mut self, clock: FrameClock) -> SimResult<u64> {
        let Some(Buffers { school, surface }) = self.idle.take() else {
            return Err(SimError::FrameInFlight { frame: self.frame });
        };

        let steering_job = SteeringJob {
            params: self.steering_params(&clock),
            batch_size: self.config.school.batch_size,
        };
        let wave_job = WaveJob {
            params: self.wave_params(&clock),
            noise: self.noise.clone(),
            batch_size: self.config.waves.batch_size,
        };

        let pool = AsyncComputeTaskPool::get();
        let steering = steering_job.spawn(pool, school);
        let waves = wave_job.spawn(pool, surface);

        self.frame += 1;
        self.in_flight = Some(InFlightFrame {
            frame: self.frame,
            steering,
            waves,
        });
        Ok(self.frame)
    }

    /// Blocks until the in-flight frame is done, then commits the mesh.
    pub fn complete(&mut self) -> SimResult<FrameReport> {
        let Some(in_flight) = self.in_flight.take() else {
            return Err(SimError::NoFrameInFlight);
        };

        let (school, steering) = in_flight.steering.join();
        let (surface, waves) = in_flight.waves.join();

        self.mesh.commit_vertices(&surface.vertices);
        self.mesh.recompute_normals();

        let report = FrameReport {
            frame: in_flight.frame,
            swimmers: steering.processed,
            escaped: steering.flagged,
            vertices: waves.processed,
            displaced: waves.flagged,
            steering_faults: steering.faults,
            wave_faults: waves.faults,
        };

        if report.fault_count() > 0 {
            warn!(
                "Frame {}: {} swimmer and {} vertex updates discarded, first at swimmer {:?} / vertex {:?}",
                report.frame,
                report.steering_faults.len(),
                report.wave_faults.len(),
                report.steering_faults.first().map(|fault| fault.index),
                report.wave_faults.first().map(|fault| fault.index),
            );
        }

        self.idle = Some(Buffers { school, surface });
        Ok(report)
    }

    /// Dispatch followed immediately by complete.
    pub fn step(&mut self, clock: FrameClock) -> SimResult<FrameReport> {
        self.dispatch(clock)?;
        self.complete()
    }

    /// Joins any in-flight frame and releases the buffers.
    pub fn teardown(mut self) -> Option<FrameReport> {
        let pending = if self.is_in_flight() {
            self.complete().ok()
        } else {
            None
        };
        debug!("Simulation torn down after {} frames", self.frame);
        pending
    }
}
