//! Per-swimmer steering.
//!
//! Every frame each swimmer moves along its own forward axis, turns toward its
//! persisted heading, and, when it has left the bounds, picks a point inside
//! and turns toward it twice as fast. Swimmers are never clamped back into the
//! bounds; they may overshoot for a few frames while turning.
//!
//! Forward is the local `-Z` axis, and the facing of a heading is the rotation
//! that points `-Z` along it with `+Y` up.

use bevy::{
    math::{Quat, Vec3},
    tasks::TaskPool,
    transform::components::Transform,
};

use crate::bounds::BoundsRegion;
use crate::constants::{
    ESCAPE_TURN_MULTIPLIER, HEADING_CHANGE_THRESHOLD, MAX_SWIM_SPEED_FACTOR,
    MIN_SWIM_SPEED_FACTOR,
};
use crate::job::{spawn_batches, BatchTally, ElementFault, FaultKind, PendingBatches};
use crate::rng::FrameStream;

/// Persistent per-swimmer buffers, indexed identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct School {
    pub transforms: Vec<Transform>,
    /// Current steering heading. Zero means "keep the current facing".
    pub velocities: Vec<Vec3>,
}

impl School {
    /// Wraps starting transforms with zeroed headings.
    pub fn new(transforms: Vec<Transform>) -> Self {
        let velocities = vec![Vec3::ZERO; transforms.len()];
        Self {
            transforms,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

/// Everything a steering update reads besides the swimmer's own slots.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringParams {
    pub bounds: BoundsRegion,
    /// Frame delta in seconds.
    pub delta: f32,
    /// Seconds since the simulation started.
    pub elapsed: f32,
    pub salt: u32,
    pub swim_speed: f32,
    pub turn_speed: f32,
    pub swim_change_frequency: i32,
}

/// Which branch a swimmer took this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteerOutcome {
    /// Inside the bounds, heading kept.
    Cruising,
    /// Inside the bounds, a new random heading was drawn.
    HeadingChanged,
    /// Outside the bounds, steering back in.
    Escaping,
}

/// Rotation whose forward axis points along `direction`.
#[inline]
pub fn facing(direction: Vec3) -> Quat {
    Transform::IDENTITY.looking_to(direction, Vec3::Y).rotation
}

#[inline]
fn turn_toward(transform: &mut Transform, heading: Vec3, rate: f32) {
    transform.rotation = transform
        .rotation
        .lerp(facing(heading), rate.clamp(0.0, 1.0));
}

/// Steering rule for swimmer `index`. Mutates the swimmer in place.
pub fn steer(
    index: usize,
    transform: &mut Transform,
    velocity: &mut Vec3,
    params: &SteeringParams,
) -> SteerOutcome {
    let mut stream = FrameStream::for_element(index, params.elapsed, params.salt);
    let dt = params.delta;

    let speed =
        stream.next_float(MIN_SWIM_SPEED_FACTOR, MAX_SWIM_SPEED_FACTOR) * params.swim_speed;
    let forward = transform.forward();
    transform.translation += *forward * (dt * speed);

    if *velocity != Vec3::ZERO {
        turn_toward(transform, *velocity, params.turn_speed * dt);
    }

    if !params.bounds.contains(transform.translation) {
        let target = params.bounds.interior_target(&mut stream);
        // A degenerate direction leaves the heading alone for this tick
        if let Some(heading) = (target - transform.translation).try_normalize() {
            *velocity = heading;
            turn_toward(
                transform,
                heading,
                params.turn_speed * dt * ESCAPE_TURN_MULTIPLIER,
            );
        }
        return SteerOutcome::Escaping;
    }

    if stream.next_int(0, params.swim_change_frequency) <= HEADING_CHANGE_THRESHOLD {
        *velocity = Vec3::new(
            stream.next_float(-1.0, 1.0),
            0.0,
            stream.next_float(-1.0, 1.0),
        );
        return SteerOutcome::HeadingChanged;
    }

    SteerOutcome::Cruising
}

fn transform_is_finite(transform: &Transform) -> bool {
    transform.translation.is_finite()
        && transform.rotation.is_finite()
        && transform.scale.is_finite()
}

/// [`steer`] with rollback: a non-finite result restores the previous state.
pub fn steer_guarded(
    index: usize,
    transform: &mut Transform,
    velocity: &mut Vec3,
    params: &SteeringParams,
) -> Result<SteerOutcome, ElementFault> {
    let previous_transform = *transform;
    let previous_velocity = *velocity;

    let outcome = steer(index, transform, velocity, params);

    let kind = if !transform_is_finite(transform) {
        FaultKind::NonFiniteTransform
    } else if !velocity.is_finite() {
        FaultKind::NonFiniteVelocity
    } else {
        return Ok(outcome);
    };

    *transform = previous_transform;
    *velocity = previous_velocity;
    Err(ElementFault { index, kind })
}

/// Steers one contiguous run of swimmers starting at `first_index`.
fn steer_batch<'a>(
    first_index: usize,
    swimmers: impl Iterator<Item = (&'a mut Transform, &'a mut Vec3)>,
    params: &SteeringParams,
) -> BatchTally {
    let mut tally = BatchTally::default();
    for (offset, (transform, velocity)) in swimmers.enumerate() {
        tally.processed += 1;
        match steer_guarded(first_index + offset, transform, velocity, params) {
            Ok(SteerOutcome::Escaping) => tally.flagged += 1,
            Ok(_) => {}
            Err(fault) => tally.faults.push(fault),
        }
    }
    tally
}

/// A steering frame whose batches are still running.
pub struct PendingSteering(PendingBatches<(Transform, Vec3)>);

impl PendingSteering {
    /// Blocks until every batch is done and hands the school back.
    pub fn join(self) -> (School, BatchTally) {
        let (swimmers, tally) = self.0.join();
        let (transforms, velocities) = swimmers.into_iter().unzip();
        (
            School {
                transforms,
                velocities,
            },
            tally,
        )
    }
}

/// The steering job for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SteeringJob {
    pub params: SteeringParams,
    pub batch_size: usize,
}

impl SteeringJob {
    /// Moves the school into batches on `pool`. Join the result to get it back.
    pub fn spawn(&self, pool: &TaskPool, school: School) -> PendingSteering {
        debug_assert_eq!(school.transforms.len(), school.velocities.len());
        let swimmers = school
            .transforms
            .into_iter()
            .zip(school.velocities)
            .collect();
        let params = self.params;

        PendingSteering(spawn_batches(
            pool,
            swimmers,
            self.batch_size,
            move |first_index, batch: &mut [(Transform, Vec3)]| {
                steer_batch(
                    first_index,
                    batch.iter_mut().map(|(transform, velocity)| (transform, velocity)),
                    &params,
                )
            },
        ))
    }

    /// Spawns and joins in one call.
    pub fn run(&self, pool: &TaskPool, school: School) -> (School, BatchTally) {
        self.spawn(pool, school).join()
    }

    /// Single-threaded reference path.
    pub fn run_sequential(&self, school: &mut School) -> BatchTally {
        let swimmers = school
            .transforms
            .iter_mut()
            .zip(school.velocities.iter_mut());
        steer_batch(0, swimmers, &self.params).finish()
    }
}
