//! Simulation configuration.
//!
//! Serializable so the runner can load it from a RON file. Every field has a
//! default, and [`SimulationConfig::validate`] runs once at initialization.

use bevy::math::{Vec2, Vec3};
use bevy_ecs::resource::Resource;
use serde::{Deserialize, Serialize};

use crate::bounds::BoundsRegion;
use crate::constants::DEFAULT_BATCH_SIZE;
use crate::error::ConfigError;
use crate::rng::SaltSource;
use crate::wave::SurfaceMask;

/// Swimmer school tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    /// Number of swimmers, fixed for the run.
    pub swimmer_count: usize,
    /// Containment rectangle.
    pub bounds: BoundsRegion,
    /// Height above the bounds center where swimmers are scattered.
    pub spawn_height: f32,
    /// Seed for the initial scatter.
    pub spawn_seed: u64,
    pub swim_speed: f32,
    pub turn_speed: f32,
    /// Exclusive upper bound of the heading change roll. Values of 3 or less
    /// redraw the heading every frame spent inside the bounds.
    pub swim_change_frequency: i32,
    pub batch_size: usize,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            swimmer_count: 1000,
            bounds: BoundsRegion {
                center: Vec3::ZERO,
                half_extents: Vec2::new(20.0, 20.0),
            },
            spawn_height: -2.0,
            spawn_seed: 0,
            swim_speed: 2.0,
            turn_speed: 1.5,
            swim_change_frequency: 300,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Wave surface tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Spatial frequency of the noise.
    pub scale: f32,
    /// Temporal scroll speed of the noise.
    pub offset_speed: f32,
    /// Amplitude.
    pub height: f32,
    pub noise_seed: u32,
    pub mask: SurfaceMask,
    pub batch_size: usize,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            scale: 0.1,
            offset_speed: 0.5,
            height: 0.6,
            noise_seed: 0,
            mask: SurfaceMask::UpFacing,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

/// Procedural grid standing in for a loaded water mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceGridConfig {
    /// Cells per side.
    pub resolution: u32,
    /// Side length in world units.
    pub size: f32,
}

impl Default for SurfaceGridConfig {
    fn default() -> Self {
        Self {
            resolution: 100,
            size: 40.0,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub school: SchoolConfig,
    pub waves: WaveConfig,
    pub surface: SurfaceGridConfig,
    pub salt: SaltSource,
}

fn check_tunable(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidTunable { name, value })
    }
}

impl SchoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swimmer_count == 0 {
            return Err(ConfigError::NoSwimmers);
        }
        self.bounds.validate()?;
        if self.swim_change_frequency <= 0 {
            return Err(ConfigError::NonPositiveChangeFrequency(
                self.swim_change_frequency,
            ));
        }
        check_tunable("swim_speed", self.swim_speed)?;
        check_tunable("turn_speed", self.turn_speed)?;
        if !self.spawn_height.is_finite() {
            return Err(ConfigError::InvalidTunable {
                name: "spawn_height",
                value: self.spawn_height,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

impl WaveConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_tunable("scale", self.scale)?;
        check_tunable("offset_speed", self.offset_speed)?;
        // Negative amplitude only flips the waves
        if !self.height.is_finite() {
            return Err(ConfigError::InvalidTunable {
                name: "height",
                value: self.height,
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        Ok(())
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.school.validate()?;
        self.waves.validate()?;
        if self.surface.resolution == 0 {
            return Err(ConfigError::EmptyMesh);
        }
        check_tunable("surface.size", self.surface.size)
    }
}
