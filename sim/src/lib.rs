//! Simulation core for a school of swimmers and a wave-animated water surface.
//!
//! ```text
//!            ┌────────────────────────── FrameOrchestrator ──────────────────────────┐
//!  Update    │ dispatch ──▶ SteeringJob (transforms + velocities) ─┐                 │
//!            │          └─▶ WaveJob (vertices, rest normals) ──────┤                 │
//!  PostUpdate│ complete ◀────────────── join ──────────────────────┘ ──▶ WaterMesh   │
//!            └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both jobs split their buffers into fixed-size batches, each moved into its
//! own task on the async compute pool. Every element is updated from its own
//! slot and read-only parameters, so batches never synchronize with each
//! other. The only blocking point is the join.

pub mod bounds;
pub mod config;
pub mod constants;
pub mod error;
pub mod job;
pub mod mesh;
pub mod orchestrator;
pub mod plugin;
pub mod rng;
pub mod sets;
pub mod spawn;
pub mod swimmer;
pub mod wave;

pub use bounds::BoundsRegion;
pub use config::{SchoolConfig, SimulationConfig, SurfaceGridConfig, WaveConfig};
pub use constants::*;
pub use error::{ConfigError, SimError, SimResult};
pub use mesh::WaterMesh;
pub use orchestrator::{FrameClock, FrameOrchestrator, FrameReport};
pub use plugin::{LastFrameReport, Simulation, SimulationPlugin, Swimmer};
pub use rng::{FrameStream, SaltSource};
pub use sets::SimulationSet;
pub use wave::SurfaceMask;
