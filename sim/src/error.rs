//! Error types for simulation setup and the frame lifecycle.
//!
//! Configuration problems are caught once, at initialization, as a
//! [`ConfigError`]. Everything the orchestrator can report afterwards is a
//! [`SimError`]. Per-element numerical faults are not errors: they are
//! collected into the frame report (see [`crate::job::ElementFault`]) so that
//! one bad element never aborts its siblings.

use std::fmt;

use crate::constants::{FRAME_IN_FLIGHT_ERROR, INVALID_CONFIG_ERROR, NO_FRAME_IN_FLIGHT_ERROR};

/// Rejected configuration or initial data.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The school must contain at least one swimmer.
    NoSwimmers,
    /// The number of starting transforms does not match the configured count.
    SwimmerCountMismatch { expected: usize, actual: usize },
    /// The water mesh has no vertices.
    EmptyMesh,
    /// Vertex and normal channels must be the same length.
    MeshChannelMismatch { vertices: usize, normals: usize },
    /// A triangle index points past the end of the vertex buffer.
    IndexOutOfRange { index: u32, vertex_count: usize },
    /// Bounds half-extents must be strictly positive on X and Z.
    DegenerateBounds { half_x: f32, half_z: f32 },
    /// The heading change frequency is used as an exclusive upper bound.
    NonPositiveChangeFrequency(i32),
    /// A numeric tunable is negative or not finite.
    InvalidTunable { name: &'static str, value: f32 },
    /// Batches must contain at least one element.
    ZeroBatchSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoSwimmers => write!(f, "swimmer count must be positive"),
            ConfigError::SwimmerCountMismatch { expected, actual } => write!(
                f,
                "expected {expected} starting transforms, got {actual}"
            ),
            ConfigError::EmptyMesh => write!(f, "water mesh has no vertices"),
            ConfigError::MeshChannelMismatch { vertices, normals } => write!(
                f,
                "water mesh has {vertices} vertices but {normals} normals"
            ),
            ConfigError::IndexOutOfRange {
                index,
                vertex_count,
            } => write!(
                f,
                "triangle index {index} out of range for {vertex_count} vertices"
            ),
            ConfigError::DegenerateBounds { half_x, half_z } => write!(
                f,
                "bounds half-extents must be positive (x: {half_x}, z: {half_z})"
            ),
            ConfigError::NonPositiveChangeFrequency(frequency) => write!(
                f,
                "swim change frequency must be positive, got {frequency}"
            ),
            ConfigError::InvalidTunable { name, value } => {
                write!(f, "tunable `{name}` must be finite and non-negative, got {value}")
            }
            ConfigError::ZeroBatchSize => write!(f, "batch size must be positive"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failures surfaced by the frame orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum SimError {
    Config(ConfigError),
    /// `dispatch` was called before the previous frame was completed.
    FrameInFlight { frame: u64 },
    /// `complete` was called with nothing dispatched.
    NoFrameInFlight,
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::Config(err) => write!(f, "{INVALID_CONFIG_ERROR}: {err}"),
            SimError::FrameInFlight { frame } => {
                write!(f, "{FRAME_IN_FLIGHT_ERROR} (frame {frame})")
            }
            SimError::NoFrameInFlight => write!(f, "{NO_FRAME_IN_FLIGHT_ERROR}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(err: ConfigError) -> Self {
        SimError::Config(err)
    }
}

/// Convenience alias for orchestrator results.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_converts_and_keeps_source() {
        let err: SimError = ConfigError::NoSwimmers.into();
        assert_eq!(err, SimError::Config(ConfigError::NoSwimmers));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("swimmer count"));
    }

    #[test]
    fn test_frame_in_flight_message_names_frame() {
        let err = SimError::FrameInFlight { frame: 7 };
        assert!(err.to_string().contains("frame 7"));
    }
}
