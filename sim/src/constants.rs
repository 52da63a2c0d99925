/// Lower bound of the per-frame speed jitter applied to forward translation.
pub const MIN_SWIM_SPEED_FACTOR: f32 = 0.3;
/// Upper bound of the per-frame speed jitter applied to forward translation.
pub const MAX_SWIM_SPEED_FACTOR: f32 = 1.0;

/// Re-entry targets are drawn from the bounds rectangle shrunk by this factor,
/// which keeps them away from the edges.
pub const REENTRY_INTERIOR_BIAS: f32 = 1.3;

/// Turn-rate multiplier applied while a swimmer is outside its bounds.
pub const ESCAPE_TURN_MULTIPLIER: f32 = 2.0;

/// A random heading change triggers when `next_int(0, frequency)` is at most this.
pub const HEADING_CHANGE_THRESHOLD: i32 = 2;

/// Constant lift added to displaced wave heights so the rest plane stays above zero.
pub const WAVE_LIFT: f32 = 0.3;

/// Number of elements handed to a single compute task.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Frames between two statistics lines in the headless runner.
pub const STATS_INTERVAL_FRAMES: u64 = 120;

pub const TARGET_FRAMES_PER_SECOND: f64 = 60.0;

pub const INVALID_CONFIG_ERROR: &str = "Simulation configuration rejected";
pub const FRAME_IN_FLIGHT_ERROR: &str = "A frame is already in flight";
pub const NO_FRAME_IN_FLIGHT_ERROR: &str = "No frame has been dispatched";
