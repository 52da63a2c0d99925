//! Per-element pseudo-random streams.
//!
//! Every swimmer gets a brand new stream each frame, seeded from its index,
//! the elapsed time and a coarse per-frame salt. Nothing is carried between
//! calls, so the output of a job is a pure function of its inputs.
//!
//! Streams of neighbouring indices are not statistically independent: two
//! seeds that differ by a small amount feed the same generator family. That is
//! acceptable for steering jitter and nothing else should rely on it.
//!
//! A wall-clock salt makes runs irreproducible. Tests and replay runs should
//! use [`SaltSource::Fixed`].

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{rngs::SmallRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Derives the seed for element `index` at `elapsed` seconds.
///
/// The arithmetic runs in `f64` and truncates, so fractional parts of the
/// product are dropped the same way an integer cast would drop them.
#[inline]
pub fn frame_seed(index: usize, elapsed: f32, salt: u32) -> u64 {
    let seed = index as f64 * elapsed as f64 + 1.0 + salt as f64;
    seed as u64
}

/// Cheap seedable generator for uniform values in half-open ranges.
pub struct FrameStream {
    rng: SmallRng,
}

impl FrameStream {
    pub fn seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Stream for element `index` in the frame described by `elapsed` and `salt`.
    pub fn for_element(index: usize, elapsed: f32, salt: u32) -> Self {
        Self::seed(frame_seed(index, elapsed, salt))
    }

    /// Uniform float in `[lo, hi)`. An empty range yields `lo`.
    #[inline]
    pub fn next_float(&mut self, lo: f32, hi: f32) -> f32 {
        if lo < hi {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }

    /// Uniform integer in `[lo, hi)`. An empty range yields `lo`.
    #[inline]
    pub fn next_int(&mut self, lo: i32, hi: i32) -> i32 {
        if lo < hi {
            self.rng.gen_range(lo..hi)
        } else {
            lo
        }
    }
}

/// Where the per-frame salt comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SaltSource {
    /// Millisecond fraction of the current wall-clock second.
    #[default]
    WallClock,
    /// The same salt every frame.
    Fixed(u32),
}

impl SaltSource {
    pub fn sample(self) -> u32 {
        match self {
            SaltSource::Fixed(salt) => salt,
            SaltSource::WallClock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.subsec_millis())
                .unwrap_or(0),
        }
    }
}
