//! Horizontal containment region for the school.

use bevy::math::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::constants::REENTRY_INTERIOR_BIAS;
use crate::error::ConfigError;
use crate::rng::FrameStream;

/// Axis-aligned rectangle on the XZ plane. Height is ignored for containment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundsRegion {
    /// World-space center, usually the water volume's position.
    pub center: Vec3,
    /// Half-extents along X (`x`) and Z (`y`).
    pub half_extents: Vec2,
}

impl BoundsRegion {
    /// Builds a region, rejecting zero, negative or non-finite extents.
    pub fn new(center: Vec3, half_extents: Vec2) -> Result<Self, ConfigError> {
        let region = Self {
            center,
            half_extents,
        };
        region.validate()?;
        Ok(region)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let Vec2 { x, y } = self.half_extents;
        if !(x.is_finite() && y.is_finite() && x > 0.0 && y > 0.0) || !self.center.is_finite() {
            return Err(ConfigError::DegenerateBounds {
                half_x: x,
                half_z: y,
            });
        }
        Ok(())
    }

    /// Whether `position` lies inside the rectangle, edges included.
    #[inline]
    pub fn contains(&self, position: Vec3) -> bool {
        self.contains_with_margin(position, 0.0)
    }

    /// Like [`Self::contains`] with the rectangle grown by `margin` on every side.
    #[inline]
    pub fn contains_with_margin(&self, position: Vec3, margin: f32) -> bool {
        let dx = (position.x - self.center.x).abs();
        let dz = (position.z - self.center.z).abs();
        dx <= self.half_extents.x + margin && dz <= self.half_extents.y + margin
    }

    /// Random point biased toward the interior, at the center's height.
    ///
    /// Draws X before Z from `stream`.
    pub fn interior_target(&self, stream: &mut FrameStream) -> Vec3 {
        let Vec2 { x: hx, y: hz } = self.half_extents;
        let offset_x = stream.next_float(-hx, hx) / REENTRY_INTERIOR_BIAS;
        let offset_z = stream.next_float(-hz, hz) / REENTRY_INTERIOR_BIAS;
        Vec3::new(
            self.center.x + offset_x,
            // Region height, not world zero; the two agree for a region at y = 0
            self.center.y,
            self.center.z + offset_z,
        )
    }

    /// Full size of the region on X and Z.
    pub fn size(&self) -> Vec2 {
        self.half_extents * 2.0
    }
}

impl Default for BoundsRegion {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec2::new(20.0, 20.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_degenerate_extents() {
        assert!(BoundsRegion::new(Vec3::ZERO, Vec2::new(0.0, 1.0)).is_err());
        assert!(BoundsRegion::new(Vec3::ZERO, Vec2::new(1.0, -1.0)).is_err());
        assert!(BoundsRegion::new(Vec3::ZERO, Vec2::new(f32::NAN, 1.0)).is_err());
        assert!(BoundsRegion::new(Vec3::ZERO, Vec2::new(1.0, 1.0)).is_ok());
    }

    #[test]
    fn test_contains_ignores_height() {
        let bounds = BoundsRegion::new(Vec3::new(10.0, 5.0, 0.0), Vec2::new(2.0, 3.0)).unwrap();
        assert!(bounds.contains(Vec3::new(11.0, -100.0, 2.9)));
        assert!(bounds.contains(Vec3::new(12.0, 0.0, -3.0)));
        assert!(!bounds.contains(Vec3::new(12.1, 5.0, 0.0)));
        assert!(!bounds.contains(Vec3::new(10.0, 5.0, 3.5)));
        assert!(bounds.contains_with_margin(Vec3::new(12.1, 5.0, 0.0), 0.2));
    }

    #[test]
    fn test_interior_target_stays_inside_shrunk_rectangle() {
        let bounds = BoundsRegion::new(Vec3::new(1.0, 2.0, 3.0), Vec2::new(13.0, 26.0)).unwrap();
        for seed in 0..200 {
            let mut stream = FrameStream::seed(seed);
            let target = bounds.interior_target(&mut stream);
            assert!((target.x - 1.0).abs() <= 10.0);
            assert!((target.z - 3.0).abs() <= 20.0);
            assert_eq!(target.y, 2.0);
        }
    }
}
