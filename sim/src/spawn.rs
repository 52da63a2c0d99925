//! Initial placement of the school.

use bevy::{math::Vec3, transform::components::Transform};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::config::SchoolConfig;

/// Scatters `swimmer_count` swimmers uniformly over the bounds rectangle,
/// `spawn_height` above its center, all with the identity rotation.
pub fn scatter(config: &SchoolConfig) -> Vec<Transform> {
    let mut rng = SmallRng::seed_from_u64(config.spawn_seed);
    let center = config.bounds.center + Vec3::Y * config.spawn_height;
    let half = config.bounds.half_extents;

    (0..config.swimmer_count)
        .map(|_| {
            let offset_x = rng.gen_range(-half.x..=half.x);
            let offset_z = rng.gen_range(-half.y..=half.y);
            Transform::from_translation(center + Vec3::new(offset_x, 0.0, offset_z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scatter_lands_inside_bounds() {
        let config = SchoolConfig {
            swimmer_count: 500,
            spawn_height: 3.0,
            ..Default::default()
        };
        let transforms = scatter(&config);

        assert_eq!(transforms.len(), 500);
        for transform in &transforms {
            assert!(config.bounds.contains(transform.translation));
            assert_eq!(transform.translation.y, 3.0);
            assert_eq!(transform.rotation, bevy::math::Quat::IDENTITY);
        }
    }

    #[test]
    fn test_scatter_is_seeded() {
        let config = SchoolConfig::default();
        assert_eq!(scatter(&config), scatter(&config));

        let reseeded = SchoolConfig {
            spawn_seed: 99,
            ..SchoolConfig::default()
        };
        assert_ne!(scatter(&config), scatter(&reseeded));
    }
}
