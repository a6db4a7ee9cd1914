//! Physics query result structures.
//!
//! These structures hold the results of backend calls (raycasts and capsule
//! moves) consumed by the sensors and the movement systems.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollisionData {
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if the backend can report one).
    pub entity: Option<Entity>,
}

impl CollisionData {
    /// Create a hit result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Result of a capsule move.
///
/// Returned by [`crate::backend::CharacterPhysicsBackend::move_capsule`] after
/// the backend has swept and resolved the capsule against the world.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveOutput {
    /// Whether the capsule ended the move resting on ground.
    pub grounded: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collision_data_hit() {
        let hit = CollisionData::new(5.0, Vec3::Y, Vec3::new(10.0, 0.0, 2.0), None);

        assert_eq!(hit.distance, 5.0);
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.point, Vec3::new(10.0, 0.0, 2.0));
    }

    #[test]
    fn collision_data_with_entity() {
        let entity = Entity::from_raw(42);
        let hit = CollisionData::new(3.0, Vec3::X, Vec3::ZERO, Some(entity));

        assert_eq!(hit.entity, Some(entity));
    }

    #[test]
    fn move_output_default_airborne() {
        let out = MoveOutput::default();
        assert!(!out.grounded);
    }
}
