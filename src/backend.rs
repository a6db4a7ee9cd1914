//! Physics backend abstraction.
//!
//! This module defines the trait that physics backends must implement
//! to work with the character controller. This allows easy swapping
//! between physics engines (Rapier3D, XPBD, custom, etc.).
//!
//! The controller is a kinematic capsule: the only mutating operation it
//! needs from the world is "move this capsule by a delta and tell me whether
//! it ended up on the ground". Everything else is read-only ray queries and
//! capsule bookkeeping.

use bevy::prelude::*;

use crate::collision::{CollisionData, MoveOutput};

/// Trait for physics backend implementations.
///
/// Implement this trait to integrate a physics engine with the character
/// controller. The backend handles capsule movement, raycasting and capsule
/// shape changes; the controller owns all velocity and mode logic.
///
/// For an example implementation, see the `rapier` module's `Rapier3dBackend`
/// (enabled with the `rapier3d` feature).
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Move the character capsule by `delta`, sweeping and resolving against
    /// the world, and report whether it ended the move grounded.
    ///
    /// The controller calls this once per fixed tick with `velocity * dt`,
    /// plus at most one extra short downward move for slope snapping.
    fn move_capsule(world: &mut World, entity: Entity, delta: Vec3) -> MoveOutput;

    /// Perform a raycast and return the closest hit, if any.
    ///
    /// # Arguments
    /// * `origin` - Ray origin in world space
    /// * `direction` - Cast direction (should be normalized)
    /// * `max_distance` - Maximum cast distance
    /// * `mask` - Optional collision-layer mask for filtering (wall rays)
    /// * `exclude_entity` - Entity to exclude from the cast (usually self)
    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Option<u32>,
        exclude_entity: Entity,
    ) -> Option<CollisionData>;

    /// Get the current world position of an entity (capsule center).
    fn get_position(world: &World, entity: Entity) -> Vec3;

    /// Set the world position of an entity directly, without sweeping.
    fn set_position(world: &mut World, entity: Entity, position: Vec3);

    /// Get the current total capsule height of an entity.
    fn capsule_height(world: &World, entity: Entity) -> f32;

    /// Resize the capsule to the given total height (crouch transitions).
    fn set_capsule_height(world: &mut World, entity: Entity, height: f32);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
