//! Rapier 3D physics backend.
//!
//! Moves go through rapier's kinematic character controller: each call adds
//! to the controller's pending translation and grounded state is read from
//! the previous step's [`KinematicCharacterControllerOutput`]. That makes
//! the reported position one physics step latent, which the movement logic
//! tolerates since every decision is re-evaluated each tick.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::{CollisionData, MoveOutput};

/// Backend implementation using `bevy_rapier3d`.
pub struct Rapier3dBackend;

impl CharacterPhysicsBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule()
    }

    fn move_capsule(world: &mut World, entity: Entity, delta: Vec3) -> MoveOutput {
        let grounded = world
            .get::<KinematicCharacterControllerOutput>(entity)
            .map(|output| output.grounded)
            .unwrap_or(false);

        if let Some(mut controller) = world.get_mut::<KinematicCharacterController>(entity) {
            let pending = controller.translation.unwrap_or(Vec3::ZERO);
            controller.translation = Some(pending + delta);
        }

        MoveOutput { grounded }
    }

    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Option<u32>,
        exclude_entity: Entity,
    ) -> Option<CollisionData> {
        let mut filter = QueryFilter::default().exclude_collider(exclude_entity);
        let groups = mask.map(|mask| {
            CollisionGroups::new(Group::ALL, Group::from_bits_truncate(mask))
        });
        if let Some(groups) = groups.as_ref() {
            filter = filter.groups(*groups);
        }

        for entity_ref in world.iter_entities() {
            let Some(pipeline) = entity_ref.get::<RapierQueryPipeline>() else {
                continue;
            };
            let Some(colliders) = entity_ref.get::<RapierContextColliders>() else {
                continue;
            };
            let Some(bodies) = entity_ref.get::<RapierRigidBodySet>() else {
                continue;
            };
            return pipeline
                .cast_ray_and_get_normal(colliders, bodies, origin, direction, max_distance, true, filter)
                .map(|(hit_entity, hit)| {
                    CollisionData::new(hit.time_of_impact, hit.normal, hit.point, Some(hit_entity))
                });
        }
        None
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec3) {
        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation = position;
        }
    }

    fn capsule_height(world: &World, entity: Entity) -> f32 {
        world
            .get::<Collider>(entity)
            .and_then(|collider| {
                collider.as_capsule().map(|capsule| {
                    capsule.segment().b().y - capsule.segment().a().y + capsule.radius() * 2.0
                })
            })
            .unwrap_or(2.0)
    }

    fn set_capsule_height(world: &mut World, entity: Entity, height: f32) {
        let radius = world
            .get::<Collider>(entity)
            .and_then(|collider| collider.as_capsule().map(|capsule| capsule.radius()))
            .unwrap_or(0.5);
        let half_segment = ((height - radius * 2.0) / 2.0).max(0.01);
        if let Some(mut collider) = world.get_mut::<Collider>(entity) {
            *collider = Collider::capsule_y(half_segment, radius);
        }
    }
}

/// Physics components for a rapier-backed character.
#[derive(Bundle)]
pub struct Rapier3dCharacterBundle {
    pub body: RigidBody,
    pub collider: Collider,
    pub controller: KinematicCharacterController,
}

impl Rapier3dCharacterBundle {
    /// Kinematic capsule of the given total height and radius.
    pub fn new(height: f32, radius: f32) -> Self {
        Self {
            body: RigidBody::KinematicPositionBased,
            collider: Collider::capsule_y(((height - radius * 2.0) / 2.0).max(0.01), radius),
            controller: KinematicCharacterController {
                snap_to_ground: Some(CharacterLength::Absolute(0.2)),
                ..default()
            },
        }
    }
}

impl Default for Rapier3dCharacterBundle {
    fn default() -> Self {
        Self::new(2.0, 0.5)
    }
}
