//! Ground and wall sensing.
//!
//! Sensor results are stored on the character as components so every later
//! system in the tick (and outside observers) reads the same contact data.
//! The ray math itself lives here as pure helpers; the systems module owns
//! the backend casts.

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::CollisionData;

/// Normals this close to horizontal qualify as walls.
pub const WALL_NORMAL_EPSILON: f32 = 1e-4;

/// Length of the downward ground probe below the capsule bottom.
pub const GROUND_PROBE_LENGTH: f32 = 0.5;

/// Latest ground/slope contact for one character.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct SlopeContact {
    /// Standing on a non-flat surface.
    pub on_slope: bool,
    /// Surface incline, degrees from horizontal. Zero when airborne.
    pub angle_deg: f32,
    /// Surface normal of the contact, `Vec3::Y` when there is none.
    pub normal: Vec3,
}

impl SlopeContact {
    /// Record a ground hit.
    pub fn set_hit(&mut self, normal: Vec3) {
        self.normal = normal;
        self.angle_deg = normal.angle_between(Vec3::Y).to_degrees();
        self.on_slope = self.angle_deg > WALL_NORMAL_EPSILON;
    }

    /// Record a miss.
    pub fn clear(&mut self) {
        *self = Self {
            normal: Vec3::Y,
            ..default()
        };
    }
}

/// Latest wall contact for one character.
///
/// `facing` is the camera forward projected into the wall plane as a run
/// direction; `facing_local` is that direction expressed in the camera's
/// local frame, whose x component rates how far up the wall the camera
/// looks. The sign/axis conventions follow the wall arbitration in
/// [`wall_intent_is_climb`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct WallContact {
    /// A qualifying wall is in range this tick.
    pub connected: bool,
    /// Wall surface normal.
    pub normal: Vec3,
    /// Ray hit point on the wall.
    pub hit_point: Vec3,
    /// Distance from the ray origin to the wall.
    pub distance: f32,
    /// Run direction along the wall, world space.
    pub facing: Vec3,
    /// Run direction in the camera's local frame.
    pub facing_local: Vec3,
}

impl WallContact {
    /// Record a wall hit given the camera rotation at cast time.
    pub fn set_hit(&mut self, hit: &CollisionData, camera_rotation: Quat) {
        self.connected = true;
        self.normal = hit.normal;
        self.hit_point = hit.point;
        self.distance = hit.distance;

        let camera_forward = camera_rotation * Vec3::NEG_Z;
        self.facing = camera_forward.cross(hit.normal);
        self.facing_local = camera_rotation.inverse() * self.facing;
    }

    /// Record a miss. The last wall normal sticks around so a buffered
    /// wall jump still has a direction after contact is lost.
    pub fn clear(&mut self) {
        *self = Self {
            normal: self.normal,
            ..Self::default()
        };
    }
}

/// Angular offsets of the wall sensor fan, degrees relative to the body's
/// facing. The fan is centered by integer ray index, so even counts skew
/// half a step toward the positive side.
pub fn fan_offsets(ray_count: u32, spacing_deg: f32) -> Vec<f32> {
    if ray_count == 0 {
        return Vec::new();
    }
    let step = spacing_deg / ray_count as f32;
    (0..ray_count)
        .map(|i| i as f32 * step - step * (ray_count / 2) as f32)
        .collect()
}

/// A surface qualifies as a wall only if its normal is horizontal.
pub fn wall_ray_qualifies(normal: Vec3) -> bool {
    normal.dot(Vec3::Y).abs() < WALL_NORMAL_EPSILON
}

/// Whether the current wall contact should enter climb rather than run.
/// Looking up the wall steers the projected facing toward the camera's
/// local up axis.
pub fn wall_intent_is_climb(contact: &WallContact, climb_factor: f32) -> bool {
    contact.facing_local.x >= climb_factor
}

/// Cast the downward ground probe for one character.
pub fn probe_ground<B: CharacterPhysicsBackend>(
    world: &World,
    entity: Entity,
) -> Option<CollisionData> {
    let position = B::get_position(world, entity);
    let half_height = B::capsule_height(world, entity) / 2.0;
    let origin = position - Vec3::Y * half_height;
    B::raycast(world, origin, Vec3::NEG_Y, GROUND_PROBE_LENGTH, None, entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_offsets_are_index_centered() {
        // 5 rays over 90 degrees: step 18, centered on index 2.
        let offsets = fan_offsets(5, 90.0);
        assert_eq!(offsets, vec![-36.0, -18.0, 0.0, 18.0, 36.0]);
    }

    #[test]
    fn fan_offsets_even_count_skews_positive() {
        let offsets = fan_offsets(4, 90.0);
        assert_eq!(offsets, vec![-45.0, -22.5, 0.0, 22.5]);
    }

    #[test]
    fn fan_offsets_empty_for_zero_rays() {
        assert!(fan_offsets(0, 90.0).is_empty());
    }

    #[test]
    fn only_vertical_surfaces_qualify_as_walls() {
        assert!(wall_ray_qualifies(Vec3::X));
        assert!(wall_ray_qualifies(Vec3::new(0.7, 0.0, 0.7).normalize()));
        assert!(!wall_ray_qualifies(Vec3::Y));
        assert!(!wall_ray_qualifies(Vec3::new(0.1, 0.9, 0.0).normalize()));
    }

    #[test]
    fn slope_contact_rates_incline() {
        let mut contact = SlopeContact::default();
        contact.set_hit(Vec3::Y);
        assert!(!contact.on_slope);
        assert_eq!(contact.angle_deg, 0.0);

        contact.set_hit(Vec3::new(1.0, 1.0, 0.0).normalize());
        assert!(contact.on_slope);
        assert!((contact.angle_deg - 45.0).abs() < 1e-3);

        contact.clear();
        assert!(!contact.on_slope);
        assert_eq!(contact.normal, Vec3::Y);
    }

    #[test]
    fn wall_contact_head_on_gives_flat_facing() {
        // Wall at +X with normal -X, body facing +X (yaw -90).
        let rotation = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2);
        let hit = CollisionData::new(1.0, Vec3::NEG_X, Vec3::X, None);

        let mut contact = WallContact::default();
        contact.set_hit(&hit, rotation);

        assert!(contact.connected);
        // forward +X crossed with normal -X is zero; no run direction.
        assert!(contact.facing.length() < 1e-5);
        assert!(!wall_intent_is_climb(&contact, 0.5));
    }

    #[test]
    fn looking_up_the_wall_requests_climb() {
        // Facing the wall head on, pitched up 45 degrees.
        let rotation = Quat::from_rotation_y(-std::f32::consts::FRAC_PI_2)
            * Quat::from_rotation_x(std::f32::consts::FRAC_PI_4);
        let hit = CollisionData::new(1.0, Vec3::NEG_X, Vec3::X, None);

        let mut contact = WallContact::default();
        contact.set_hit(&hit, rotation);

        assert!(wall_intent_is_climb(&contact, 0.5));
        assert!((contact.facing_local.x - std::f32::consts::FRAC_PI_4.sin()).abs() < 1e-4);
    }

    #[test]
    fn running_alongside_gives_tangent_facing() {
        // Wall at +X with normal -X, body facing +Z (yaw 180).
        let rotation = Quat::from_rotation_y(std::f32::consts::PI);
        let hit = CollisionData::new(1.0, Vec3::NEG_X, Vec3::X, None);

        let mut contact = WallContact::default();
        contact.set_hit(&hit, rotation);

        // forward +Z crossed with -X gives a unit facing along -Y.
        assert!(contact.facing.length() > 0.5);
        assert!(!wall_intent_is_climb(&contact, 0.5));
    }

    #[test]
    fn clearing_contact_keeps_the_last_wall_normal() {
        let rotation = Quat::from_rotation_y(std::f32::consts::PI);
        let hit = CollisionData::new(1.0, Vec3::NEG_X, Vec3::X, None);

        let mut contact = WallContact::default();
        contact.set_hit(&hit, rotation);
        contact.clear();

        assert!(!contact.connected);
        assert_eq!(contact.facing, Vec3::ZERO);
        assert_eq!(contact.normal, Vec3::NEG_X);
    }
}
