//! Controller state, movement-mode markers, and events.

use bevy::prelude::*;

/// Per-character movement state maintained by the controller.
///
/// Gameplay code may read everything and call the switch/request methods;
/// the velocity and bookkeeping fields are written by the controller tick.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct MovementState {
    /// Intent-driven horizontal movement is applied when true.
    pub movement_enabled: bool,
    /// Gravity is integrated when true.
    pub gravity_enabled: bool,
    /// Current velocity, world units per second.
    pub velocity: Vec3,
    /// Smoothing rate memory for the horizontal velocity damping.
    pub velocity_smoothing: Vec3,
    /// Crouched (or crouching) this tick.
    pub is_crouched: bool,
    /// A jump impulse is still active; suppresses ground snapping.
    pub has_jumped: bool,
    /// Touched ground since the last time it was left.
    pub is_landed: bool,
    /// Was grounded on the previous tick.
    pub off_ledge: bool,
    /// Backend-reported ground contact after the last move.
    pub grounded: bool,
    /// Total horizontal speed target this tick.
    pub current_speed: f32,
    /// Ramped wall-run speed contribution.
    pub wall_run_speed: f32,
    /// Ramped wall-climb speed contribution.
    pub wall_climb_speed: f32,
    /// Slide speed contribution while sliding off-slope.
    pub slide_speed: f32,
    /// Downhill slide boost while sliding on a slope.
    pub slide_angle_boost: f32,
    /// External additive speed boost.
    pub speed_boost: f32,
    /// Pre-freeze enable flags, present while frozen.
    pub frozen: Option<(bool, bool)>,
    /// One-shot teleport target consumed by the next integration.
    pub pending_seek: Option<Vec3>,
    /// Respawn requested; handled at the start of the next tick.
    pub respawn_requested: bool,
}

impl Default for MovementState {
    fn default() -> Self {
        Self {
            movement_enabled: true,
            gravity_enabled: true,
            velocity: Vec3::ZERO,
            velocity_smoothing: Vec3::ZERO,
            is_crouched: false,
            has_jumped: false,
            is_landed: false,
            off_ledge: false,
            grounded: false,
            current_speed: 0.0,
            wall_run_speed: 0.0,
            wall_climb_speed: 0.0,
            slide_speed: 0.0,
            slide_angle_boost: 0.0,
            speed_boost: 0.0,
            frozen: None,
            pending_seek: None,
            respawn_requested: false,
        }
    }
}

impl MovementState {
    /// Halt the character: zero velocity, disable movement and gravity.
    /// Idempotent; the pre-freeze enable flags are restored by
    /// [`MovementState::unfreeze`].
    pub fn freeze(&mut self) {
        if self.frozen.is_none() {
            self.frozen = Some((self.movement_enabled, self.gravity_enabled));
        }
        self.movement_enabled = false;
        self.gravity_enabled = false;
        self.velocity = Vec3::ZERO;
        self.velocity_smoothing = Vec3::ZERO;
    }

    /// Restore the enable flags saved by [`MovementState::freeze`]. Does
    /// nothing when not frozen.
    pub fn unfreeze(&mut self) {
        if let Some((movement, gravity)) = self.frozen.take() {
            self.movement_enabled = movement;
            self.gravity_enabled = gravity;
        }
    }

    /// Request a teleport. The next integration overrides velocity so the
    /// move lands exactly on `target`.
    pub fn seek_to(&mut self, target: Vec3) {
        self.pending_seek = Some(target);
    }

    /// Request a respawn reset at the start of the next tick.
    pub fn request_respawn(&mut self) {
        self.respawn_requested = true;
    }

    /// Add an external flat speed boost (negative to slow).
    pub fn apply_speed_boost(&mut self, boost: f32) {
        self.speed_boost += boost;
    }
}

/// Marker: standing on walkable ground.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker: in the air.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker: crouch-sliding.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Sliding;

/// Marker: running along a wall.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct WallRunning;

/// Marker: climbing up a wall.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct WallClimbing;

/// Controller lifecycle events, emitted during the `FixedUpdate` tick.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    /// Touched ground after being airborne.
    Landed(Entity),
    /// Left the ground through a jump.
    Jump(Entity),
    /// State was reset through a respawn request.
    Respawn(Entity),
    /// Entered wall run.
    WallRunBegin(Entity),
    /// Left wall run.
    WallRunEnd(Entity),
    /// Jumped out of wall run.
    WallRunJump(Entity),
    /// Entered wall climb.
    WallClimbBegin(Entity),
    /// Left wall climb.
    WallClimbEnd(Entity),
    /// Jumped out of wall climb.
    WallClimbJump(Entity),
    /// Jumped off a wall within the wall-jump window.
    WallJump(Entity),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeze_is_idempotent() {
        let mut state = MovementState {
            gravity_enabled: false,
            velocity: Vec3::new(1.0, 2.0, 3.0),
            ..default()
        };

        state.freeze();
        state.freeze();
        assert_eq!(state.velocity, Vec3::ZERO);
        assert!(!state.movement_enabled);

        state.unfreeze();
        assert!(state.movement_enabled);
        assert!(!state.gravity_enabled);
        assert!(state.frozen.is_none());

        // Unfreezing again is a no-op.
        state.movement_enabled = false;
        state.unfreeze();
        assert!(!state.movement_enabled);
    }

    #[test]
    fn speed_boost_accumulates() {
        let mut state = MovementState::default();
        state.apply_speed_boost(3.0);
        state.apply_speed_boost(-1.0);
        assert_eq!(state.speed_boost, 2.0);
    }

    #[test]
    fn seek_request_is_stored() {
        let mut state = MovementState::default();
        state.seek_to(Vec3::splat(5.0));
        assert_eq!(state.pending_seek, Some(Vec3::splat(5.0)));
    }
}
