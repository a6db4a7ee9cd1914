//! Per-tick input intent.
//!
//! The controller never reads input devices. Gameplay code (or a test
//! harness) writes a [`MovementIntent`] each tick; the controller consumes
//! it in `FixedUpdate` and clears the edge-triggered flags afterwards.

use bevy::prelude::*;

/// Input intent for one character, refreshed every tick by the caller.
///
/// `movement` is camera-relative: x strafes, y moves forward. Edge flags
/// (`*_down`, `*_up`) are set by the caller on the tick the press/release
/// happened and cleared by the controller at the end of the tick. Held
/// flags are level-triggered and left untouched.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Camera-relative movement axes, each in [-1, 1].
    pub movement: Vec2,
    /// Yaw/pitch look delta for this tick, degrees pre-sensitivity.
    pub look: Vec2,
    /// Jump pressed this tick.
    pub jump_down: bool,
    /// Jump released this tick.
    pub jump_up: bool,
    /// Crouch toggled this tick.
    pub crouch_down: bool,
    /// Wall ride pressed this tick.
    pub wall_ride_down: bool,
    /// Wall ride released this tick.
    pub wall_ride_up: bool,
    /// Wall ride currently held.
    pub wall_ride_held: bool,
}

impl MovementIntent {
    /// Set the movement axes, clamping each to [-1, 1].
    pub fn set_movement(&mut self, movement: Vec2) {
        self.movement = movement.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
    }

    /// Set the look delta for this tick.
    pub fn set_look(&mut self, look: Vec2) {
        self.look = look;
    }

    /// Record a jump press.
    pub fn press_jump(&mut self) {
        self.jump_down = true;
    }

    /// Record a jump release.
    pub fn release_jump(&mut self) {
        self.jump_up = true;
    }

    /// Record a crouch toggle.
    pub fn press_crouch(&mut self) {
        self.crouch_down = true;
    }

    /// Record a wall-ride press. Sets the held flag as well.
    pub fn press_wall_ride(&mut self) {
        self.wall_ride_down = true;
        self.wall_ride_held = true;
    }

    /// Record a wall-ride release. Clears the held flag.
    pub fn release_wall_ride(&mut self) {
        self.wall_ride_up = true;
        self.wall_ride_held = false;
    }

    /// Clear edge-triggered flags and the look delta. Called by the
    /// controller at the end of every tick; held state survives.
    pub fn clear_edges(&mut self) {
        self.jump_down = false;
        self.jump_up = false;
        self.crouch_down = false;
        self.wall_ride_down = false;
        self.wall_ride_up = false;
        self.look = Vec2::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movement_is_clamped() {
        let mut intent = MovementIntent::default();
        intent.set_movement(Vec2::new(3.0, -2.0));
        assert_eq!(intent.movement, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn clear_edges_keeps_held_state() {
        let mut intent = MovementIntent::default();
        intent.press_wall_ride();
        intent.press_jump();
        intent.set_movement(Vec2::Y);
        intent.set_look(Vec2::splat(1.0));

        intent.clear_edges();

        assert!(!intent.wall_ride_down);
        assert!(!intent.jump_down);
        assert!(intent.wall_ride_held);
        assert_eq!(intent.movement, Vec2::Y);
        assert_eq!(intent.look, Vec2::ZERO);
    }

    #[test]
    fn release_clears_held() {
        let mut intent = MovementIntent::default();
        intent.press_wall_ride();
        intent.release_wall_ride();
        assert!(intent.wall_ride_up);
        assert!(!intent.wall_ride_held);
    }
}
