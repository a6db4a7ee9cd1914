//! First-person camera rig: pitch clamping and wall-run roll.
//!
//! Yaw is applied to the body transform directly; the rig only owns pitch
//! and roll. Pitch is stored in wrapped 0..360 degrees with positive values
//! pitching DOWN, which keeps the clamp a pair of range checks around the
//! wrap point instead of signed-angle bookkeeping.

use bevy::prelude::*;

/// Camera state for one character.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CameraRig {
    /// Entity the camera rotation is written to.
    pub camera: Option<Entity>,
    /// Pitch in wrapped degrees, 0..360, positive pitching down.
    pub pitch_deg: f32,
    /// Current roll applied on top of pitch.
    pub tilt: Quat,
    /// Roll the tilt interpolates toward.
    pub tilt_target: Quat,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            camera: None,
            pitch_deg: 0.0,
            tilt: Quat::IDENTITY,
            tilt_target: Quat::IDENTITY,
        }
    }
}

impl CameraRig {
    pub fn with_camera(camera: Entity) -> Self {
        Self {
            camera: Some(camera),
            ..default()
        }
    }

    /// Apply a pitch delta (positive pitching down), clamped to
    /// `max_angle` degrees either side of horizontal.
    ///
    /// The gate admits deltas that head back toward range even when the
    /// angle is already at (or slightly past) a limit, with a 10 degree
    /// recovery margin, and the hard clamp then pins any overshoot.
    pub fn apply_pitch(&mut self, delta_deg: f32, max_angle: f32) {
        let angle = self.pitch_deg;
        let can_rotate = (delta_deg < 0.0
            && (angle > 360.0 - max_angle || angle < max_angle + 10.0))
            || (delta_deg > 0.0 && (angle > 360.0 - max_angle - 10.0 || angle < max_angle));
        if !can_rotate {
            return;
        }

        self.pitch_deg = (self.pitch_deg + delta_deg).rem_euclid(360.0);

        if self.pitch_deg < 360.0 - max_angle && self.pitch_deg > 180.0 {
            self.pitch_deg = 360.0 - max_angle;
        } else if self.pitch_deg > max_angle && self.pitch_deg < 180.0 {
            self.pitch_deg = max_angle;
        }
    }

    /// Signed pitch in degrees, positive looking up.
    pub fn pitch_up_deg(&self) -> f32 {
        if self.pitch_deg > 180.0 {
            360.0 - self.pitch_deg
        } else {
            -self.pitch_deg
        }
    }

    /// Camera world rotation given the body rotation.
    pub fn camera_rotation(&self, body_rotation: Quat) -> Quat {
        body_rotation * Quat::from_rotation_x(self.pitch_up_deg().to_radians()) * self.tilt
    }

    /// Reset pitch and roll to level.
    pub fn reset(&mut self) {
        self.pitch_deg = 0.0;
        self.tilt = Quat::IDENTITY;
        self.tilt_target = Quat::IDENTITY;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_clamps_looking_down() {
        let mut rig = CameraRig::default();
        for _ in 0..50 {
            rig.apply_pitch(5.0, 60.0);
        }
        assert_eq!(rig.pitch_deg, 60.0);
        assert_eq!(rig.pitch_up_deg(), -60.0);
    }

    #[test]
    fn pitch_clamps_looking_up() {
        let mut rig = CameraRig::default();
        for _ in 0..50 {
            rig.apply_pitch(-5.0, 60.0);
        }
        assert_eq!(rig.pitch_deg, 300.0);
        assert_eq!(rig.pitch_up_deg(), 60.0);
    }

    #[test]
    fn pitch_recovers_from_limit() {
        let mut rig = CameraRig::default();
        rig.apply_pitch(100.0, 60.0);
        assert_eq!(rig.pitch_deg, 60.0);
        rig.apply_pitch(-20.0, 60.0);
        assert_eq!(rig.pitch_deg, 40.0);
    }

    #[test]
    fn camera_rotation_combines_body_and_pitch() {
        let mut rig = CameraRig::default();
        rig.apply_pitch(-45.0, 80.0);
        let rotation = rig.camera_rotation(Quat::IDENTITY);
        let forward = rotation * Vec3::NEG_Z;
        // Looking up 45 degrees.
        assert!((forward.y - std::f32::consts::FRAC_PI_4.sin()).abs() < 1e-4);
    }

    #[test]
    fn reset_levels_the_rig() {
        let mut rig = CameraRig::default();
        rig.apply_pitch(-30.0, 80.0);
        rig.tilt = Quat::from_rotation_z(0.3);
        rig.reset();
        assert_eq!(rig.pitch_deg, 0.0);
        assert_eq!(rig.tilt, Quat::IDENTITY);
    }
}
