//! Controller configuration components.
//!
//! One [`ControllerConfig`] component per character, grouped by concern the
//! way the tunables are grouped in practice: camera, base movement, jumping,
//! wall run, wall climb, crouch/slide. All jump kinematics are DERIVED from
//! height and apex-time settings; there is no hand-tuned gravity constant.

use bevy::prelude::*;

/// Easing curve for wall-run and wall-climb speed ramps.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RampCurve {
    /// Constant-rate ramp.
    Linear,
    /// Fast start, slow finish.
    #[default]
    EaseOut,
    /// Slow start, fast finish.
    EaseIn,
    /// Smoothstep.
    EaseInOut,
}

impl RampCurve {
    /// Evaluate the curve at `t`, clamped to `[0, 1]`.
    pub fn evaluate(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            RampCurve::Linear => t,
            RampCurve::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            RampCurve::EaseIn => t * t,
            RampCurve::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

/// Camera look settings.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct CameraSettings {
    /// Degrees of rotation per unit of look input per tick.
    pub sensitivity: f32,
    /// Pitch clamp, degrees above/below horizontal.
    pub max_angle_deg: f32,
    /// Invert vertical look.
    pub inverted: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            sensitivity: 2.0,
            max_angle_deg: 80.0,
            inverted: false,
        }
    }
}

/// Base ground movement settings.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct BaseMovementSettings {
    /// Base horizontal movement speed (units/second).
    pub base_speed: f32,
    /// Time constant for the horizontal velocity smoothing (seconds).
    pub acceleration_time: f32,
    /// Horizontal slide-down bias applied on over-limit slopes.
    pub slope_friction: f32,
    /// Maximum walkable incline, degrees from horizontal. Steeper surfaces
    /// push the character downhill.
    pub slope_limit_deg: f32,
    /// Normal-component scale used to rate slope steepness for slide boosts.
    pub slope_tolerance: f32,
    /// Time constant for slide velocity smoothing while on a slope.
    pub slope_slide_acceleration_time: f32,
}

impl Default for BaseMovementSettings {
    fn default() -> Self {
        Self {
            base_speed: 8.0,
            acceleration_time: 0.12,
            slope_friction: 4.0,
            slope_limit_deg: 45.0,
            slope_tolerance: 1.0,
            slope_slide_acceleration_time: 0.5,
        }
    }
}

/// Jumping settings. Gravity and jump velocities are derived, see
/// [`JumpKinematics`].
#[derive(Reflect, Debug, Clone, Copy)]
pub struct JumpingSettings {
    /// Apex height of a fully held jump (world units).
    pub max_jump_height: f32,
    /// Apex height of a tapped jump.
    pub min_jump_height: f32,
    /// Seconds from takeoff to apex of a full jump.
    pub time_to_apex: f32,
    /// Coyote window after leaving the ground (seconds).
    pub grace_time: f32,
    /// Early-press window honored on landing (seconds).
    pub jump_buffer_time: f32,
}

impl Default for JumpingSettings {
    fn default() -> Self {
        Self {
            max_jump_height: 4.0,
            min_jump_height: 1.0,
            time_to_apex: 0.5,
            grace_time: 0.15,
            jump_buffer_time: 0.1,
        }
    }
}

/// Wall-run settings, including the shared wall sensor and wall jump.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct WallRunSettings {
    /// Master switch for the wall-ride subsystems (run and climb).
    pub enabled: bool,
    /// Collision-layer mask for wall rays, backend-interpreted.
    pub mask: Option<u32>,
    /// Speed ramp shape.
    pub speed_curve: RampCurve,
    /// Seconds for the ramp to reach max speed.
    pub speed_up_time: f32,
    /// Speed contribution at the top of the ramp.
    pub max_speed: f32,
    /// Camera roll interpolation factor per tick (0-1).
    pub tilt_speed: f32,
    /// Maximum camera roll while wall running, degrees.
    pub max_tilt_deg: f32,
    /// Number of rays in the wall sensor fan.
    pub ray_count: u32,
    /// Total angular spread of the fan, degrees.
    pub ray_spacing_deg: f32,
    /// Length of each wall ray.
    pub ray_length: f32,
    /// Cooldown before a wall mode can be re-entered after exiting (seconds).
    pub reentry_time: f32,
    /// Exit-jump impulse; x/z are scaled by the wall normal.
    pub jump_velocity: Vec3,
    /// Window after first wall contact during which a jump press becomes a
    /// wall jump (seconds).
    pub wall_jump_time: f32,
    /// Wall-jump impulse; x/z are scaled by the wall normal.
    pub wall_jump_velocity: Vec3,
}

impl Default for WallRunSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mask: None,
            speed_curve: RampCurve::EaseOut,
            speed_up_time: 1.0,
            max_speed: 6.0,
            tilt_speed: 0.15,
            max_tilt_deg: 15.0,
            ray_count: 5,
            ray_spacing_deg: 90.0,
            ray_length: 1.5,
            reentry_time: 0.5,
            jump_velocity: Vec3::new(6.0, 10.0, 6.0),
            wall_jump_time: 0.2,
            wall_jump_velocity: Vec3::new(8.0, 12.0, 8.0),
        }
    }
}

/// Wall-climb settings.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct WallClimbSettings {
    /// Speed ramp shape.
    pub speed_curve: RampCurve,
    /// Speed contribution at the top of the ramp.
    pub max_speed: f32,
    /// Seconds for the ramp to reach max speed.
    pub speed_up_time: f32,
    /// Camera-local facing threshold that flips wall intent from run to
    /// climb. Higher values demand looking more directly up the wall.
    pub climb_factor: f32,
    /// Exit-jump impulse; x/z are scaled by the wall normal.
    pub jump_velocity: Vec3,
}

impl Default for WallClimbSettings {
    fn default() -> Self {
        Self {
            speed_curve: RampCurve::EaseOut,
            max_speed: 4.0,
            speed_up_time: 0.75,
            climb_factor: 0.5,
            jump_velocity: Vec3::new(5.0, 11.0, 5.0),
        }
    }
}

/// Crouch and slide settings.
#[derive(Reflect, Debug, Clone, Copy)]
pub struct CrouchSlideSettings {
    /// Master switch for the crouch/slide subsystem.
    pub enabled: bool,
    /// Capsule height when standing.
    pub stand_height: f32,
    /// Capsule height when crouched.
    pub crouch_height: f32,
    /// Seconds for the capsule shrink/restore transition.
    pub crouch_time: f32,
    /// Flat-ground slide speed (units/second).
    pub slide_speed: f32,
    /// Slide duration off-slope (seconds). On a slope the timer resets every
    /// tick, so slides on continuous slopes do not time out.
    pub slide_time: f32,
    /// Downhill speed on the gentlest qualifying slope.
    pub angle_boost_min: f32,
    /// Downhill speed on the steepest qualifying slope.
    pub angle_boost_max: f32,
    /// Maximum lateral steering speed while sliding on a slope.
    pub side_shift_max_speed: f32,
    /// Time constant for the lateral steering smoothing.
    pub side_shift_accel_time: f32,
}

impl Default for CrouchSlideSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            stand_height: 2.0,
            crouch_height: 1.0,
            crouch_time: 0.3,
            slide_speed: 12.0,
            slide_time: 0.75,
            angle_boost_min: 6.0,
            angle_boost_max: 14.0,
            side_shift_max_speed: 4.0,
            side_shift_accel_time: 0.2,
        }
    }
}

/// Full configuration for one character controller.
///
/// Hot-reloadable: buffer windows are re-synced every tick and jump
/// kinematics are recomputed from the jumping settings at every use, so
/// editing any field takes effect immediately.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ControllerConfig {
    pub camera: CameraSettings,
    pub base: BaseMovementSettings,
    pub jumping: JumpingSettings,
    pub wall_run: WallRunSettings,
    pub wall_climb: WallClimbSettings,
    pub crouch_slide: CrouchSlideSettings,
}

impl ControllerConfig {
    /// Create a config with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preset tuned for a responsive parkour player character.
    pub fn player() -> Self {
        Self {
            base: BaseMovementSettings {
                base_speed: 9.0,
                acceleration_time: 0.1,
                ..default()
            },
            wall_run: WallRunSettings {
                speed_up_time: 0.8,
                max_speed: 7.0,
                ..default()
            },
            ..default()
        }
    }

    /// Builder: set base speed.
    pub fn with_base_speed(mut self, speed: f32) -> Self {
        self.base.base_speed = speed;
        self
    }

    /// Builder: set the horizontal acceleration time constant.
    pub fn with_acceleration_time(mut self, time: f32) -> Self {
        self.base.acceleration_time = time;
        self
    }

    /// Builder: set jump heights and apex time.
    pub fn with_jump(mut self, max_height: f32, min_height: f32, time_to_apex: f32) -> Self {
        self.jumping.max_jump_height = max_height;
        self.jumping.min_jump_height = min_height;
        self.jumping.time_to_apex = time_to_apex;
        self
    }

    /// Builder: set the coyote grace window.
    pub fn with_grace_time(mut self, time: f32) -> Self {
        self.jumping.grace_time = time;
        self
    }

    /// Builder: set the jump buffer window.
    pub fn with_jump_buffer_time(mut self, time: f32) -> Self {
        self.jumping.jump_buffer_time = time;
        self
    }

    /// Builder: set the wall-run reentry cooldown.
    pub fn with_wall_reentry_time(mut self, time: f32) -> Self {
        self.wall_run.reentry_time = time;
        self
    }

    /// Builder: disable the wall-ride subsystems.
    pub fn without_wall_riding(mut self) -> Self {
        self.wall_run.enabled = false;
        self
    }

    /// Builder: disable the crouch/slide subsystem.
    pub fn without_crouch_slide(mut self) -> Self {
        self.crouch_slide.enabled = false;
        self
    }
}

/// Derived jump kinematics.
///
/// Closed-form projectile motion from the configured heights and apex time:
/// `gravity = -2 * max_height / apex_time^2`,
/// `max_jump_velocity = |gravity| * apex_time`,
/// `min_jump_velocity = sqrt(2 * |gravity| * min_height)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpKinematics {
    /// Vertical acceleration, negative (downward).
    pub gravity: f32,
    /// Takeoff velocity of a full jump.
    pub max_jump_velocity: f32,
    /// Ascent velocity clamped to on early jump release.
    pub min_jump_velocity: f32,
}

impl JumpKinematics {
    /// Derive kinematics from jumping settings.
    ///
    /// A zero or negative apex time is degenerate; it yields zeroed
    /// kinematics (no gravity, no jump) rather than dividing by zero.
    pub fn derive(jumping: &JumpingSettings) -> Self {
        if jumping.time_to_apex <= 0.0 {
            warn!("time_to_apex must be positive; jump kinematics zeroed");
            return Self {
                gravity: 0.0,
                max_jump_velocity: 0.0,
                min_jump_velocity: 0.0,
            };
        }

        let gravity =
            -(2.0 * jumping.max_jump_height) / (jumping.time_to_apex * jumping.time_to_apex);
        Self {
            gravity,
            max_jump_velocity: gravity.abs() * jumping.time_to_apex,
            min_jump_velocity: (2.0 * gravity.abs() * jumping.min_jump_height.max(0.0)).sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jump_kinematics_closed_form() {
        let jumping = JumpingSettings {
            max_jump_height: 4.0,
            min_jump_height: 1.0,
            time_to_apex: 0.5,
            ..default()
        };
        let kin = JumpKinematics::derive(&jumping);

        assert_eq!(kin.gravity, -32.0);
        assert_eq!(kin.max_jump_velocity, 16.0);
        assert!((kin.min_jump_velocity - 8.0).abs() < 1e-5);
    }

    #[test]
    fn jump_kinematics_zero_apex_time_is_guarded() {
        let jumping = JumpingSettings {
            time_to_apex: 0.0,
            ..default()
        };
        let kin = JumpKinematics::derive(&jumping);

        assert_eq!(kin.gravity, 0.0);
        assert_eq!(kin.max_jump_velocity, 0.0);
        assert_eq!(kin.min_jump_velocity, 0.0);
    }

    #[test]
    fn ramp_curve_endpoints() {
        for curve in [
            RampCurve::Linear,
            RampCurve::EaseOut,
            RampCurve::EaseIn,
            RampCurve::EaseInOut,
        ] {
            assert_eq!(curve.evaluate(0.0), 0.0);
            assert_eq!(curve.evaluate(1.0), 1.0);
            // Clamped outside [0, 1]
            assert_eq!(curve.evaluate(-1.0), 0.0);
            assert_eq!(curve.evaluate(2.0), 1.0);
        }
    }

    #[test]
    fn ramp_curve_ease_out_front_loads() {
        assert!(RampCurve::EaseOut.evaluate(0.5) > 0.5);
        assert!(RampCurve::EaseIn.evaluate(0.5) < 0.5);
    }

    #[test]
    fn player_preset_is_faster() {
        let player = ControllerConfig::player();
        let base = ControllerConfig::default();
        assert!(player.base.base_speed > base.base.base_speed);
    }

    #[test]
    fn builders_compose() {
        let config = ControllerConfig::new()
            .with_base_speed(5.0)
            .with_jump(4.0, 1.0, 0.5)
            .with_grace_time(0.2)
            .without_crouch_slide();

        assert_eq!(config.base.base_speed, 5.0);
        assert_eq!(config.jumping.grace_time, 0.2);
        assert!(!config.crouch_slide.enabled);
        assert!(config.wall_run.enabled);
    }
}
