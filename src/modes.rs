//! Running per-mode processes: wall run, wall climb, slide, crouch.
//!
//! Each process tracks the elapsed-time state one of the movement modes
//! needs while active. They live in one component so the mode systems can
//! start, tick, and cancel them without extra archetype moves; the public
//! mode markers in [`crate::state`] are synced from these at tick end.

use bevy::prelude::*;

/// Running wall-run state.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct WallRunProcess {
    pub active: bool,
    /// Seconds since the run began, drives the speed ramp.
    pub elapsed: f32,
}

/// Running wall-climb state.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct WallClimbProcess {
    pub active: bool,
    /// Seconds since the climb began, drives the speed ramp.
    pub elapsed: f32,
}

/// Running slide state.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct SlideProcess {
    pub active: bool,
    /// Seconds of off-slope sliding. Reset every tick spent on a slope.
    pub elapsed: f32,
    /// Horizontal slide direction fixed at slide start.
    pub direction: Vec3,
    /// The slide has touched a slope at least once.
    pub has_been_on_slope: bool,
    /// Lateral steering velocity while sliding on a slope.
    pub side_shift_velocity: f32,
    /// Smoothing rate memory for the lateral steering.
    pub side_shift_smoothing: f32,
    /// Smoothing rate memory for the on-slope slide velocity.
    pub slide_smoothing: Vec3,
}

/// Running crouch transition state.
#[derive(Reflect, Debug, Clone, Copy, Default)]
pub struct CrouchProcess {
    pub active: bool,
    /// Seconds into the height transition.
    pub elapsed: f32,
    /// Capsule height when the transition started.
    pub from_height: f32,
    /// Capsule height the transition ends at.
    pub to_height: f32,
    /// Shrinking toward the crouch height (false when standing back up).
    pub lowering: bool,
}

/// All mode processes for one character.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct ModeProcesses {
    pub wall_run: WallRunProcess,
    pub wall_climb: WallClimbProcess,
    pub slide: SlideProcess,
    pub crouch: CrouchProcess,
}

impl ModeProcesses {
    /// Start (or restart) the wall run ramp.
    pub fn start_wall_run(&mut self) {
        self.wall_run = WallRunProcess {
            active: true,
            elapsed: 0.0,
        };
    }

    pub fn stop_wall_run(&mut self) {
        self.wall_run = WallRunProcess::default();
    }

    /// Start (or restart) the wall climb ramp.
    pub fn start_wall_climb(&mut self) {
        self.wall_climb = WallClimbProcess {
            active: true,
            elapsed: 0.0,
        };
    }

    pub fn stop_wall_climb(&mut self) {
        self.wall_climb = WallClimbProcess::default();
    }

    /// Start a slide in the given horizontal direction.
    pub fn start_slide(&mut self, direction: Vec3) {
        self.slide = SlideProcess {
            active: true,
            direction,
            ..default()
        };
    }

    pub fn stop_slide(&mut self) {
        self.slide = SlideProcess::default();
    }

    /// Start a crouch height transition, replacing any running one.
    pub fn start_crouch(&mut self, from_height: f32, to_height: f32, lowering: bool) {
        self.crouch = CrouchProcess {
            active: true,
            elapsed: 0.0,
            from_height,
            to_height,
            lowering,
        };
    }

    pub fn stop_crouch(&mut self) {
        self.crouch = CrouchProcess::default();
    }

    /// Any wall mode is active.
    pub fn wall_mode_active(&self) -> bool {
        self.wall_run.active || self.wall_climb.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resets_elapsed() {
        let mut modes = ModeProcesses::default();
        modes.start_wall_run();
        modes.wall_run.elapsed = 2.0;
        modes.start_wall_run();
        assert!(modes.wall_run.active);
        assert_eq!(modes.wall_run.elapsed, 0.0);
    }

    #[test]
    fn crouch_replaces_running_transition() {
        let mut modes = ModeProcesses::default();
        modes.start_crouch(2.0, 1.0, true);
        modes.crouch.elapsed = 0.1;
        modes.start_crouch(1.3, 2.0, false);
        assert_eq!(modes.crouch.from_height, 1.3);
        assert_eq!(modes.crouch.to_height, 2.0);
        assert!(!modes.crouch.lowering);
        assert_eq!(modes.crouch.elapsed, 0.0);
    }

    #[test]
    fn wall_mode_active_covers_both() {
        let mut modes = ModeProcesses::default();
        assert!(!modes.wall_mode_active());
        modes.start_wall_climb();
        assert!(modes.wall_mode_active());
        modes.stop_wall_climb();
        modes.start_wall_run();
        assert!(modes.wall_mode_active());
    }
}
