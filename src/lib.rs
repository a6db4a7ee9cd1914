//! First-person parkour character controller for bevy.
//!
//! A kinematic capsule controller with coyote time, jump buffering,
//! variable-height jumps, slope handling, crouch slides, wall running and
//! wall climbing. All movement logic runs single-threaded on the fixed
//! timestep; physics access goes through the [`CharacterPhysicsBackend`]
//! trait so the controller works against any engine that can sweep a
//! capsule and cast rays (a [rapier](https://rapier.rs) backend ships
//! behind the `rapier3d` feature).
//!
//! # Usage
//!
//! ```no_run
//! use bevy::prelude::*;
//! use parkour_character_controller::prelude::*;
//!
//! # #[cfg(feature = "rapier3d")]
//! App::new()
//!     .add_plugins(DefaultPlugins)
//!     .add_plugins(ParkourControllerPlugin::<Rapier3dBackend>::default())
//!     .run();
//! ```
//!
//! Spawn a character with [`ParkourControllerBundle`], feed it a
//! [`MovementIntent`] every tick, and react to [`ControllerEvent`]s.

pub mod backend;
pub mod buffers;
pub mod camera;
pub mod collision;
pub mod config;
pub mod detection;
pub mod intent;
pub mod modes;
pub mod smoothing;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier3d")]
pub mod rapier;

use std::marker::PhantomData;

use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::buffers::ActionBuffers;
use crate::camera::CameraRig;
use crate::config::ControllerConfig;
use crate::detection::{SlopeContact, WallContact};
use crate::intent::MovementIntent;
use crate::modes::ModeProcesses;
use crate::state::{ControllerEvent, MovementState};

pub mod prelude {
    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::buffers::{ActionBuffers, BufferTimer};
    pub use crate::camera::CameraRig;
    pub use crate::config::{ControllerConfig, JumpKinematics, RampCurve};
    pub use crate::detection::{SlopeContact, WallContact};
    pub use crate::intent::MovementIntent;
    pub use crate::modes::ModeProcesses;
    pub use crate::state::{
        Airborne, ControllerEvent, Grounded, MovementState, Sliding, WallClimbing, WallRunning,
    };
    pub use crate::{ControllerSet, ParkourControllerBundle, ParkourControllerPlugin};

    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::{Rapier3dBackend, Rapier3dCharacterBundle};
}

/// Execution order of the controller tick within `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControllerSet {
    /// Buffer timer ticking and window sync.
    Buffers,
    /// Wall sensor fan and wall-mode transitions.
    Sensors,
    /// Input edge resolution: respawn, crouch, the jump chain.
    Arbitration,
    /// Mode drivers: crouch transition, slide, wall run, wall climb.
    Modes,
    /// Gravity, intent smoothing and the capsule move.
    Integration,
    /// Ground probing, slope resolution, landing.
    PostMove,
    /// Look input and camera tilt.
    Camera,
    /// Marker sync and input edge clearing.
    Cleanup,
}

/// The character controller plugin, generic over the physics backend.
pub struct ParkourControllerPlugin<B: CharacterPhysicsBackend> {
    _backend: PhantomData<B>,
}

impl<B: CharacterPhysicsBackend> Default for ParkourControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: CharacterPhysicsBackend> Plugin for ParkourControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_plugins(B::plugin());

        app.register_type::<ControllerConfig>()
            .register_type::<MovementState>()
            .register_type::<MovementIntent>()
            .register_type::<ActionBuffers>()
            .register_type::<ModeProcesses>()
            .register_type::<SlopeContact>()
            .register_type::<WallContact>()
            .register_type::<CameraRig>()
            .register_type::<state::Grounded>()
            .register_type::<state::Airborne>()
            .register_type::<state::Sliding>()
            .register_type::<state::WallRunning>()
            .register_type::<state::WallClimbing>();

        app.add_event::<ControllerEvent>();

        app.configure_sets(
            FixedUpdate,
            (
                ControllerSet::Buffers,
                ControllerSet::Sensors,
                ControllerSet::Arbitration,
                ControllerSet::Modes,
                ControllerSet::Integration,
                ControllerSet::PostMove,
                ControllerSet::Camera,
                ControllerSet::Cleanup,
            )
                .chain(),
        );

        app.add_systems(
            FixedUpdate,
            (
                systems::tick_buffers::<B>.in_set(ControllerSet::Buffers),
                systems::scan_walls::<B>.in_set(ControllerSet::Sensors),
                systems::arbitrate_input::<B>.in_set(ControllerSet::Arbitration),
                systems::drive_modes::<B>.in_set(ControllerSet::Modes),
                systems::integrate_and_move::<B>.in_set(ControllerSet::Integration),
                systems::post_move_ground::<B>.in_set(ControllerSet::PostMove),
                systems::drive_camera.in_set(ControllerSet::Camera),
                (systems::sync_state_markers, systems::clear_input_edges)
                    .in_set(ControllerSet::Cleanup),
            ),
        );
    }
}

/// Everything a controlled character needs besides its physics body.
#[derive(Bundle, Default)]
pub struct ParkourControllerBundle {
    pub config: ControllerConfig,
    pub state: MovementState,
    pub intent: MovementIntent,
    pub buffers: ActionBuffers,
    pub modes: ModeProcesses,
    pub wall_contact: WallContact,
    pub slope_contact: SlopeContact,
    pub rig: CameraRig,
}

impl ParkourControllerBundle {
    /// Bundle with buffer windows taken from the given config.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            buffers: ActionBuffers::new(&config),
            config,
            ..default()
        }
    }
}
