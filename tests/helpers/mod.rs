//! Shared test harness: a scripted physics backend over plane geometry and
//! an app builder that runs the controller on a manually driven
//! `FixedUpdate`.

use bevy::prelude::*;

use parkour_character_controller::backend::CharacterPhysicsBackend;
use parkour_character_controller::collision::{CollisionData, MoveOutput};
use parkour_character_controller::prelude::*;

/// An infinite ground plane.
#[derive(Debug, Clone, Copy)]
pub struct GroundPlane {
    pub point: Vec3,
    pub normal: Vec3,
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self {
            point: Vec3::ZERO,
            normal: Vec3::Y,
        }
    }
}

impl GroundPlane {
    /// Surface height at the given horizontal position.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        self.point.y
            - (self.normal.x * (x - self.point.x) + self.normal.z * (z - self.point.z))
                / self.normal.y
    }
}

/// An infinite vertical wall plane. Solid: the backend keeps capsules at
/// least [`CAPSULE_RADIUS`] in front of it.
#[derive(Debug, Clone, Copy)]
pub struct WallPlane {
    pub point: Vec3,
    pub normal: Vec3,
}

pub const CAPSULE_RADIUS: f32 = 0.5;

/// The scripted world the test backend moves and casts against.
#[derive(Resource, Debug, Clone, Default)]
pub struct TestArena {
    pub ground: Option<GroundPlane>,
    pub walls: Vec<WallPlane>,
}

/// Kinematic state of a test character.
#[derive(Component, Debug, Clone, Copy)]
pub struct TestBody {
    pub position: Vec3,
    pub capsule_height: f32,
}

fn ray_plane(origin: Vec3, direction: Vec3, point: Vec3, normal: Vec3) -> Option<f32> {
    let denom = direction.dot(normal);
    if denom >= -1e-6 {
        return None;
    }
    let t = (point - origin).dot(normal) / denom;
    (t >= 0.0).then_some(t)
}

pub struct TestBackend;

pub struct TestBackendPlugin;

impl Plugin for TestBackendPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TestArena>();
    }
}

impl CharacterPhysicsBackend for TestBackend {
    fn plugin() -> impl Plugin {
        TestBackendPlugin
    }

    fn move_capsule(world: &mut World, entity: Entity, delta: Vec3) -> MoveOutput {
        let arena = world.resource::<TestArena>().clone();
        let Some(mut body) = world.get_mut::<TestBody>(entity) else {
            return MoveOutput::default();
        };

        body.position += delta;

        for wall in &arena.walls {
            let distance = (body.position - wall.point).dot(wall.normal);
            if distance < CAPSULE_RADIUS {
                body.position += wall.normal * (CAPSULE_RADIUS - distance);
            }
        }

        let mut grounded = false;
        if let Some(ground) = arena.ground {
            let surface = ground.height_at(body.position.x, body.position.z);
            let bottom = body.position.y - body.capsule_height / 2.0;
            if bottom < surface {
                body.position.y = surface + body.capsule_height / 2.0;
            }
            let bottom = body.position.y - body.capsule_height / 2.0;
            grounded = bottom <= surface + 1e-4 && delta.y <= 0.0;
        }

        MoveOutput { grounded }
    }

    fn raycast(
        world: &World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        _mask: Option<u32>,
        _exclude_entity: Entity,
    ) -> Option<CollisionData> {
        let arena = world.resource::<TestArena>();
        let mut best: Option<CollisionData> = None;

        let mut consider = |point: Vec3, normal: Vec3| {
            if let Some(t) = ray_plane(origin, direction, point, normal) {
                if t <= max_distance && best.map(|b| t < b.distance).unwrap_or(true) {
                    best = Some(CollisionData::new(t, normal, origin + direction * t, None));
                }
            }
        };

        if let Some(ground) = &arena.ground {
            consider(ground.point, ground.normal);
        }
        for wall in &arena.walls {
            consider(wall.point, wall.normal);
        }

        best
    }

    fn get_position(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.position)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(world: &mut World, entity: Entity, position: Vec3) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            body.position = position;
        }
    }

    fn capsule_height(world: &World, entity: Entity) -> f32 {
        world
            .get::<TestBody>(entity)
            .map(|b| b.capsule_height)
            .unwrap_or(2.0)
    }

    fn set_capsule_height(world: &mut World, entity: Entity, height: f32) {
        if let Some(mut body) = world.get_mut::<TestBody>(entity) {
            // Resize from the feet so crouching does not lift the capsule.
            let bottom = body.position.y - body.capsule_height / 2.0;
            body.capsule_height = height;
            body.position.y = bottom + height / 2.0;
        }
    }
}

/// App with the controller on the test backend. `FixedUpdate` is driven
/// manually through [`tick`].
pub fn create_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(ParkourControllerPlugin::<TestBackend>::default());
    app.finish();
    app.cleanup();
    app
}

/// Spawn a character standing capsule at `position` (capsule center).
pub fn spawn_character(app: &mut App, position: Vec3, config: ControllerConfig) -> Entity {
    let height = config.crouch_slide.stand_height;
    app.world_mut()
        .spawn((
            Transform::default(),
            ParkourControllerBundle::new(config),
            TestBody {
                position,
                capsule_height: height,
            },
        ))
        .id()
}

/// Run one controller tick.
pub fn tick(app: &mut App) {
    app.world_mut().run_schedule(FixedUpdate);
}

pub fn run_ticks(app: &mut App, count: usize) {
    for _ in 0..count {
        tick(app);
    }
}

pub fn state(app: &App, entity: Entity) -> MovementState {
    *app.world().get::<MovementState>(entity).unwrap()
}

pub fn body(app: &App, entity: Entity) -> TestBody {
    *app.world().get::<TestBody>(entity).unwrap()
}

pub fn intent_mut(app: &mut App, entity: Entity) -> Mut<'_, MovementIntent> {
    app.world_mut().get_mut::<MovementIntent>(entity).unwrap()
}

pub fn state_mut(app: &mut App, entity: Entity) -> Mut<'_, MovementState> {
    app.world_mut().get_mut::<MovementState>(entity).unwrap()
}

pub fn arena_mut(app: &mut App) -> Mut<'_, TestArena> {
    app.world_mut().resource_mut::<TestArena>()
}

/// Drain all controller events emitted since the last drain.
pub fn drain_events(app: &mut App) -> Vec<ControllerEvent> {
    app.world_mut()
        .resource_mut::<Events<ControllerEvent>>()
        .drain()
        .collect()
}

pub fn has_marker<T: Component>(app: &App, entity: Entity) -> bool {
    app.world().get::<T>(entity).is_some()
}
