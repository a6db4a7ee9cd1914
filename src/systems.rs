//! The controller tick: sensors, input arbitration, mode drivers,
//! integration and ground resolution.
//!
//! Most systems here are exclusive systems generic over the physics
//! backend. Each follows the same shape: snapshot the per-character inputs,
//! run the backend queries, then write results back and send events. The
//! systems are chained in [`crate::ControllerSet`] order; within one tick a
//! later system always sees the earlier systems' writes.

use bevy::math::FloatExt;
use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::buffers::ActionBuffers;
use crate::camera::CameraRig;
use crate::collision::CollisionData;
use crate::config::{ControllerConfig, JumpKinematics};
use crate::detection::{
    fan_offsets, probe_ground, wall_intent_is_climb, wall_ray_qualifies, SlopeContact, WallContact,
};
use crate::intent::MovementIntent;
use crate::modes::ModeProcesses;
use crate::smoothing::smooth_damp;
use crate::state::{
    Airborne, ControllerEvent, Grounded, MovementState, Sliding, WallClimbing, WallRunning,
};

/// Advance all buffer timers and pick up hot-reloaded windows.
pub fn tick_buffers<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let mut query = world.query::<(&ControllerConfig, &mut ActionBuffers)>();
    for (config, mut buffers) in query.iter_mut(world) {
        buffers.sync_windows(config);
        buffers.tick(dt);
    }
}

/// Cast the wall sensor fan and maintain wall contacts and wall modes.
///
/// Losing the wall force-ends a running wall mode on the same tick, so the
/// integration below sees gravity re-enabled immediately.
pub fn scan_walls<B: CharacterPhysicsBackend>(world: &mut World) {
    let mut query = world.query::<(
        Entity,
        &ControllerConfig,
        &Transform,
        &CameraRig,
        &MovementIntent,
        &ModeProcesses,
        &ActionBuffers,
    )>();
    let characters: Vec<(Entity, ControllerConfig, Quat, Quat, bool, bool, bool)> = query
        .iter(world)
        .map(|(entity, config, transform, rig, intent, modes, buffers)| {
            (
                entity,
                *config,
                transform.rotation,
                rig.camera_rotation(transform.rotation),
                intent.wall_ride_held,
                modes.wall_mode_active(),
                buffers.wall_run.is_elapsed(),
            )
        })
        .collect();

    let mut events = Vec::new();

    for (entity, config, body_rotation, camera_rotation, held, mode_active, reentry_ok) in
        characters
    {
        if !config.wall_run.enabled {
            continue;
        }

        let origin = B::get_position(world, entity);
        let forward = (body_rotation * Vec3::NEG_Z).with_y(0.0).normalize_or_zero();

        // Last qualifying hit wins.
        let mut hit: Option<CollisionData> = None;
        for offset in fan_offsets(config.wall_run.ray_count, config.wall_run.ray_spacing_deg) {
            let direction = Quat::from_rotation_y(offset.to_radians()) * forward;
            if let Some(candidate) = B::raycast(
                world,
                origin,
                direction,
                config.wall_run.ray_length,
                config.wall_run.mask,
                entity,
            ) {
                if wall_ray_qualifies(candidate.normal) {
                    hit = Some(candidate);
                }
            }
        }

        let was_connected = world
            .get::<WallContact>(entity)
            .map(|c| c.connected)
            .unwrap_or(false);

        match hit {
            Some(hit) => {
                if let Some(mut contact) = world.get_mut::<WallContact>(entity) {
                    contact.set_hit(&hit, camera_rotation);
                }
                if !was_connected {
                    // First contact opens the wall-jump window.
                    if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
                        buffers.wall_jump.reset();
                    }
                }

                if held && !mode_active && reentry_ok {
                    let climb = world
                        .get::<WallContact>(entity)
                        .map(|c| wall_intent_is_climb(c, config.wall_climb.climb_factor))
                        .unwrap_or(false);
                    if climb {
                        begin_wall_climb(world, entity, &mut events);
                    } else {
                        begin_wall_run(world, entity, &mut events);
                    }
                }
            }
            None => {
                if let Some(mut contact) = world.get_mut::<WallContact>(entity) {
                    contact.clear();
                }
                if mode_active {
                    end_wall_run(world, entity, &mut events);
                    end_wall_climb(world, entity, &mut events);
                }
            }
        }
    }

    for event in events {
        world.send_event(event);
    }
}

fn begin_wall_run(world: &mut World, entity: Entity, events: &mut Vec<ControllerEvent>) {
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.start_wall_run();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = false;
        state.gravity_enabled = false;
        state.velocity.y = 0.0;
    }
    debug!("wall run begin ({entity})");
    events.push(ControllerEvent::WallRunBegin(entity));
}

fn begin_wall_climb(world: &mut World, entity: Entity, events: &mut Vec<ControllerEvent>) {
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.start_wall_climb();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = false;
        state.gravity_enabled = false;
    }
    debug!("wall climb begin ({entity})");
    events.push(ControllerEvent::WallClimbBegin(entity));
}

fn end_wall_run(world: &mut World, entity: Entity, events: &mut Vec<ControllerEvent>) {
    let was_active = world
        .get::<ModeProcesses>(entity)
        .map(|m| m.wall_run.active)
        .unwrap_or(false);
    if !was_active {
        return;
    }
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.stop_wall_run();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = true;
        state.gravity_enabled = true;
        state.wall_run_speed = 0.0;
    }
    if let Some(mut rig) = world.get_mut::<CameraRig>(entity) {
        rig.tilt_target = Quat::IDENTITY;
    }
    // Exiting a wall mode starts the reentry cooldown.
    if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
        buffers.wall_run.reset();
    }
    debug!("wall run end ({entity})");
    events.push(ControllerEvent::WallRunEnd(entity));
}

fn end_wall_climb(world: &mut World, entity: Entity, events: &mut Vec<ControllerEvent>) {
    let was_active = world
        .get::<ModeProcesses>(entity)
        .map(|m| m.wall_climb.active)
        .unwrap_or(false);
    if !was_active {
        return;
    }
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.stop_wall_climb();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = true;
        state.gravity_enabled = true;
        state.wall_climb_speed = 0.0;
    }
    if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
        buffers.wall_run.reset();
    }
    debug!("wall climb end ({entity})");
    events.push(ControllerEvent::WallClimbEnd(entity));
}

/// Resolve this tick's input edges: respawn, wall release, crouch toggle and
/// the jump priority chain.
pub fn arbitrate_input<B: CharacterPhysicsBackend>(world: &mut World) {
    let mut query = world.query::<(Entity, &MovementIntent)>();
    let characters: Vec<(Entity, MovementIntent)> = query
        .iter(world)
        .map(|(entity, intent)| (entity, *intent))
        .collect();

    let mut events = Vec::new();

    for (entity, intent) in characters {
        let respawn = world
            .get::<MovementState>(entity)
            .map(|s| s.respawn_requested)
            .unwrap_or(false);
        if respawn {
            respawn_reset::<B>(world, entity, &mut events);
            continue;
        }

        if intent.wall_ride_up {
            end_wall_run(world, entity, &mut events);
            end_wall_climb(world, entity, &mut events);
        }

        if intent.crouch_down {
            toggle_crouch(world, entity);
        }

        if intent.jump_down {
            handle_jump_press(world, entity, &mut events);
        }

        if intent.jump_up {
            clamp_jump_release(world, entity);
        }
    }

    for event in events {
        world.send_event(event);
    }
}

/// Reset all controller state in place. Positioning the character is the
/// caller's business, usually a `seek_to` issued alongside the request.
fn respawn_reset<B: CharacterPhysicsBackend>(
    world: &mut World,
    entity: Entity,
    events: &mut Vec<ControllerEvent>,
) {
    let config = world.get::<ControllerConfig>(entity).copied();

    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        *modes = ModeProcesses::default();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        *state = MovementState::default();
    }
    if let Some(mut contact) = world.get_mut::<WallContact>(entity) {
        contact.clear();
    }
    if let Some(mut rig) = world.get_mut::<CameraRig>(entity) {
        rig.tilt_target = Quat::IDENTITY;
        rig.reset();
    }
    if let Some(config) = config {
        if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
            *buffers = ActionBuffers::new(&config);
        }
        B::set_capsule_height(world, entity, config.crouch_slide.stand_height);
    }
    info!("respawn ({entity})");
    events.push(ControllerEvent::Respawn(entity));
}

fn toggle_crouch(world: &mut World, entity: Entity) {
    let Some(config) = world.get::<ControllerConfig>(entity).copied() else {
        return;
    };
    if !config.crouch_slide.enabled {
        return;
    }

    let (crouched, grounded) = match world.get::<MovementState>(entity) {
        Some(state) => (state.is_crouched, state.grounded),
        None => return,
    };
    let on_slope = world
        .get::<SlopeContact>(entity)
        .map(|s| s.on_slope)
        .unwrap_or(false);
    let forward = world
        .get::<Transform>(entity)
        .map(|t| (*t.forward()).with_y(0.0).normalize_or_zero())
        .unwrap_or(Vec3::NEG_Z);

    if !crouched {
        if let Some(mut state) = world.get_mut::<MovementState>(entity) {
            state.is_crouched = true;
        }
        if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
            modes.start_crouch(
                config.crouch_slide.stand_height,
                config.crouch_slide.crouch_height,
                true,
            );
        }
        if grounded || on_slope {
            try_start_slide(world, entity, forward);
        }
    } else {
        if let Some(mut state) = world.get_mut::<MovementState>(entity) {
            state.is_crouched = false;
        }
        let sliding = world
            .get::<ModeProcesses>(entity)
            .map(|m| m.slide.active)
            .unwrap_or(false);
        if sliding {
            stop_slide(world, entity);
        }
        if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
            modes.start_crouch(
                config.crouch_slide.crouch_height,
                config.crouch_slide.stand_height,
                false,
            );
        }
    }
}

fn try_start_slide(world: &mut World, entity: Entity, direction: Vec3) {
    let enabled = world
        .get::<ControllerConfig>(entity)
        .map(|c| c.crouch_slide.enabled)
        .unwrap_or(false);
    let already = world
        .get::<ModeProcesses>(entity)
        .map(|m| m.slide.active)
        .unwrap_or(true);
    // A slide needs forward momentum intent.
    let moving_forward = world
        .get::<MovementIntent>(entity)
        .map(|i| i.movement.y > 0.0)
        .unwrap_or(false);
    if !enabled || already || !moving_forward || direction == Vec3::ZERO {
        return;
    }
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.start_slide(direction);
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = false;
    }
    debug!("slide begin ({entity})");
}

fn stop_slide(world: &mut World, entity: Entity) {
    if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
        modes.stop_slide();
    }
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.movement_enabled = true;
        state.slide_speed = 0.0;
        state.slide_angle_boost = 0.0;
    }
}

/// The jump priority chain: wall jump, coyote jump, climb-exit jump,
/// run-exit jump, grounded jump. Every press arms the jump buffer up
/// front, so a press with nothing to act on fires on the next landing.
fn handle_jump_press(world: &mut World, entity: Entity, events: &mut Vec<ControllerEvent>) {
    let Some(config) = world.get::<ControllerConfig>(entity).copied() else {
        return;
    };
    let contact = world.get::<WallContact>(entity).copied().unwrap_or_default();
    let (climbing, running) = world
        .get::<ModeProcesses>(entity)
        .map(|m| (m.wall_climb.active, m.wall_run.active))
        .unwrap_or((false, false));
    let (grounded, descending) = world
        .get::<MovementState>(entity)
        .map(|s| (s.grounded, s.velocity.y <= 0.0))
        .unwrap_or((false, true));

    // Every press restarts the jump buffer so a jump shortly before
    // touchdown rolls over into a landing jump.
    if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
        buffers.jump.reset();
    }

    // Wall jump off a recent wall contact; a live wall run keeps its own
    // exit jump instead.
    let wall_jump = !running
        && world
            .get_mut::<ActionBuffers>(entity)
            .map(|mut b| b.wall_jump.consume_if_buffered())
            .unwrap_or(false);
    if wall_jump {
        end_wall_climb(world, entity, events);
        apply_wall_jump(
            world,
            entity,
            contact.normal,
            config.wall_run.wall_jump_velocity,
        );
        events.push(ControllerEvent::WallJump(entity));
        return;
    }

    // Coyote jump off a recently left ledge, while still falling.
    let coyote = !grounded
        && descending
        && world
            .get_mut::<ActionBuffers>(entity)
            .map(|mut b| b.grace.consume_if_buffered())
            .unwrap_or(false);
    if coyote {
        jump_max_velocity(world, entity, &config);
        events.push(ControllerEvent::Jump(entity));
        return;
    }

    if climbing {
        end_wall_climb(world, entity, events);
        apply_wall_jump(world, entity, contact.normal, config.wall_climb.jump_velocity);
        events.push(ControllerEvent::WallClimbJump(entity));
        return;
    }

    if running {
        end_wall_run(world, entity, events);
        apply_wall_jump(world, entity, contact.normal, config.wall_run.jump_velocity);
        events.push(ControllerEvent::WallRunJump(entity));
        return;
    }

    if grounded {
        jump_max_velocity(world, entity, &config);
        events.push(ControllerEvent::Jump(entity));
    }
}

/// Kick off a ground/coyote jump at full takeoff velocity. Stands the
/// character up first if it was crouched.
fn jump_max_velocity(world: &mut World, entity: Entity, config: &ControllerConfig) {
    let crouched = world
        .get::<MovementState>(entity)
        .map(|s| s.is_crouched)
        .unwrap_or(false);
    if crouched {
        let sliding = world
            .get::<ModeProcesses>(entity)
            .map(|m| m.slide.active)
            .unwrap_or(false);
        if sliding {
            stop_slide(world, entity);
        }
        if let Some(mut modes) = world.get_mut::<ModeProcesses>(entity) {
            modes.start_crouch(
                config.crouch_slide.crouch_height,
                config.crouch_slide.stand_height,
                false,
            );
        }
    }

    let kin = JumpKinematics::derive(&config.jumping);
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        if crouched {
            state.is_crouched = false;
        }
        state.velocity.y = kin.max_jump_velocity;
        state.has_jumped = true;
        state.is_landed = false;
        state.grounded = false;
    }
}

/// Jump away from a wall: horizontal components are pushed along the wall
/// normal, vertical goes straight up.
fn apply_wall_jump(world: &mut World, entity: Entity, normal: Vec3, impulse: Vec3) {
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        state.velocity = Vec3::new(normal.x * impulse.x, impulse.y, normal.z * impulse.z);
        state.has_jumped = true;
        state.is_landed = false;
        state.grounded = false;
    }
}

/// Variable jump height: releasing jump during the ascent clamps the
/// remaining rise to the minimum jump.
fn clamp_jump_release(world: &mut World, entity: Entity) {
    let Some(config) = world.get::<ControllerConfig>(entity).copied() else {
        return;
    };
    let kin = JumpKinematics::derive(&config.jumping);
    if let Some(mut state) = world.get_mut::<MovementState>(entity) {
        if state.has_jumped && state.velocity.y > kin.min_jump_velocity {
            state.velocity.y = kin.min_jump_velocity;
        }
    }
}

/// Drive the active mode processes: crouch height transition, slide,
/// wall-run and wall-climb velocity and ramps.
pub fn drive_modes<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let mut capsule_updates = Vec::new();

    let mut query = world.query::<(
        Entity,
        &ControllerConfig,
        &Transform,
        &MovementIntent,
        &WallContact,
        &SlopeContact,
        &mut ModeProcesses,
        &mut MovementState,
        &mut CameraRig,
    )>();

    for (entity, config, transform, intent, wall, slope, mut modes, mut state, mut rig) in
        query.iter_mut(world)
    {
        state.current_speed = config.base.base_speed
            + state.wall_run_speed
            + state.wall_climb_speed
            + state.slide_speed
            + state.slide_angle_boost
            + state.speed_boost;

        if modes.crouch.active {
            modes.crouch.elapsed += dt;
            let t = if config.crouch_slide.crouch_time > 0.0 {
                (modes.crouch.elapsed / config.crouch_slide.crouch_time).clamp(0.0, 1.0)
            } else {
                1.0
            };
            let height = modes.crouch.from_height.lerp(modes.crouch.to_height, t);
            capsule_updates.push((entity, height));
            if t >= 1.0 {
                modes.stop_crouch();
            }
        }

        if modes.slide.active {
            drive_slide(config, intent, slope, &mut modes, &mut state, dt);
        }

        if modes.wall_run.active {
            modes.wall_run.elapsed += dt;
            let t = if config.wall_run.speed_up_time > 0.0 {
                modes.wall_run.elapsed / config.wall_run.speed_up_time
            } else {
                1.0
            };
            state.wall_run_speed =
                config.wall_run.speed_curve.evaluate(t) * config.wall_run.max_speed;

            // Run direction is the horizontal wall tangent, signed by which
            // way the camera faces along the wall, plus a body-right push
            // that keeps the runner pressed against the wall.
            let tangent = Vec3::Y.cross(wall.normal).normalize_or_zero();
            let right = (transform.rotation * Vec3::X).with_y(0.0).normalize_or_zero();
            let run = tangent * (-wall.facing.y) * state.current_speed
                + right * wall.facing.y * state.current_speed;
            state.velocity.x = run.x;
            state.velocity.z = run.z;
            state.velocity.y = 0.0;

            let roll = (-config.wall_run.max_tilt_deg)
                .lerp(config.wall_run.max_tilt_deg, wall.facing.y.clamp(0.0, 1.0))
                .to_radians();
            rig.tilt_target = Quat::from_rotation_z(roll);
        }

        if modes.wall_climb.active {
            modes.wall_climb.elapsed += dt;
            let t = if config.wall_climb.speed_up_time > 0.0 {
                modes.wall_climb.elapsed / config.wall_climb.speed_up_time
            } else {
                1.0
            };
            state.wall_climb_speed =
                config.wall_climb.speed_curve.evaluate(t) * config.wall_climb.max_speed;

            // Looking up the wall climbs, looking down slides back down.
            state.velocity = Vec3::new(0.0, wall.facing_local.x * state.current_speed, 0.0);
        }
    }

    for (entity, height) in capsule_updates {
        B::set_capsule_height(world, entity, height);
    }
}

/// One slide tick. On a slope the timer holds at zero and the character
/// accelerates downhill with lateral steering; off-slope the slide runs on
/// a fixed direction until the timer expires.
fn drive_slide(
    config: &ControllerConfig,
    intent: &MovementIntent,
    slope: &SlopeContact,
    modes: &mut ModeProcesses,
    state: &mut MovementState,
    dt: f32,
) {
    let settings = &config.crouch_slide;

    // Timed out. The character stays crouched; standing is a separate toggle.
    if modes.slide.elapsed >= settings.slide_time {
        modes.stop_slide();
        state.movement_enabled = true;
        state.slide_speed = 0.0;
        state.slide_angle_boost = 0.0;
        return;
    }

    if slope.on_slope {
        modes.slide.elapsed = 0.0;
        modes.slide.has_been_on_slope = true;

        let downhill = Vec3::new(slope.normal.x, 0.0, slope.normal.z).normalize_or_zero();
        if downhill != Vec3::ZERO {
            modes.slide.direction = downhill;
        }

        // Downhill boost scales per axis with how far the normal leans.
        let tolerance = config.base.slope_tolerance.max(1e-4);
        let axis_boost = |n: f32| {
            if n.abs() < 1e-5 {
                0.0
            } else {
                settings
                    .angle_boost_min
                    .lerp(settings.angle_boost_max, (n.abs() / tolerance).clamp(0.0, 1.0))
                    * n.signum()
            }
        };
        let boost = Vec3::new(axis_boost(slope.normal.x), 0.0, axis_boost(slope.normal.z));
        state.slide_angle_boost = boost.length();

        let lateral = Vec3::Y.cross(modes.slide.direction).normalize_or_zero();
        let shift_target = intent.movement.x * settings.side_shift_max_speed;
        modes.slide.side_shift_velocity = smooth_damp(
            modes.slide.side_shift_velocity,
            shift_target,
            &mut modes.slide.side_shift_smoothing,
            settings.side_shift_accel_time,
            dt,
        );

        let target = boost + lateral * modes.slide.side_shift_velocity;
        state.velocity.x = smooth_damp(
            state.velocity.x,
            target.x,
            &mut modes.slide.slide_smoothing.x,
            config.base.slope_slide_acceleration_time,
            dt,
        );
        state.velocity.z = smooth_damp(
            state.velocity.z,
            target.z,
            &mut modes.slide.slide_smoothing.z,
            config.base.slope_slide_acceleration_time,
            dt,
        );
        state.slide_speed = 0.0;
    } else {
        modes.slide.elapsed += dt;
        state.slide_speed = settings.slide_speed;
        let horizontal = modes.slide.direction * settings.slide_speed;
        state.velocity.x = horizontal.x;
        state.velocity.z = horizontal.z;
    }
}

/// Integrate gravity and intent, then move the capsule.
pub fn integrate_and_move<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);
    let mut query = world.query::<(Entity, &ControllerConfig, &Transform, &MovementIntent)>();
    let characters: Vec<(Entity, ControllerConfig, Quat, Vec2)> = query
        .iter(world)
        .map(|(entity, config, transform, intent)| {
            (entity, *config, transform.rotation, intent.movement)
        })
        .collect();

    for (entity, config, rotation, movement) in characters {
        let Some(mut state) = world.get::<MovementState>(entity).copied() else {
            continue;
        };

        if state.gravity_enabled {
            let kin = JumpKinematics::derive(&config.jumping);
            state.velocity.y += kin.gravity * dt;
        }

        if state.movement_enabled {
            let forward = (rotation * Vec3::NEG_Z).with_y(0.0).normalize_or_zero();
            let right = (rotation * Vec3::X).with_y(0.0).normalize_or_zero();
            let wish = (forward * movement.y + right * movement.x).clamp_length_max(1.0);
            let target = wish * state.current_speed;

            state.velocity.x = smooth_damp(
                state.velocity.x,
                target.x,
                &mut state.velocity_smoothing.x,
                config.base.acceleration_time,
                dt,
            );
            state.velocity.z = smooth_damp(
                state.velocity.z,
                target.z,
                &mut state.velocity_smoothing.z,
                config.base.acceleration_time,
                dt,
            );
        }

        // A pending teleport overrides everything so this tick's move lands
        // exactly on the target.
        let seeking = state.pending_seek.is_some();
        if let Some(target) = state.pending_seek.take() {
            let position = B::get_position(world, entity);
            state.velocity = (target - position) / dt;
            state.velocity_smoothing = Vec3::ZERO;
        }

        let delta = state.velocity * dt;
        if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
            *stored = state;
        }

        let output = B::move_capsule(world, entity, delta);
        if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
            stored.grounded = output.grounded;
            if seeking {
                stored.velocity = Vec3::ZERO;
            }
        }
    }
}

/// Resolve ground contact after the move: slope bias and snapping, landing,
/// and off-ledge detection.
pub fn post_move_ground<B: CharacterPhysicsBackend>(world: &mut World) {
    let mut query = world.query::<(Entity, &ControllerConfig)>();
    let characters: Vec<(Entity, ControllerConfig)> = query
        .iter(world)
        .map(|(entity, config)| (entity, *config))
        .collect();

    let mut events = Vec::new();

    for (entity, config) in characters {
        let probe = probe_ground::<B>(world, entity);

        if let Some(mut slope) = world.get_mut::<SlopeContact>(entity) {
            match &probe {
                Some(hit) => slope.set_hit(hit.normal),
                None => slope.clear(),
            }
        }

        let Some(state) = world.get::<MovementState>(entity).copied() else {
            continue;
        };
        let wall_mode = world
            .get::<ModeProcesses>(entity)
            .map(|m| m.wall_mode_active())
            .unwrap_or(false);
        let slope = world.get::<SlopeContact>(entity).copied().unwrap_or_default();

        // Slope resolution: pin the capsule to inclines while descending and
        // bias velocity downhill past the walkable limit.
        if !wall_mode && state.velocity.y <= 0.0 && !state.has_jumped {
            if let Some(hit) = &probe {
                if slope.on_slope {
                    if slope.angle_deg > config.base.slope_limit_deg {
                        let bias = (1.0 - slope.normal.y) * config.base.slope_friction;
                        if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
                            stored.velocity.x += slope.normal.x * bias;
                            stored.velocity.z += slope.normal.z * bias;
                        }
                    }
                    let snap = B::move_capsule(world, entity, Vec3::NEG_Y * hit.distance);
                    if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
                        stored.grounded = snap.grounded;
                    }
                }
            }
        }

        let Some(state) = world.get::<MovementState>(entity).copied() else {
            continue;
        };

        if state.grounded && !slope.on_slope && state.velocity.y < 0.0 {
            if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
                stored.velocity.y = 0.0;
            }
        }

        if state.grounded && !state.is_landed {
            on_landed(world, entity, &config, &mut events);
        } else if !state.grounded && state.is_landed {
            // Just left the ground. Walking off a ledge opens the coyote
            // window; jumping does not.
            let jumped = state.has_jumped;
            if let Some(mut stored) = world.get_mut::<MovementState>(entity) {
                stored.is_landed = false;
                stored.off_ledge = !jumped;
            }
            if !jumped {
                if let Some(mut buffers) = world.get_mut::<ActionBuffers>(entity) {
                    buffers.grace.reset();
                }
            }
        }
    }

    for event in events {
        world.send_event(event);
    }
}

/// Touchdown bookkeeping. Landing while crouched rolls straight into a
/// slide with no landing event; otherwise a buffered jump press fires
/// immediately.
fn on_landed(
    world: &mut World,
    entity: Entity,
    config: &ControllerConfig,
    events: &mut Vec<ControllerEvent>,
) {
    let forward = world
        .get::<Transform>(entity)
        .map(|t| (*t.forward()).with_y(0.0).normalize_or_zero())
        .unwrap_or(Vec3::NEG_Z);

    let crouched = {
        let Some(mut state) = world.get_mut::<MovementState>(entity) else {
            return;
        };
        state.is_landed = true;
        state.has_jumped = false;
        state.off_ledge = false;
        state.is_crouched
    };

    if crouched {
        try_start_slide(world, entity, forward);
        return;
    }

    let buffered = world
        .get_mut::<ActionBuffers>(entity)
        .map(|mut b| b.jump.consume_if_buffered())
        .unwrap_or(false);
    if buffered {
        jump_max_velocity(world, entity, config);
        events.push(ControllerEvent::Jump(entity));
    }

    debug!("landed ({entity})");
    events.push(ControllerEvent::Landed(entity));
}

/// Apply look input to the body yaw and camera pitch, and ease the wall-run
/// tilt toward its target.
pub fn drive_camera(world: &mut World) {
    let mut query = world.query::<(
        &ControllerConfig,
        &MovementIntent,
        &mut Transform,
        &mut CameraRig,
    )>();
    let mut camera_writes = Vec::new();

    for (config, intent, mut transform, mut rig) in query.iter_mut(world) {
        let look = intent.look * config.camera.sensitivity;
        if look.x != 0.0 {
            transform.rotate_y(-look.x.to_radians());
        }

        let invert = if config.camera.inverted { 1.0 } else { -1.0 };
        let pitch_delta = look.y * invert;
        if pitch_delta != 0.0 {
            rig.apply_pitch(pitch_delta, config.camera.max_angle_deg);
        }

        rig.tilt = rig.tilt.slerp(rig.tilt_target, config.wall_run.tilt_speed);

        if let Some(camera) = rig.camera {
            let local = Quat::from_rotation_x(rig.pitch_up_deg().to_radians()) * rig.tilt;
            camera_writes.push((camera, local));
        }
    }

    for (camera, rotation) in camera_writes {
        if let Some(mut transform) = world.get_mut::<Transform>(camera) {
            transform.rotation = rotation;
        }
    }
}

/// Mirror the internal state onto the public marker components.
pub fn sync_state_markers(
    mut commands: Commands,
    query: Query<(
        Entity,
        &MovementState,
        &ModeProcesses,
        Has<Grounded>,
        Has<Airborne>,
        Has<Sliding>,
        Has<WallRunning>,
        Has<WallClimbing>,
    )>,
) {
    for (entity, state, modes, grounded, airborne, sliding, running, climbing) in &query {
        let mut entity_commands = commands.entity(entity);

        if state.grounded && !grounded {
            entity_commands.insert(Grounded);
        } else if !state.grounded && grounded {
            entity_commands.remove::<Grounded>();
        }

        let is_airborne = !state.grounded && !modes.wall_mode_active();
        if is_airborne && !airborne {
            entity_commands.insert(Airborne);
        } else if !is_airborne && airborne {
            entity_commands.remove::<Airborne>();
        }

        if modes.slide.active && !sliding {
            entity_commands.insert(Sliding);
        } else if !modes.slide.active && sliding {
            entity_commands.remove::<Sliding>();
        }

        if modes.wall_run.active && !running {
            entity_commands.insert(WallRunning);
        } else if !modes.wall_run.active && running {
            entity_commands.remove::<WallRunning>();
        }

        if modes.wall_climb.active && !climbing {
            entity_commands.insert(WallClimbing);
        } else if !modes.wall_climb.active && climbing {
            entity_commands.remove::<WallClimbing>();
        }
    }
}

/// Drop this tick's edge-triggered input.
pub fn clear_input_edges(mut query: Query<&mut MovementIntent>) {
    for mut intent in &mut query {
        intent.clear_edges();
    }
}
