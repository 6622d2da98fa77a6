//! Slide mode.
//!
//! A slide keeps the character glued to the surface below with a strong
//! downward force, lets input only steer sideways and bleeds speed through
//! its own friction and braking. It ends when crouch is released, when the
//! surface disappears or when speed drops under the slide minimum.

use glam::Vec3;
use slipstride_physics::{IgnoreSet, LocomotionEngine, SurfaceHit, VelocityParams, MIN_TICK_TIME};

use crate::config::MovementConfig;
use crate::events::MovementEvents;
use crate::frame::{body_right, horizontal, rotation_from_forward_up};
use crate::machine::{phys_walking, set_mode, TickContext, TickInput};
use crate::mode::MovementMode;
use crate::state::MovementState;

/// Steering input must be at least this aligned (cosine) with the body's
/// right axis to count.
const STEER_ALIGNMENT: f32 = 0.5;

/// Starting needs more than the minimum speed.
fn fast_enough(config: &MovementConfig, state: &MovementState) -> bool {
    state.velocity().length_squared() > config.slide_min_speed * config.slide_min_speed
}

/// A running slide keeps going down to exactly the minimum speed.
fn too_slow(config: &MovementConfig, state: &MovementState) -> bool {
    state.velocity().length_squared() < config.slide_min_speed * config.slide_min_speed
}

fn slide_floor_below<E>(config: &MovementConfig, state: &MovementState, engine: &E, ignore: &IgnoreSet) -> bool
where
    E: LocomotionEngine + ?Sized,
{
    let reach = config.capsule.half_height * config.slide_probe_scale;
    engine.probe_down(state.position(), reach, ignore).is_some()
}

/// Whether a slide may start: a surface close below and enough speed.
pub fn can_slide<E>(config: &MovementConfig, state: &MovementState, engine: &E, ignore: &IgnoreSet) -> bool
where
    E: LocomotionEngine + ?Sized,
{
    slide_floor_below(config, state, engine, ignore) && fast_enough(config, state)
}

fn can_keep_sliding<E>(config: &MovementConfig, state: &MovementState, engine: &E, ignore: &IgnoreSet) -> bool
where
    E: LocomotionEngine + ?Sized,
{
    slide_floor_below(config, state, engine, ignore) && !too_slow(config, state)
}

/// The surface being slid on.
pub fn slide_surface<E>(
    config: &MovementConfig,
    state: &MovementState,
    engine: &E,
    ignore: &IgnoreSet,
) -> Option<SurfaceHit>
where
    E: LocomotionEngine + ?Sized,
{
    let reach = config.capsule.half_height * config.slide_surface_probe_scale;
    engine.probe_down(state.position(), reach, ignore)
}

/// Slide entry: crouch, push along the horizontal direction of travel and
/// refresh the floor.
pub(crate) fn enter_slide<E>(config: &MovementConfig, state: &mut MovementState, engine: &E, ignore: &IgnoreSet)
where
    E: LocomotionEngine + ?Sized,
{
    state.wants_crouch = true;
    state.body.velocity += horizontal(state.velocity()).normalize_or_zero() * config.slide_enter_impulse;
    state.floor = engine.find_floor(state.position(), config.capsule, ignore);
}

/// Slide exit: stand up, and stop if configured to.
pub(crate) fn exit_slide(config: &MovementConfig, state: &mut MovementState) {
    state.wants_crouch = false;
    if config.slide_reset_velocity {
        state.body.velocity = Vec3::ZERO;
    }
}

/// Run one tick of slide physics.
pub(crate) fn phys_slide<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    input: &TickInput,
    engine: &E,
    ignore: &IgnoreSet,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    let config = ctx.config;
    let dt = input.delta_time;
    if dt < MIN_TICK_TIME {
        return;
    }

    if !can_keep_sliding(config, state, engine, ignore) {
        set_mode(ctx, state, MovementMode::Ground, engine, ignore, events);
        phys_walking(ctx, state, input, engine, ignore, events);
        return;
    }

    let mut velocity = state.velocity();
    state.root_motion.restore_pre_additive(&mut velocity);
    state.body.velocity = velocity;

    // Lost the surface or too slow: stand up; the mode changes next tick
    let surface = match slide_surface(config, state, engine, ignore) {
        Some(surface) if !too_slow(config, state) => surface,
        _ => {
            log::trace!("character {} slide ran out before moving", ctx.character);
            exit_slide(config, state);
            return;
        }
    };

    velocity += Vec3::NEG_Y * config.slide_gravity * dt;

    let right = body_right(state.body.rotation);
    let steering = if input.acceleration.normalize_or_zero().dot(right).abs() > STEER_ALIGNMENT {
        input.acceleration.project_onto(right)
    } else {
        Vec3::ZERO
    };

    if !state.root_motion.is_active() {
        let params = VelocityParams {
            friction: config.slide_friction,
            braking_deceleration: config.max_braking_deceleration(MovementMode::Slide),
            max_speed: config.max_speed(MovementMode::Slide, state.wants_sprint, state.crouched),
        };
        velocity = engine.calc_velocity(velocity, steering, dt, &params);
    }

    state.root_motion.apply(&mut velocity);
    state.body.velocity = velocity;

    state.teleported = false;
    let old_position = state.position();
    let delta = velocity * dt;
    let along_surface = velocity - surface.normal * velocity.dot(surface.normal);
    let rotation = rotation_from_forward_up(along_surface, surface.normal).unwrap_or(state.body.rotation);

    if let Some(hit) = engine.sweep_move(&mut state.body, delta, rotation, config.capsule, ignore) {
        if hit.started_penetrating {
            state.teleported = true;
        }
        engine.handle_impact(&hit);
        engine.slide_along_surface(
            &mut state.body,
            delta,
            1.0 - hit.time,
            hit.normal,
            config.capsule,
            ignore,
        );
    }

    state.floor = engine.find_floor(state.position(), config.capsule, ignore);
    if slide_surface(config, state, engine, ignore).is_none() || too_slow(config, state) {
        exit_slide(config, state);
    }

    if !state.teleported && !state.root_motion.is_active() {
        state.body.velocity = (state.position() - old_position) / dt;
    }
}
