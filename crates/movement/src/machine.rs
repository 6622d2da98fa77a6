//! Movement mode state machine.
//!
//! One tick clamps input acceleration to the configured maximum, then runs,
//! in order:
//!
//! 1. Body yaw follows the controller (except while sliding)
//! 2. Slide entry and crouch-release exit
//! 3. Authority guard and dash
//! 4. Crouch state update
//! 5. Mode physics: walking, falling or sliding
//! 6. Previous-crouch bookkeeping
//!
//! [`simulate_tick`] is a pure function of the state, the tick input and
//! the (immutable) engine. The same inputs always yield the same state,
//! which is what lets the predicting peer, the authority and the replay
//! after a correction agree.

use glam::Vec3;
use slipstride_physics::{IgnoreSet, LocomotionEngine, StepOutcome, VelocityParams};

use crate::character::{CharacterHooks, CharacterId, Role};
use crate::config::MovementConfig;
use crate::dash;
use crate::events::{MovementEvents, NoEvents};
use crate::frame::yaw_rotation;
use crate::guard::{evaluate_dash, DashVerdict};
use crate::history::MoveRecord;
use crate::mode::MovementMode;
use crate::slide;
use crate::state::MovementState;

/// Everything a tick needs besides the state and the engine.
#[derive(Clone, Copy)]
pub struct TickContext<'a> {
    pub character: CharacterId,
    pub config: &'a MovementConfig,
    pub hooks: &'a dyn CharacterHooks,
    pub role: Role,
    /// Simulation time of this tick (seconds).
    pub now: f64,
}

impl<'a> TickContext<'a> {
    /// Same context at a different time.
    pub fn at(self, now: f64) -> Self {
        Self { now, ..self }
    }
}

/// Per-tick input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickInput {
    /// Tick length (seconds).
    pub delta_time: f32,
    /// Input acceleration (cm/s²).
    pub acceleration: Vec3,
    /// Controller yaw (degrees).
    pub control_yaw: f32,
}

/// Whether sprinting may start now.
pub fn is_sprinting_allowed(
    config: &MovementConfig,
    state: &MovementState,
    hooks: &dyn CharacterHooks,
) -> bool {
    !state.crouched
        && !state.is_falling()
        && !state.is_sliding()
        && state.is_moving_on_ground()
        && state.velocity().length_squared() >= config.sprint_min_speed * config.sprint_min_speed
        && !state.wants_sprint
        && hooks.can_sprint()
}

/// Commit a recorded move's intent and simulate it.
///
/// The authority re-checks sprint for characters it does not control;
/// every other role trusts the record.
pub fn apply_move<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    record: &MoveRecord,
    engine: &E,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    if ctx.role.is_remote_authority() {
        let allowed = is_sprinting_allowed(ctx.config, state, ctx.hooks);
        record.intent.apply_verified(state, allowed);
    } else {
        record.intent.apply_trusted(state);
    }

    simulate_tick(ctx, state, &record.input(), engine, events);
}

/// Re-run recorded moves on top of `state` without raising events.
///
/// Each record runs at its own timestamp so cooldowns see the same clock
/// they saw the first time.
pub fn replay<'r, E, I>(ctx: &TickContext<'_>, state: &mut MovementState, records: I, engine: &E) -> usize
where
    E: LocomotionEngine + ?Sized,
    I: IntoIterator<Item = &'r MoveRecord>,
{
    let mut replayed = 0;
    for record in records {
        apply_move(&ctx.at(record.timestamp), state, record, engine, &mut NoEvents);
        replayed += 1;
    }
    replayed
}

/// Simulate one tick.
pub fn simulate_tick<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    input: &TickInput,
    engine: &E,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    let ignore = ctx.hooks.ignored_actors();
    let input = &TickInput {
        acceleration: input.acceleration.clamp_length_max(ctx.config.max_acceleration),
        ..*input
    };

    state.control_yaw = input.control_yaw;
    if !state.is_sliding() {
        state.body.rotation = yaw_rotation(input.control_yaw);
    }

    update_before_movement(ctx, state, input.acceleration, engine, &ignore, events);

    state.crouched = state.wants_crouch && state.is_moving_on_ground();

    run_physics(ctx, state, input, engine, &ignore, events);

    state.prev_wants_crouch = state.wants_crouch;
    state.teleported = false;
}

fn update_before_movement<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    acceleration: Vec3,
    engine: &E,
    ignore: &IgnoreSet,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    if state.mode == MovementMode::Ground
        && !state.wants_crouch
        && state.wants_slide
        && slide::can_slide(ctx.config, state, engine, ignore)
    {
        set_mode(ctx, state, MovementMode::Slide, engine, ignore, events);
    }

    if state.mode == MovementMode::Slide && !state.wants_crouch {
        set_mode(ctx, state, MovementMode::Ground, engine, ignore, events);
    }

    let can_dash = dash::can_dash(state, ctx.hooks);
    let verdict = evaluate_dash(
        ctx.character,
        ctx.role,
        state.wants_dash,
        can_dash,
        &state.dash_cooldown,
        ctx.config.dash_authority_cooldown,
        ctx.now,
    );

    match verdict {
        DashVerdict::Idle => {}
        DashVerdict::Cleared | DashVerdict::Rejected => state.wants_dash = false,
        DashVerdict::Perform => {
            dash::perform_dash(ctx, state, acceleration, engine, ignore, events);
            state.wants_dash = false;
            state.dash_toggle = !state.dash_toggle;
        }
    }
}

fn run_physics<E, V>(
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
    match state.mode {
        MovementMode::Ground => phys_walking(ctx, state, input, engine, ignore, events),
        MovementMode::Falling => phys_falling(ctx, state, input, engine, ignore, events),
        MovementMode::Slide => slide::phys_slide(ctx, state, input, engine, ignore, events),
    }
}

/// Switch modes, running slide entry/exit and raising their events.
pub(crate) fn set_mode<E, V>(
    ctx: &TickContext<'_>,
    state: &mut MovementState,
    mode: MovementMode,
    engine: &E,
    ignore: &IgnoreSet,
    events: &mut V,
) where
    E: LocomotionEngine + ?Sized,
    V: MovementEvents + ?Sized,
{
    let previous = state.mode;
    if previous == mode {
        return;
    }

    log::trace!("character {} {previous} -> {mode}", ctx.character);
    state.mode = mode;

    if previous == MovementMode::Slide {
        slide::exit_slide(ctx.config, state);
        events.left_slide(previous);
    }

    if mode == MovementMode::Slide {
        slide::enter_slide(ctx.config, state, engine, ignore);
        events.entered_slide(previous);
    }
}

/// Walking via the engine's stock stepper.
pub(crate) fn phys_walking<E, V>(
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
    let params = VelocityParams {
        friction: config.ground_friction,
        braking_deceleration: config.max_braking_deceleration(MovementMode::Ground),
        max_speed: config.max_speed(MovementMode::Ground, state.wants_sprint, state.crouched),
    };

    let outcome = engine.step_walking(
        &mut state.body,
        input.acceleration,
        input.delta_time,
        &params,
        config.capsule,
        ignore,
    );

    if outcome == StepOutcome::Airborne {
        set_mode(ctx, state, MovementMode::Falling, engine, ignore, events);
    }
}

/// Falling via the engine's stock stepper.
fn phys_falling<E, V>(
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
    let params = VelocityParams {
        friction: 0.0,
        braking_deceleration: config.max_braking_deceleration(MovementMode::Falling),
        max_speed: config.max_speed(MovementMode::Falling, state.wants_sprint, state.crouched),
    };

    let outcome = engine.step_falling(
        &mut state.body,
        input.acceleration,
        input.delta_time,
        &params,
        config.capsule,
        ignore,
    );

    if outcome == StepOutcome::Grounded {
        set_mode(ctx, state, MovementMode::Ground, engine, ignore, events);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterBody;
    use crate::events::{DashDirection, MovementEvent};
    use slipstride_physics::{CollisionWorld, ContentFlags, EngineConfig, WorldEngine};

    const DT: f32 = 1.0 / 60.0;
    const STAND_Y: f32 = 88.0 + 2.15;

    fn flat_world() -> CollisionWorld {
        let mut world = CollisionWorld::new();
        world.add_box(
            Vec3::new(0.0, -50.0, 0.0),
            Vec3::new(5000.0, 50.0, 5000.0),
            ContentFlags::SOLID,
        );
        world
    }

    fn standing(velocity: Vec3) -> MovementState {
        let mut state = MovementState::new(Vec3::new(0.0, STAND_Y, 0.0), 1.0);
        state.body.velocity = velocity;
        state
    }

    fn idle() -> TickInput {
        TickInput {
            delta_time: DT,
            acceleration: Vec3::ZERO,
            control_yaw: 0.0,
        }
    }

    fn context<'a>(config: &'a MovementConfig, body: &'a CharacterBody, role: Role) -> TickContext<'a> {
        TickContext {
            character: body.id,
            config,
            hooks: body,
            role,
            now: 10.0,
        }
    }

    #[test]
    fn test_slide_entry_speed_threshold() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut slow = standing(Vec3::new(199.0, 0.0, 0.0));
        slow.wants_slide = true;
        let mut events = Vec::new();
        simulate_tick(&ctx, &mut slow, &idle(), &engine, &mut events);
        assert_eq!(slow.mode, MovementMode::Ground);
        assert!(events.is_empty());

        let mut fast = standing(Vec3::new(201.0, 0.0, 0.0));
        fast.wants_slide = true;
        simulate_tick(&ctx, &mut fast, &idle(), &engine, &mut events);
        assert_eq!(fast.mode, MovementMode::Slide);
        assert!(fast.wants_crouch);
        assert_eq!(
            events,
            vec![MovementEvent::EnteredSlide {
                previous: MovementMode::Ground
            }]
        );
    }

    #[test]
    fn test_slide_entry_needs_surface() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::new(400.0, 0.0, 0.0));
        state.wants_slide = true;
        let mut events = Vec::new();
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut events);

        assert_ne!(state.mode, MovementMode::Slide);
        assert!(events.is_empty());
    }

    #[test]
    fn test_slide_entry_blocked_while_crouch_requested() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::new(400.0, 0.0, 0.0));
        state.wants_slide = true;
        state.wants_crouch = true;
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut Vec::new());

        assert_eq!(state.mode, MovementMode::Ground);
        assert!(state.crouched);
    }

    #[test]
    fn test_crouch_release_leaves_slide_once() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::new(400.0, 0.0, 0.0));
        state.wants_slide = true;
        let mut events = Vec::new();
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut events);
        assert_eq!(state.mode, MovementMode::Slide);

        // Release crouch and slide
        state.wants_crouch = false;
        state.wants_slide = false;
        events.clear();
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut events);

        assert_eq!(state.mode, MovementMode::Ground);
        assert_eq!(
            events,
            vec![MovementEvent::LeftSlide {
                previous: MovementMode::Slide
            }]
        );
        assert!(!state.crouched);
    }

    #[test]
    fn test_dash_performs_and_toggles() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::ZERO);
        state.wants_dash = true;
        let mut events = Vec::new();
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut events);

        assert!(!state.wants_dash);
        assert!(state.dash_toggle);
        assert_eq!(state.dash_cooldown.last_trigger, Some(10.0));
        assert_eq!(
            events,
            vec![MovementEvent::DashStarted {
                direction: DashDirection::Forward
            }]
        );
        // Forward dash along +X at yaw 0
        assert!(state.velocity().x > 50.0, "velocity={:?}", state.velocity());
    }

    #[test]
    fn test_dash_denied_gameplay_permission_clears_request() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let mut body = CharacterBody::new(1);
        body.dash_enabled = false;
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::ZERO);
        state.wants_dash = true;
        let mut events = Vec::new();
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut events);

        assert!(!state.wants_dash);
        assert!(!state.dash_toggle);
        assert!(events.is_empty());
    }

    #[test]
    fn test_walking_off_ledge_falls_then_lands() {
        let mut world = CollisionWorld::new();
        // Upper ledge ending at x=100, lower floor 50 below
        world.add_box(
            Vec3::new(-900.0, -50.0, 0.0),
            Vec3::new(1000.0, 50.0, 1000.0),
            ContentFlags::SOLID,
        );
        world.add_box(
            Vec3::new(0.0, -150.0, 0.0),
            Vec3::new(5000.0, 50.0, 5000.0),
            ContentFlags::SOLID,
        );
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::new(300.0, 0.0, 0.0));
        state.body.position.x = 90.0;
        let input = TickInput {
            acceleration: Vec3::X * config.max_acceleration,
            ..idle()
        };

        let mut saw_falling = false;
        for _ in 0..120 {
            simulate_tick(&ctx, &mut state, &input, &engine, &mut Vec::new());
            saw_falling |= state.is_falling();
        }

        assert!(saw_falling);
        assert_eq!(state.mode, MovementMode::Ground);
        assert!(state.position().y < STAND_Y - 90.0, "y={}", state.position().y);
    }

    #[test]
    fn test_input_acceleration_is_clamped() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let huge = TickInput {
            acceleration: Vec3::X * 1.0e9,
            ..idle()
        };
        let max = TickInput {
            acceleration: Vec3::X * config.max_acceleration,
            ..idle()
        };

        let mut flooded = standing(Vec3::ZERO);
        let mut capped = standing(Vec3::ZERO);
        simulate_tick(&ctx, &mut flooded, &huge, &engine, &mut NoEvents);
        simulate_tick(&ctx, &mut capped, &max, &engine, &mut NoEvents);

        assert!((flooded.velocity() - capped.velocity()).length() < 1e-3);
        assert!((flooded.position() - capped.position()).length() < 1e-3);
        assert!(flooded.velocity().x < 50.0, "velocity={:?}", flooded.velocity());
    }

    #[test]
    fn test_sprint_allowed_rules() {
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);

        let still = standing(Vec3::ZERO);
        assert!(!is_sprinting_allowed(&config, &still, &body));

        let moving = standing(Vec3::new(100.0, 0.0, 0.0));
        assert!(is_sprinting_allowed(&config, &moving, &body));

        let mut crouched = moving.clone();
        crouched.crouched = true;
        assert!(!is_sprinting_allowed(&config, &crouched, &body));

        let mut already = moving.clone();
        already.wants_sprint = true;
        assert!(!is_sprinting_allowed(&config, &already, &body));

        let mut no_permission = body.clone();
        no_permission.sprint_enabled = false;
        assert!(!is_sprinting_allowed(&config, &moving, &no_permission));
    }

    #[test]
    fn test_prev_crouch_tracks_previous_tick() {
        let world = flat_world();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let config = MovementConfig::default();
        let body = CharacterBody::new(1);
        let ctx = context(&config, &body, Role::AUTONOMOUS);

        let mut state = standing(Vec3::ZERO);
        state.wants_crouch = true;
        assert!(!state.prev_wants_crouch);
        simulate_tick(&ctx, &mut state, &idle(), &engine, &mut NoEvents);
        assert!(state.prev_wants_crouch);
    }
}
