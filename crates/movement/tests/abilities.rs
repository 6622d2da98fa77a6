//! Slide and dash flows driven through the predicting client.

use glam::Vec3;
use slipstride_movement::{
    CharacterBody, DashDirection, MovementComponent, MovementConfig, MovementEvent, MovementMode,
    PredictingClient, PredictionConfig, TickInput,
};
use slipstride_physics::{CollisionWorld, ContentFlags, EngineConfig, WorldEngine};

const DT: f32 = 1.0 / 60.0;
const STAND_Y: f32 = 88.0 + 2.15;

fn arena() -> CollisionWorld {
    let mut world = CollisionWorld::new();
    world.add_box(
        Vec3::new(0.0, -50.0, 0.0),
        Vec3::new(10000.0, 50.0, 10000.0),
        ContentFlags::SOLID,
    );
    world
}

fn client() -> PredictingClient {
    let movement = MovementComponent::new(
        1,
        MovementConfig::default(),
        CharacterBody::new(1),
        Vec3::new(0.0, STAND_Y, 0.0),
    )
    .expect("valid config");
    PredictingClient::new(movement, &PredictionConfig::default())
}

fn forward(amount: f32) -> TickInput {
    TickInput {
        delta_time: DT,
        acceleration: Vec3::X * amount,
        control_yaw: 0.0,
    }
}

fn time(tick: u32) -> f64 {
    f64::from(tick) / 60.0
}

fn dash_count(events: &[MovementEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, MovementEvent::DashStarted { .. }))
        .count()
}

#[test]
fn test_slide_enter_and_leave_on_crouch() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    let mut events = Vec::new();

    // Run up to walking speed
    let mut tick = 0;
    while tick < 60 {
        client.tick(time(tick), forward(2048.0), &engine, &mut events);
        client.outgoing();
        tick += 1;
    }
    assert!(client.movement.state.velocity().length() > 250.0);

    client.movement.on_slide_pressed();
    client.tick(time(tick), forward(2048.0), &engine, &mut events);
    tick += 1;
    assert_eq!(client.movement.state.mode, MovementMode::Slide);
    assert_eq!(
        events,
        vec![MovementEvent::EnteredSlide {
            previous: MovementMode::Ground
        }]
    );
    assert!(!client.movement.look.limits.is_full());

    events.clear();
    client.movement.on_slide_released();
    client.movement.on_crouch_pressed();
    client.tick(time(tick), forward(2048.0), &engine, &mut events);
    tick += 1;

    assert_eq!(
        events,
        vec![MovementEvent::LeftSlide {
            previous: MovementMode::Slide
        }]
    );
    assert_eq!(client.movement.state.mode, MovementMode::Ground);
    assert!(client.movement.look.limits.is_full());

    // Nothing more happens on the following ticks
    events.clear();
    for _ in 0..10 {
        client.tick(time(tick), forward(2048.0), &engine, &mut events);
        tick += 1;
    }
    assert!(events.is_empty());
}

#[test]
fn test_slide_runs_out_of_speed() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    client.movement.state.body.velocity = Vec3::X * 300.0;
    client.movement.on_slide_pressed();

    let mut events = Vec::new();
    let mut tick = 0;
    client.tick(time(tick), forward(0.0), &engine, &mut events);
    tick += 1;
    assert_eq!(client.movement.state.mode, MovementMode::Slide);

    // Friction and braking eventually stop the slide
    client.movement.on_slide_released();
    while tick < 300 && client.movement.state.mode == MovementMode::Slide {
        client.tick(time(tick), forward(0.0), &engine, &mut events);
        tick += 1;
    }

    assert_eq!(client.movement.state.mode, MovementMode::Ground);
    let left = events
        .iter()
        .filter(|event| matches!(event, MovementEvent::LeftSlide { .. }))
        .count();
    assert_eq!(left, 1);
}

#[test]
fn test_second_dash_within_cooldown_is_deferred() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    let mut events = Vec::new();

    for tick in 0..=72 {
        let now = time(tick);
        if tick == 0 || tick == 30 {
            client.movement.on_dash_pressed(now, &mut client.retries);
        }
        client.tick(now, forward(0.0), &engine, &mut events);

        if tick == 59 {
            assert_eq!(dash_count(&events), 1, "second dash fired early");
            assert!(client.retries.is_pending(1));
        }
    }

    assert_eq!(dash_count(&events), 2);
    assert!(client.retries.is_empty());
    let last = client.movement.state.dash_cooldown.last_trigger.expect("dashed");
    assert!((last - 1.0).abs() < 1e-9, "retry fired at {last}");
}

#[test]
fn test_dash_release_cancels_deferred_retry() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    let mut events = Vec::new();

    for tick in 0..=90 {
        let now = time(tick);
        if tick == 0 || tick == 30 {
            client.movement.on_dash_pressed(now, &mut client.retries);
        }
        if tick == 40 {
            client.movement.on_dash_released(&mut client.retries);
        }
        client.tick(now, forward(0.0), &engine, &mut events);
    }

    assert_eq!(dash_count(&events), 1);
}

#[test]
fn test_dash_direction_follows_velocity_relative_to_look() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    let mut events = Vec::new();

    // Moving along +Z while looking along +X: a right dash
    client.movement.state.body.velocity = Vec3::Z * 200.0;
    client.movement.on_dash_pressed(0.0, &mut client.retries);
    client.tick(
        0.0,
        TickInput {
            delta_time: DT,
            acceleration: Vec3::Z * 2048.0,
            control_yaw: 0.0,
        },
        &engine,
        &mut events,
    );

    assert_eq!(
        events,
        vec![MovementEvent::DashStarted {
            direction: DashDirection::Right
        }]
    );
    assert!(client.movement.state.dash_toggle);
}

#[test]
fn test_no_dash_while_sprinting() {
    let world = arena();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let mut client = client();
    let mut events = Vec::new();

    client.movement.state.body.velocity = Vec3::X * 200.0;
    client.movement.on_sprint_pressed();
    assert!(client.movement.state.wants_sprint);

    client.movement.on_dash_pressed(0.0, &mut client.retries);
    client.tick(0.0, forward(2048.0), &engine, &mut events);

    assert!(events.is_empty());
    assert!(!client.movement.state.wants_dash);
    assert_eq!(client.movement.state.dash_cooldown.last_trigger, None);
}
