//! Slipstride - headless movement demo
//!
//! One predicting client and one authoritative server exchange encoded
//! moves over an in-memory link with a fixed latency. An observer follows
//! the server's proxy snapshots. Run with `RUST_LOG=debug` to watch
//! corrections and dashes.

use std::collections::VecDeque;

use glam::Vec3;
use slipstride_movement::{
    AuthoritativeMovement, CharacterBody, CharacterId, MovementComponent, MovementConfig,
    MovementEvent, PredictingClient, PredictionConfig, SimulatedProxy, TickInput,
};
use slipstride_physics::{CollisionWorld, ContentFlags, EngineConfig, WorldEngine};
use slipstride_protocol::{decode, encode, MovementMessage};

const TICK_RATE: f64 = 60.0;
const TICKS: u32 = 600;
const LATENCY_TICKS: usize = 4;
const PLAYER: CharacterId = 1;

/// Packets in flight one way, delivered `LATENCY_TICKS` after sending.
struct Link {
    in_flight: VecDeque<Vec<Vec<u8>>>,
    bytes: usize,
}

impl Link {
    fn new() -> Self {
        Self {
            in_flight: VecDeque::new(),
            bytes: 0,
        }
    }

    fn send(&mut self, packets: Vec<Vec<u8>>) {
        self.bytes += packets.iter().map(Vec::len).sum::<usize>();
        self.in_flight.push_back(packets);
    }

    fn deliver(&mut self) -> Vec<Vec<u8>> {
        if self.in_flight.len() > LATENCY_TICKS {
            self.in_flight.pop_front().unwrap_or_default()
        } else {
            Vec::new()
        }
    }
}

fn build_world() -> CollisionWorld {
    let mut world = CollisionWorld::new();
    // Floor
    world.add_box(
        Vec3::new(0.0, -50.0, 0.0),
        Vec3::new(10000.0, 50.0, 10000.0),
        ContentFlags::SOLID,
    );
    // A ledge to run into and a long wall
    world.add_box(
        Vec3::new(1500.0, 20.0, 0.0),
        Vec3::new(300.0, 20.0, 300.0),
        ContentFlags::SOLID,
    );
    world.add_box(
        Vec3::new(0.0, 150.0, 800.0),
        Vec3::new(4000.0, 150.0, 20.0),
        ContentFlags::SOLID,
    );
    world
}

/// Scripted player: run, slide, stand up, strafe and dash twice.
fn drive(client: &mut PredictingClient, tick: u32, now: f64) -> TickInput {
    match tick {
        90 => client.movement.on_sprint_pressed(),
        150 => {
            client.movement.on_sprint_released();
            client.movement.on_slide_pressed();
        }
        200 => client.movement.on_slide_released(),
        260 => client.movement.on_crouch_pressed(),
        300 => client.movement.on_crouch_pressed(),
        360 | 380 => client.movement.on_dash_pressed(now, &mut client.retries),
        _ => {}
    }

    let control_yaw = if tick < 330 { 0.0 } else { 20.0 };
    let yaw = f32::to_radians(control_yaw);
    let forward = Vec3::new(yaw.cos(), 0.0, yaw.sin());
    let right = Vec3::new(-yaw.sin(), 0.0, yaw.cos());
    let acceleration = match tick {
        0..=329 => forward,
        330..=449 => right,
        _ => Vec3::ZERO,
    } * 2048.0;

    TickInput {
        delta_time: (1.0 / TICK_RATE) as f32,
        acceleration,
        control_yaw,
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let world = build_world();
    let engine = WorldEngine::new(&world, EngineConfig::default());
    let prediction = PredictionConfig::default();
    prediction.validate()?;
    let spawn = Vec3::new(0.0, 88.0 + 2.15, 0.0);

    let player = || {
        MovementComponent::new(
            PLAYER,
            MovementConfig::default(),
            CharacterBody::new(PLAYER),
            spawn,
        )
    };
    let mut client = PredictingClient::new(player()?, &prediction);
    let mut server = AuthoritativeMovement::new(player()?, prediction);
    let mut observer = SimulatedProxy::new();

    let mut uplink = Link::new();
    let mut downlink = Link::new();
    let mut client_events = Vec::new();
    let mut server_events: Vec<MovementEvent> = Vec::new();
    let mut observer_events = Vec::new();
    let (mut acks, mut corrections) = (0u32, 0u32);

    for tick in 0..TICKS {
        let now = f64::from(tick) / TICK_RATE;

        // Client
        let input = drive(&mut client, tick, now);
        client.tick(now, input, &engine, &mut client_events);
        let outgoing = MovementMessage::moves(PLAYER, client.outgoing())
            .map(|message| encode(&message))
            .transpose()?;
        uplink.send(outgoing.into_iter().collect());

        // Server
        let mut replies = Vec::new();
        for packet in uplink.deliver() {
            let MovementMessage::Moves(batch) = decode(&packet)? else {
                log::warn!("server: unexpected message on the move channel");
                continue;
            };
            for client_move in &batch.moves {
                let Some(reply) = server.receive(client_move, now, &engine, &mut server_events) else {
                    continue;
                };
                replies.push(encode(&MovementMessage::from(reply))?);
            }
        }
        replies.push(encode(&MovementMessage::from(server.proxy_state()))?);
        downlink.send(replies);

        // Client and observer
        for packet in downlink.deliver() {
            match decode(&packet)? {
                MovementMessage::Ack(ack) => {
                    acks += 1;
                    client.on_ack(&ack);
                }
                MovementMessage::Correction(correction) => {
                    corrections += 1;
                    client.on_correction(&correction, &engine);
                }
                MovementMessage::Proxy(state) => observer.apply(&state, &mut observer_events),
                MovementMessage::Moves(_) => log::warn!("client: unexpected moves from the server"),
            }
        }
    }

    let dashes = |events: &[MovementEvent]| {
        events
            .iter()
            .filter(|event| matches!(event, MovementEvent::DashStarted { .. }))
            .count()
    };

    log::info!(
        "{TICKS} ticks: {acks} acks, {corrections} corrections, {} bytes up, {} bytes down",
        uplink.bytes,
        downlink.bytes
    );
    log::info!(
        "client at {:?} ({}), server at {:?} ({})",
        client.movement.state.position(),
        client.movement.state.mode,
        server.movement.state.position(),
        server.movement.state.mode
    );
    log::info!(
        "client saw {} events ({} dashes), server {} ({} dashes), observer {} ({} dashes), {} moves unacknowledged",
        client_events.len(),
        dashes(&client_events),
        server_events.len(),
        dashes(&server_events),
        observer_events.len(),
        dashes(&observer_events),
        client.history.len()
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("demo failed: {e}");
        std::process::exit(1);
    }
}
