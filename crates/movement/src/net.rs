//! Client prediction and server reconciliation.
//!
//! The predicting client simulates its own input immediately, records
//! every tick and ships the records to the authority. The authority
//! re-simulates each move from its own state and compares end positions:
//! within tolerance it acknowledges, otherwise it sends its state back. On
//! a correction the client rewinds to that state and replays everything
//! the authority has not seen yet.
//!
//! Simulated proxies only receive snapshots and derive presentation
//! events from them.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use slipstride_physics::LocomotionEngine;

use crate::character::{CharacterBody, CharacterHooks, CharacterId, Role};
use crate::codec::CompressedIntent;
use crate::component::MovementComponent;
use crate::config::PredictionConfig;
use crate::dash::dash_direction;
use crate::events::{MovementEvents, NoEvents};
use crate::guard::SECURITY_TARGET;
use crate::history::{MoveHistory, MoveRecord};
use crate::intent::MovementIntent;
use crate::machine::{apply_move, replay, TickInput};
use crate::mode::MovementMode;
use crate::retry::DashRetryScheduler;

// ============================================================================
// Payloads
// ============================================================================

/// One recorded move, client to server.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientMove {
    pub timestamp: f64,
    pub delta_time: f32,
    pub acceleration: Vec3,
    pub control_yaw: f32,
    pub compressed: CompressedIntent,
    /// Where the client ended up.
    pub end_position: Vec3,
    /// Packed mode the client ended in.
    pub end_mode: u8,
}

impl ClientMove {
    pub fn from_record(record: &MoveRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            delta_time: record.delta_time,
            acceleration: record.acceleration,
            control_yaw: record.control_yaw,
            compressed: CompressedIntent::encode(&record.intent),
            end_position: record.end_position,
            end_mode: record.end_mode.pack(),
        }
    }
}

/// Server accepted every move up to `timestamp`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveAck {
    pub timestamp: f64,
}

/// Server state after the move at `timestamp`, sent when the client's
/// prediction disagreed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveCorrection {
    pub timestamp: f64,
    pub mode: MovementMode,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub wants_crouch: bool,
    /// Dash toggle as of `timestamp`, so replayed dashes flip it again.
    pub dash_toggle: bool,
}

/// Snapshot of a character for observers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProxyState {
    pub character: CharacterId,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Packed mode.
    pub mode: u8,
    /// Flips on every dash.
    pub dash_toggle: bool,
    pub control_yaw: f32,
}

/// Server answer to a [`ClientMove`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ServerReply {
    Ack(MoveAck),
    Correction(MoveCorrection),
}

// ============================================================================
// Predicting client
// ============================================================================

/// Locally controlled character on a client.
#[derive(Debug, Clone)]
pub struct PredictingClient<H = CharacterBody> {
    pub movement: MovementComponent<H>,
    pub history: MoveHistory,
    pub retries: DashRetryScheduler,
    corrections: u32,
}

impl<H: CharacterHooks> PredictingClient<H> {
    pub fn new(movement: MovementComponent<H>, prediction: &PredictionConfig) -> Self {
        Self {
            movement,
            history: MoveHistory::new(prediction.history_capacity, prediction.max_combined_delta),
            retries: DashRetryScheduler::new(),
            corrections: 0,
        }
    }

    /// Corrections received so far.
    pub fn corrections(&self) -> u32 {
        self.corrections
    }

    /// Predict one tick and record it.
    pub fn tick<E, V>(&mut self, now: f64, input: TickInput, engine: &E, events: &mut V)
    where
        E: LocomotionEngine + ?Sized,
        V: MovementEvents + ?Sized,
    {
        let id = self.movement.id();
        for due in self.retries.take_due(now) {
            if due == id {
                self.movement.on_dash_retry();
            }
        }

        let input = TickInput {
            control_yaw: self.movement.limit_yaw(input.control_yaw),
            ..input
        };

        let state = &self.movement.state;
        let intent = MovementIntent::capture(state);
        let mut record = self.history.capture(now, intent, &input, state.mode);
        record.start_state = Some(state.clone());

        record.intent.apply_trusted(&mut self.movement.state);
        self.movement.tick(Role::AUTONOMOUS, now, &input, engine, events);
        record.fill_end(&self.movement.state);

        // Merge into the previous unsent move and predict the merged move
        // as the authority will run it
        if let Some(earlier) = self.history.take_combinable(&record, engine) {
            record.combine_with(earlier);
            if let Some(start) = record.start_state.clone() {
                let (ctx, state, _) = self.movement.split_mut(Role::AUTONOMOUS, record.timestamp);
                *state = start;
                apply_move(&ctx, state, &record, engine, &mut NoEvents);
                record.fill_end(state);
                self.movement.sync_look();
            }
        }

        self.history.push(record);
    }

    /// Moves to send this frame.
    pub fn outgoing(&mut self) -> Vec<ClientMove> {
        self.history
            .take_unsent()
            .iter()
            .map(ClientMove::from_record)
            .collect()
    }

    pub fn on_ack(&mut self, ack: &MoveAck) {
        self.history.acknowledge(ack.timestamp);
    }

    /// Rewind to the authoritative state and replay unacknowledged moves.
    pub fn on_correction<E>(&mut self, correction: &MoveCorrection, engine: &E)
    where
        E: LocomotionEngine + ?Sized,
    {
        self.corrections += 1;
        self.history.acknowledge(correction.timestamp);

        let state = &mut self.movement.state;
        let error = state.position().distance(correction.position);
        state.mode = correction.mode;
        state.body.position = correction.position;
        state.body.rotation = correction.rotation;
        state.body.velocity = correction.velocity;
        state.wants_crouch = correction.wants_crouch;
        state.dash_toggle = correction.dash_toggle;

        let (ctx, state, _) = self.movement.split_mut(Role::AUTONOMOUS, correction.timestamp);
        let replayed = replay(&ctx, state, self.history.pending(), engine);
        self.movement.sync_look();

        log::debug!(
            "character {} corrected at t={:.3} ({error:.2} cm off), replayed {replayed} moves",
            self.movement.id(),
            correction.timestamp
        );
    }
}

// ============================================================================
// Authority
// ============================================================================

/// Server-side simulation of a remote client's character.
#[derive(Debug, Clone)]
pub struct AuthoritativeMovement<H = CharacterBody> {
    pub movement: MovementComponent<H>,
    prediction: PredictionConfig,
    last_timestamp: Option<f64>,
}

impl<H: CharacterHooks> AuthoritativeMovement<H> {
    pub fn new(movement: MovementComponent<H>, prediction: PredictionConfig) -> Self {
        Self {
            movement,
            prediction,
            last_timestamp: None,
        }
    }

    /// Simulate a client move and decide whether the client was right.
    ///
    /// Moves older than the last processed one are dropped.
    pub fn receive<E, V>(
        &mut self,
        client_move: &ClientMove,
        now: f64,
        engine: &E,
        events: &mut V,
    ) -> Option<ServerReply>
    where
        E: LocomotionEngine + ?Sized,
        V: MovementEvents + ?Sized,
    {
        let id = self.movement.id();
        if self
            .last_timestamp
            .is_some_and(|last| client_move.timestamp <= last)
        {
            log::debug!(
                "character {id}: dropping stale move t={:.3}",
                client_move.timestamp
            );
            return None;
        }
        self.last_timestamp = Some(client_move.timestamp);

        let delta_time = client_move.delta_time;
        if !delta_time.is_finite() || delta_time <= 0.0 || delta_time > self.prediction.max_combined_delta {
            log::warn!(
                target: SECURITY_TARGET,
                "character {id} sent a move with delta time {delta_time}, refusing it"
            );
            return Some(ServerReply::Correction(self.correction(client_move.timestamp)));
        }

        if !client_move.acceleration.is_finite()
            || !client_move.control_yaw.is_finite()
            || !client_move.end_position.is_finite()
        {
            log::warn!(
                target: SECURITY_TARGET,
                "character {id} sent a move with non-finite input (acceleration {}, yaw {}, end {}), refusing it",
                client_move.acceleration,
                client_move.control_yaw,
                client_move.end_position
            );
            return Some(ServerReply::Correction(self.correction(client_move.timestamp)));
        }

        let record = MoveRecord {
            timestamp: client_move.timestamp,
            delta_time,
            acceleration: client_move.acceleration,
            control_yaw: client_move.control_yaw,
            intent: client_move.compressed.decode(),
            start_mode: self.movement.state.mode,
            ..Default::default()
        };

        let (ctx, state, _) = self.movement.split_mut(Role::REMOTE_AUTHORITY, now);
        apply_move(&ctx, state, &record, engine, events);

        let state = &self.movement.state;
        let mode_matches = match MovementMode::unpack(client_move.end_mode) {
            Ok(mode) => mode == state.mode,
            Err(e) => {
                log::error!("character {id}: {e}");
                false
            }
        };
        let position_error = state.position().distance(client_move.end_position);

        if mode_matches && position_error <= self.prediction.position_tolerance {
            Some(ServerReply::Ack(MoveAck {
                timestamp: client_move.timestamp,
            }))
        } else {
            log::debug!(
                "character {id}: correcting move t={:.3}, {position_error:.2} cm off, client mode {:#04x}, server {}",
                client_move.timestamp,
                client_move.end_mode,
                state.mode
            );
            Some(ServerReply::Correction(self.correction(client_move.timestamp)))
        }
    }

    /// Authoritative state as a correction for `timestamp`.
    pub fn correction(&self, timestamp: f64) -> MoveCorrection {
        let state = &self.movement.state;
        MoveCorrection {
            timestamp,
            mode: state.mode,
            position: state.position(),
            rotation: state.body.rotation,
            velocity: state.velocity(),
            wants_crouch: state.wants_crouch,
            dash_toggle: state.dash_toggle,
        }
    }

    /// Snapshot for simulated proxies.
    pub fn proxy_state(&self) -> ProxyState {
        let state = &self.movement.state;
        ProxyState {
            character: self.movement.id(),
            position: state.position(),
            rotation: state.body.rotation,
            velocity: state.velocity(),
            mode: state.mode.pack(),
            dash_toggle: state.dash_toggle,
            control_yaw: state.control_yaw,
        }
    }
}

// ============================================================================
// Simulated proxy
// ============================================================================

/// Someone else's character as seen by a client.
#[derive(Debug, Clone, Default)]
pub struct SimulatedProxy {
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub mode: MovementMode,
    pub control_yaw: f32,
    last_dash_toggle: Option<bool>,
}

impl SimulatedProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a snapshot, raising the events it implies.
    ///
    /// The first snapshot only establishes a baseline.
    pub fn apply<V>(&mut self, update: &ProxyState, events: &mut V)
    where
        V: MovementEvents + ?Sized,
    {
        let baseline = self.last_dash_toggle.is_none();

        self.position = update.position;
        self.rotation = update.rotation;
        self.velocity = update.velocity;
        self.control_yaw = update.control_yaw;

        match MovementMode::unpack(update.mode) {
            Ok(mode) => {
                let previous = self.mode;
                self.mode = mode;
                if !baseline && previous != mode {
                    if previous == MovementMode::Slide {
                        events.left_slide(previous);
                    }
                    if mode == MovementMode::Slide {
                        events.entered_slide(previous);
                    }
                }
            }
            Err(e) => log::error!("proxy {}: {e}", update.character),
        }

        if self.last_dash_toggle.is_some_and(|last| last != update.dash_toggle) {
            events.dash_started(dash_direction(update.control_yaw, update.velocity));
        }
        self.last_dash_toggle = Some(update.dash_toggle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{DashDirection, MovementEvent};

    fn snapshot(mode: MovementMode, dash_toggle: bool, velocity: Vec3) -> ProxyState {
        ProxyState {
            character: 2,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity,
            mode: mode.pack(),
            dash_toggle,
            control_yaw: 0.0,
        }
    }

    #[test]
    fn test_client_move_carries_record() {
        let record = MoveRecord {
            timestamp: 1.5,
            delta_time: 0.016,
            intent: MovementIntent {
                wants_dash: true,
                ..Default::default()
            },
            end_mode: MovementMode::Falling,
            end_position: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };

        let client_move = ClientMove::from_record(&record);
        assert_eq!(client_move.timestamp, 1.5);
        assert_eq!(client_move.compressed.decode(), record.intent);
        assert_eq!(MovementMode::unpack(client_move.end_mode), Ok(MovementMode::Falling));
        assert_eq!(client_move.end_position, record.end_position);
    }

    #[test]
    fn test_proxy_dash_toggle_raises_event() {
        let mut proxy = SimulatedProxy::new();
        let mut events = Vec::new();

        proxy.apply(&snapshot(MovementMode::Ground, false, Vec3::ZERO), &mut events);
        assert!(events.is_empty());

        proxy.apply(
            &snapshot(MovementMode::Falling, true, Vec3::new(0.0, 10.0, -100.0)),
            &mut events,
        );
        assert_eq!(
            events,
            vec![MovementEvent::DashStarted {
                direction: DashDirection::Left
            }]
        );

        events.clear();
        proxy.apply(&snapshot(MovementMode::Falling, true, Vec3::ZERO), &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_proxy_slide_events() {
        let mut proxy = SimulatedProxy::new();
        let mut events = Vec::new();

        proxy.apply(&snapshot(MovementMode::Ground, false, Vec3::ZERO), &mut events);
        proxy.apply(&snapshot(MovementMode::Slide, false, Vec3::ZERO), &mut events);
        proxy.apply(&snapshot(MovementMode::Ground, false, Vec3::ZERO), &mut events);

        assert_eq!(
            events,
            vec![
                MovementEvent::EnteredSlide {
                    previous: MovementMode::Ground
                },
                MovementEvent::LeftSlide {
                    previous: MovementMode::Slide
                },
            ]
        );
    }

    #[test]
    fn test_proxy_keeps_mode_on_unknown_value() {
        let mut proxy = SimulatedProxy::new();
        let mut update = snapshot(MovementMode::Falling, false, Vec3::ZERO);
        proxy.apply(&update, &mut Vec::new());

        update.mode = 0x7F;
        proxy.apply(&update, &mut Vec::new());
        assert_eq!(proxy.mode, MovementMode::Falling);
    }
}
