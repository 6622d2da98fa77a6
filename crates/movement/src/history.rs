//! Recorded moves awaiting acknowledgement.
//!
//! The predicting peer records every tick as a [`MoveRecord`], sends it to
//! the authority, and keeps it until acknowledged so it can be replayed
//! after a correction. Consecutive unsent records that would simulate the
//! same way are merged to save bandwidth; the merged record is then
//! re-simulated from the state the earlier record started in, so what the
//! peer predicted is exactly what the authority and a replay will run.

use std::collections::VecDeque;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use slipstride_physics::{LocomotionEngine, MoveSample};

use crate::intent::MovementIntent;
use crate::machine::TickInput;
use crate::mode::MovementMode;
use crate::state::MovementState;

/// One recorded tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Client time at the start of the move (seconds).
    pub timestamp: f64,
    pub delta_time: f32,
    pub acceleration: Vec3,
    pub control_yaw: f32,
    pub intent: MovementIntent,
    pub start_mode: MovementMode,
    pub end_mode: MovementMode,
    /// Predicted position after the move.
    pub end_position: Vec3,
    /// Predicted velocity after the move.
    pub end_velocity: Vec3,
    /// Already handed to the transport. Sent records are never merged.
    #[serde(skip)]
    pub sent: bool,
    /// State before the move, kept locally so a merge can re-simulate.
    #[serde(skip)]
    pub start_state: Option<MovementState>,
}

impl Default for MoveRecord {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            delta_time: 0.0,
            acceleration: Vec3::ZERO,
            control_yaw: 0.0,
            intent: MovementIntent::default(),
            start_mode: MovementMode::Ground,
            end_mode: MovementMode::Ground,
            end_position: Vec3::ZERO,
            end_velocity: Vec3::ZERO,
            sent: false,
            start_state: None,
        }
    }
}

impl MoveRecord {
    /// Tick input this record replays with.
    pub fn input(&self) -> TickInput {
        TickInput {
            delta_time: self.delta_time,
            acceleration: self.acceleration,
            control_yaw: self.control_yaw,
        }
    }

    /// Fold `earlier` in front of this record: one move spanning both,
    /// starting where `earlier` started, with this record's input.
    pub fn combine_with(&mut self, earlier: MoveRecord) {
        self.timestamp = earlier.timestamp;
        self.delta_time += earlier.delta_time;
        self.start_mode = earlier.start_mode;
        self.intent.prev_wants_crouch = earlier.intent.prev_wants_crouch;
        self.start_state = earlier.start_state;
    }

    /// Record where the move ended.
    pub fn fill_end(&mut self, state: &MovementState) {
        self.end_mode = state.mode;
        self.end_position = state.position();
        self.end_velocity = state.velocity();
    }

    /// What the engine's combine predicate looks at.
    pub fn sample(&self) -> MoveSample {
        MoveSample {
            delta_time: self.delta_time,
            acceleration: self.acceleration,
            start_mode: self.start_mode.pack(),
            end_mode: self.end_mode.pack(),
        }
    }
}

/// Bounded buffer of unacknowledged moves, oldest first.
#[derive(Debug, Clone)]
pub struct MoveHistory {
    moves: VecDeque<MoveRecord>,
    capacity: usize,
    max_combined_delta: f32,
}

impl MoveHistory {
    pub fn new(capacity: usize, max_combined_delta: f32) -> Self {
        let capacity = capacity.max(1);
        Self {
            moves: VecDeque::with_capacity(capacity),
            capacity,
            max_combined_delta,
        }
    }

    /// A blank record.
    pub fn allocate_empty(&self) -> MoveRecord {
        MoveRecord::default()
    }

    /// Record the input side of a tick. The end state is filled in after
    /// the move is simulated.
    pub fn capture(
        &self,
        timestamp: f64,
        intent: MovementIntent,
        input: &TickInput,
        start_mode: MovementMode,
    ) -> MoveRecord {
        let mut record = self.allocate_empty();
        record.timestamp = timestamp;
        record.delta_time = input.delta_time;
        record.acceleration = input.acceleration;
        record.control_yaw = input.control_yaw;
        record.intent = intent;
        record.start_mode = start_mode;
        record.end_mode = start_mode;
        record
    }

    /// Whether `later` may be folded into `earlier`.
    ///
    /// Sprint, slide and dash requests must match exactly; everything else
    /// is up to the engine.
    pub fn can_combine<E>(&self, earlier: &MoveRecord, later: &MoveRecord, engine: &E) -> bool
    where
        E: LocomotionEngine + ?Sized,
    {
        let (a, b) = (&earlier.intent, &later.intent);
        if a.wants_sprint != b.wants_sprint
            || a.wants_slide != b.wants_slide
            || a.wants_dash != b.wants_dash
        {
            return false;
        }

        engine.can_combine_moves(&earlier.sample(), &later.sample(), self.max_combined_delta)
    }

    /// Remove and return the newest record if `later` may be merged into
    /// it. Only unsent records that remember their start state qualify.
    pub fn take_combinable<E>(&mut self, later: &MoveRecord, engine: &E) -> Option<MoveRecord>
    where
        E: LocomotionEngine + ?Sized,
    {
        let last = self.moves.back()?;
        if last.sent || last.start_state.is_none() || !self.can_combine(last, later, engine) {
            return None;
        }
        self.moves.pop_back()
    }

    /// Append a simulated move, dropping the oldest one when full.
    pub fn push(&mut self, record: MoveRecord) {
        if self.moves.len() >= self.capacity {
            if let Some(dropped) = self.moves.pop_front() {
                log::warn!(
                    "move history full ({}), dropping unacknowledged move at t={:.3}",
                    self.capacity,
                    dropped.timestamp
                );
            }
        }

        self.moves.push_back(record);
    }

    /// Mark every unsent record as sent and return copies of them.
    pub fn take_unsent(&mut self) -> Vec<MoveRecord> {
        self.moves
            .iter_mut()
            .filter(|record| !record.sent)
            .map(|record| {
                record.sent = true;
                record.clone()
            })
            .collect()
    }

    /// Drop every record up to and including `timestamp`.
    pub fn acknowledge(&mut self, timestamp: f64) -> usize {
        let before = self.moves.len();
        while self.moves.front().is_some_and(|record| record.timestamp <= timestamp) {
            self.moves.pop_front();
        }
        before - self.moves.len()
    }

    /// Records not yet acknowledged, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &MoveRecord> {
        self.moves.iter()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipstride_physics::{CollisionWorld, EngineConfig, WorldEngine};

    const DT: f32 = 1.0 / 60.0;

    fn record(timestamp: f64, intent: MovementIntent) -> MoveRecord {
        MoveRecord {
            timestamp,
            delta_time: DT,
            acceleration: Vec3::X * 2048.0,
            intent,
            ..Default::default()
        }
    }

    #[test]
    fn test_sprint_only_difference_never_combines() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let history = MoveHistory::new(16, 0.125);

        let walking = record(0.0, MovementIntent::default());
        let sprinting = record(
            DT as f64,
            MovementIntent {
                wants_sprint: true,
                ..Default::default()
            },
        );

        assert!(!history.can_combine(&walking, &sprinting, &engine));
    }

    #[test]
    fn test_timing_only_difference_combines() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let history = MoveHistory::new(16, 0.125);

        let a = record(0.0, MovementIntent::default());
        let mut b = record(DT as f64, MovementIntent::default());
        b.delta_time = DT + 0.0005;

        assert!(history.can_combine(&a, &b, &engine));
    }

    fn with_start(timestamp: f64) -> MoveRecord {
        MoveRecord {
            start_state: Some(MovementState::new(Vec3::new(0.0, 90.15, 0.0), 1.0)),
            ..record(timestamp, MovementIntent::default())
        }
    }

    #[test]
    fn test_take_combinable_and_combine_with() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let mut history = MoveHistory::new(16, 0.125);

        let first = with_start(0.0);
        let expected_start = first.start_state.clone();
        history.push(first);
        let mut later = with_start(DT as f64);
        later.start_state = None;

        let earlier = history.take_combinable(&later, &engine).expect("combinable");
        assert!(history.is_empty());
        later.combine_with(earlier);

        assert_eq!(later.timestamp, 0.0);
        assert!((later.delta_time - 2.0 * DT).abs() < 1e-6);
        assert_eq!(later.start_state, expected_start);
    }

    #[test]
    fn test_record_without_start_state_is_not_combined() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let mut history = MoveHistory::new(16, 0.125);

        history.push(record(0.0, MovementIntent::default()));

        assert!(history.take_combinable(&with_start(DT as f64), &engine).is_none());
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_sent_records_are_not_merged() {
        let world = CollisionWorld::new();
        let engine = WorldEngine::new(&world, EngineConfig::default());
        let mut history = MoveHistory::new(16, 0.125);

        history.push(with_start(0.0));
        assert_eq!(history.take_unsent().len(), 1);
        let later = with_start(DT as f64);

        assert!(history.take_combinable(&later, &engine).is_none());
        history.push(later);
        assert_eq!(history.len(), 2);
        assert_eq!(history.take_unsent().len(), 1);
        assert!(history.take_unsent().is_empty());
    }

    #[test]
    fn test_acknowledge_drops_prefix() {
        let mut history = MoveHistory::new(16, 0.125);

        for i in 0..4 {
            history.push(record(f64::from(i), MovementIntent::default()));
            history.take_unsent();
        }

        assert_eq!(history.acknowledge(1.0), 2);
        let remaining: Vec<f64> = history.pending().map(|r| r.timestamp).collect();
        assert_eq!(remaining, vec![2.0, 3.0]);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut history = MoveHistory::new(2, 0.125);

        for i in 0..3 {
            history.push(record(f64::from(i), MovementIntent::default()));
            history.take_unsent();
        }

        let remaining: Vec<f64> = history.pending().map(|r| r.timestamp).collect();
        assert_eq!(remaining, vec![1.0, 2.0]);
    }

    #[test]
    fn test_capture_fills_input_side() {
        let history = MoveHistory::new(4, 0.125);
        let input = TickInput {
            delta_time: DT,
            acceleration: Vec3::Z,
            control_yaw: 90.0,
        };

        let record = history.capture(2.5, MovementIntent::default(), &input, MovementMode::Slide);
        assert_eq!(record.timestamp, 2.5);
        assert_eq!(record.input(), input);
        assert_eq!(record.start_mode, MovementMode::Slide);
        assert!(!record.sent);
    }
}
