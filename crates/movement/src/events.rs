//! Outbound movement notifications.
//!
//! Events are delivered synchronously from inside the tick that causes
//! them. Replays pass [`NoEvents`] so presentation never sees a re-run.

use serde::{Deserialize, Serialize};

use crate::mode::MovementMode;

/// Discretized direction of a dash relative to the look direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DashDirection {
    Forward,
    Backward,
    Left,
    Right,
}

/// Something observers of a character's movement may react to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementEvent {
    /// A slide started. Carries the mode left to start it.
    EnteredSlide { previous: MovementMode },
    /// A slide ended. Carries the mode that was left.
    LeftSlide { previous: MovementMode },
    /// A dash was performed.
    DashStarted { direction: DashDirection },
}

/// Receiver of movement events.
pub trait MovementEvents {
    fn entered_slide(&mut self, _previous: MovementMode) {}

    fn left_slide(&mut self, _previous: MovementMode) {}

    fn dash_started(&mut self, _direction: DashDirection) {}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl MovementEvents for NoEvents {}

impl MovementEvents for Vec<MovementEvent> {
    fn entered_slide(&mut self, previous: MovementMode) {
        self.push(MovementEvent::EnteredSlide { previous });
    }

    fn left_slide(&mut self, previous: MovementMode) {
        self.push(MovementEvent::LeftSlide { previous });
    }

    fn dash_started(&mut self, direction: DashDirection) {
        self.push(MovementEvent::DashStarted { direction });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_collects_in_order() {
        let mut events = Vec::new();
        events.entered_slide(MovementMode::Ground);
        events.dash_started(DashDirection::Left);
        events.left_slide(MovementMode::Slide);

        assert_eq!(
            events,
            vec![
                MovementEvent::EnteredSlide {
                    previous: MovementMode::Ground
                },
                MovementEvent::DashStarted {
                    direction: DashDirection::Left
                },
                MovementEvent::LeftSlide {
                    previous: MovementMode::Slide
                },
            ]
        );
    }
}
