//! Per-tick movement intent.
//!
//! [`MovementIntent`] is the transient projection of the committed flags in
//! [`MovementState`] that travels inside a move record. Applying it back
//! onto a state is the second half of the capture/commit split: the
//! predicting peer trusts its own records, the authority re-checks sprint.

use serde::{Deserialize, Serialize};
use slipstride_physics::EngineFlags;

use crate::state::MovementState;

/// Intent captured for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MovementIntent {
    pub wants_sprint: bool,
    pub wants_slide: bool,
    pub wants_dash: bool,
    pub prev_wants_crouch: bool,
    /// Engine-owned bits, carried through untouched. Crouch requests ride
    /// in [`EngineFlags::WANTS_CROUCH`].
    pub engine: EngineFlags,
}

impl MovementIntent {
    /// Snapshot the committed flags of `state`.
    pub fn capture(state: &MovementState) -> Self {
        let mut engine = EngineFlags::default();
        engine.set(EngineFlags::WANTS_CROUCH, state.wants_crouch);

        Self {
            wants_sprint: state.wants_sprint,
            wants_slide: state.wants_slide,
            wants_dash: state.wants_dash,
            prev_wants_crouch: state.prev_wants_crouch,
            engine,
        }
    }

    /// Whether the crouch request bit is set.
    #[inline]
    pub fn wants_crouch(&self) -> bool {
        self.engine.contains(EngineFlags::WANTS_CROUCH)
    }

    /// Commit every flag as recorded.
    ///
    /// Used when replaying the peer's own moves.
    pub fn apply_trusted(&self, state: &mut MovementState) {
        state.wants_sprint = self.wants_sprint;
        self.apply_common(state);
    }

    /// Commit flags received from a remote peer.
    ///
    /// A set sprint bit only starts sprinting when `sprint_allowed`; an
    /// already committed sprint is kept. A clear sprint bit always stops it.
    pub fn apply_verified(&self, state: &mut MovementState, sprint_allowed: bool) {
        if !self.wants_sprint {
            state.wants_sprint = false;
        } else if sprint_allowed {
            state.wants_sprint = true;
        }
        self.apply_common(state);
    }

    fn apply_common(&self, state: &mut MovementState) {
        state.wants_slide = self.wants_slide;
        state.wants_dash = self.wants_dash;
        state.wants_crouch = self.wants_crouch();
        state.prev_wants_crouch = self.prev_wants_crouch;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_capture_reflects_state() {
        let mut state = MovementState::new(Vec3::ZERO, 1.0);
        state.wants_slide = true;
        state.wants_crouch = true;

        let intent = MovementIntent::capture(&state);
        assert!(intent.wants_slide);
        assert!(!intent.wants_sprint);
        assert!(intent.wants_crouch());
    }

    #[test]
    fn test_verified_sprint_needs_permission() {
        let mut state = MovementState::new(Vec3::ZERO, 1.0);
        let intent = MovementIntent {
            wants_sprint: true,
            ..Default::default()
        };

        intent.apply_verified(&mut state, false);
        assert!(!state.wants_sprint);

        intent.apply_verified(&mut state, true);
        assert!(state.wants_sprint);

        // Already sprinting: a set bit keeps it even if starting is not allowed
        intent.apply_verified(&mut state, false);
        assert!(state.wants_sprint);

        MovementIntent::default().apply_verified(&mut state, true);
        assert!(!state.wants_sprint);
    }

    #[test]
    fn test_trusted_apply_sets_everything() {
        let mut state = MovementState::new(Vec3::ZERO, 1.0);
        let mut engine = EngineFlags::default();
        engine.set(EngineFlags::WANTS_CROUCH, true);
        let intent = MovementIntent {
            wants_sprint: true,
            wants_slide: true,
            wants_dash: true,
            prev_wants_crouch: true,
            engine,
        };

        intent.apply_trusted(&mut state);
        assert!(state.wants_sprint && state.wants_slide && state.wants_dash);
        assert!(state.wants_crouch && state.prev_wants_crouch);
    }
}
