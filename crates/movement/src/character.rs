//! The owning character as seen by the movement core.

use serde::{Deserialize, Serialize};
use slipstride_physics::{ActorId, IgnoreSet};

/// Identifier of a simulated character.
pub type CharacterId = ActorId;

/// Gameplay-level permissions and collision ownership of a character.
pub trait CharacterHooks {
    /// Whether gameplay allows sprinting right now.
    fn can_sprint(&self) -> bool {
        true
    }

    /// Whether gameplay allows dashing right now.
    fn can_dash(&self) -> bool {
        true
    }

    /// Actors surface probes must see through: the character itself and
    /// everything attached to it.
    fn ignored_actors(&self) -> IgnoreSet;
}

/// Plain character with toggleable permissions and attached children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBody {
    pub id: CharacterId,
    pub children: Vec<ActorId>,
    pub sprint_enabled: bool,
    pub dash_enabled: bool,
}

impl CharacterBody {
    pub fn new(id: CharacterId) -> Self {
        Self {
            id,
            children: Vec::new(),
            sprint_enabled: true,
            dash_enabled: true,
        }
    }

    /// Attach a child actor (held prop, shield).
    pub fn with_child(mut self, child: ActorId) -> Self {
        self.children.push(child);
        self
    }
}

impl CharacterHooks for CharacterBody {
    fn can_sprint(&self) -> bool {
        self.sprint_enabled
    }

    fn can_dash(&self) -> bool {
        self.dash_enabled
    }

    fn ignored_actors(&self) -> IgnoreSet {
        IgnoreSet::for_character(self.id, &self.children)
    }
}

/// Network role of the peer simulating a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Role {
    /// This peer's outcome is final.
    pub authority: bool,
    /// This peer reads input for the character.
    pub locally_controlled: bool,
}

impl Role {
    /// Client predicting its own character.
    pub const AUTONOMOUS: Role = Role {
        authority: false,
        locally_controlled: true,
    };

    /// Server simulating a remote client's character.
    pub const REMOTE_AUTHORITY: Role = Role {
        authority: true,
        locally_controlled: false,
    };

    /// Listen server simulating its own character.
    pub const LOCAL_AUTHORITY: Role = Role {
        authority: true,
        locally_controlled: true,
    };

    /// Client observing someone else's character.
    pub const SIMULATED: Role = Role {
        authority: false,
        locally_controlled: false,
    };

    /// Authority evaluating a character it does not control.
    #[inline]
    pub fn is_remote_authority(self) -> bool {
        self.authority && !self.locally_controlled
    }
}
