//! Actor identity and query ignore sets.

use serde::{Deserialize, Serialize};

/// Identifier of an actor that owns collision geometry.
pub type ActorId = u32;

/// Set of actors a collision query must pass through.
///
/// A character probing the surface under itself ignores its own body and
/// every child actor attached to it (held props, shields, backpacks).
/// Sets are tiny, so membership is a linear scan over a sorted `Vec`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreSet {
    actors: Vec<ActorId>,
}

impl IgnoreSet {
    /// An ignore set that ignores nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ignore set for a character and its attached children.
    pub fn for_character(owner: ActorId, children: &[ActorId]) -> Self {
        let mut set = Self::empty();
        set.insert(owner);
        for &child in children {
            set.insert(child);
        }
        set
    }

    /// Add an actor to the set.
    pub fn insert(&mut self, actor: ActorId) {
        if let Err(index) = self.actors.binary_search(&actor) {
            self.actors.insert(index, actor);
        }
    }

    /// Check whether geometry owned by `actor` must be ignored.
    #[inline]
    pub fn contains(&self, actor: ActorId) -> bool {
        self.actors.binary_search(&actor).is_ok()
    }

    /// Check whether a brush with the given owner must be ignored.
    #[inline]
    pub fn ignores(&self, owner: Option<ActorId>) -> bool {
        owner.is_some_and(|actor| self.contains(actor))
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl FromIterator<ActorId> for IgnoreSet {
    fn from_iter<T: IntoIterator<Item = ActorId>>(iter: T) -> Self {
        let mut set = Self::empty();
        for actor in iter {
            set.insert(actor);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_character_set_contains_children() {
        let set = IgnoreSet::for_character(7, &[12, 3, 12]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(7));
        assert!(set.contains(3));
        assert!(set.contains(12));
        assert!(!set.contains(8));
    }

    #[test]
    fn test_world_geometry_never_ignored() {
        let set = IgnoreSet::for_character(1, &[]);
        assert!(!set.ignores(None));
        assert!(set.ignores(Some(1)));
    }
}
