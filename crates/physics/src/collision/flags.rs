//! Content flags for collision filtering.
//!
//! Every brush in the world carries a set of content flags, and every query
//! carries a mask. A brush takes part in a query only when the two overlap.

use serde::{Deserialize, Serialize};

/// Content flags describe what type of volume a brush is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ContentFlags(pub u32);

impl ContentFlags {
    /// Empty space - nothing here.
    pub const EMPTY: Self = Self(0);

    /// Solid world geometry - walls, floors, ramps.
    pub const SOLID: Self = Self(1 << 0);

    /// Blocks characters but nothing else (invisible walls).
    pub const CHARACTER_CLIP: Self = Self(1 << 1);

    /// Character bodies and the props attached to them.
    pub const CHARACTER_BODY: Self = Self(1 << 2);

    /// Trigger volume - never blocks movement.
    pub const TRIGGER: Self = Self(1 << 3);

    /// Mask for character sweeps and floor checks.
    pub const MASK_CHARACTER_SOLID: Self = Self(
        Self::SOLID.0 | Self::CHARACTER_CLIP.0 | Self::CHARACTER_BODY.0,
    );

    /// Mask for surface probes: everything that blocks, like a "block all"
    /// query profile.
    pub const MASK_BLOCK_ALL: Self = Self(
        Self::SOLID.0 | Self::CHARACTER_CLIP.0 | Self::CHARACTER_BODY.0,
    );

    /// Check if these flags contain a specific flag.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check if any of the given flags are set.
    #[inline]
    pub fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }
}

impl std::ops::BitOr for ContentFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_flags_operations() {
        let combined = ContentFlags::SOLID | ContentFlags::TRIGGER;

        assert!(combined.contains(ContentFlags::SOLID));
        assert!(combined.contains(ContentFlags::TRIGGER));
        assert!(!combined.contains(ContentFlags::CHARACTER_BODY));
        assert!(combined.intersects(ContentFlags::SOLID));
    }

    #[test]
    fn test_character_mask_ignores_triggers() {
        let mask = ContentFlags::MASK_CHARACTER_SOLID;
        assert!(mask.contains(ContentFlags::SOLID));
        assert!(mask.contains(ContentFlags::CHARACTER_BODY));
        assert!(!mask.intersects(ContentFlags::TRIGGER));
    }
}
