//! Compressed intent bitset.
//!
//! Layout of the 16-bit value:
//!
//! | Bits  | Meaning                                       |
//! |-------|-----------------------------------------------|
//! | 0-3   | engine-owned flags, passed through untouched  |
//! | 4     | sprint                                        |
//! | 5     | slide                                         |
//! | 6     | dash                                          |
//! | 7     | reserved, always zero                         |
//! | 8     | previous-tick crouch                          |
//! | 9-15  | reserved, always zero                         |
//!
//! The low byte is the per-tick movement byte of the wire contract.

use serde::{Deserialize, Serialize};
use slipstride_physics::EngineFlags;

use crate::intent::MovementIntent;

/// Compressed form of a [`MovementIntent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CompressedIntent(u16);

impl CompressedIntent {
    pub const FLAG_SPRINT: u16 = 1 << 4;
    pub const FLAG_SLIDE: u16 = 1 << 5;
    pub const FLAG_DASH: u16 = 1 << 6;
    pub const FLAG_RESERVED: u16 = 1 << 7;
    pub const FLAG_PREV_CROUCH: u16 = 1 << 8;

    /// Every bit that must stay zero.
    pub const RESERVED_MASK: u16 = Self::FLAG_RESERVED | 0xFE00;

    /// Wrap raw bits as received.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// The per-tick movement byte (bits 0-7).
    pub const fn movement_byte(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }

    /// Whether any reserved bit is set.
    pub const fn has_reserved_bits(self) -> bool {
        self.0 & Self::RESERVED_MASK != 0
    }

    /// Pack an intent.
    pub fn encode(intent: &MovementIntent) -> Self {
        let mut bits = u16::from(intent.engine.bits() & EngineFlags::MASK);
        if intent.wants_sprint {
            bits |= Self::FLAG_SPRINT;
        }
        if intent.wants_slide {
            bits |= Self::FLAG_SLIDE;
        }
        if intent.wants_dash {
            bits |= Self::FLAG_DASH;
        }
        if intent.prev_wants_crouch {
            bits |= Self::FLAG_PREV_CROUCH;
        }
        Self(bits)
    }

    /// Unpack into an intent. Reserved bits are ignored.
    pub fn decode(self) -> MovementIntent {
        if self.has_reserved_bits() {
            log::debug!("ignoring reserved intent bits {:#06x}", self.0 & Self::RESERVED_MASK);
        }

        MovementIntent {
            wants_sprint: self.0 & Self::FLAG_SPRINT != 0,
            wants_slide: self.0 & Self::FLAG_SLIDE != 0,
            wants_dash: self.0 & Self::FLAG_DASH != 0,
            prev_wants_crouch: self.0 & Self::FLAG_PREV_CROUCH != 0,
            engine: EngineFlags::from_bits(self.movement_byte()),
        }
    }
}

impl From<&MovementIntent> for CompressedIntent {
    fn from(intent: &MovementIntent) -> Self {
        Self::encode(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_intents() -> impl Iterator<Item = MovementIntent> {
        (0u16..256).map(|n| MovementIntent {
            wants_sprint: n & 0x10 != 0,
            wants_slide: n & 0x20 != 0,
            wants_dash: n & 0x40 != 0,
            prev_wants_crouch: n & 0x80 != 0,
            engine: EngineFlags::from_bits((n & 0x0F) as u8),
        })
    }

    #[test]
    fn test_round_trip_every_intent() {
        for intent in all_intents() {
            let compressed = CompressedIntent::encode(&intent);
            assert!(!compressed.has_reserved_bits(), "{compressed:?}");
            assert_eq!(compressed.decode(), intent);
        }
    }

    #[test]
    fn test_wire_layout() {
        let intent = MovementIntent {
            wants_sprint: true,
            wants_dash: true,
            ..Default::default()
        };
        assert_eq!(CompressedIntent::encode(&intent).movement_byte(), 0x50);

        let slide = MovementIntent {
            wants_slide: true,
            ..Default::default()
        };
        assert_eq!(CompressedIntent::encode(&slide).bits(), 0x20);
    }

    #[test]
    fn test_engine_bits_pass_through() {
        let intent = MovementIntent {
            engine: EngineFlags::from_bits(EngineFlags::JUMP_PRESSED | EngineFlags::RESERVED_2),
            ..Default::default()
        };
        let compressed = CompressedIntent::encode(&intent);
        assert_eq!(compressed.bits(), 0x09);
        assert_eq!(compressed.decode().engine, intent.engine);
    }

    #[test]
    fn test_reserved_bits_are_dropped() {
        let compressed = CompressedIntent::from_bits(0xFE80 | 0x10);
        assert!(compressed.has_reserved_bits());

        let intent = compressed.decode();
        assert!(intent.wants_sprint);
        assert_eq!(CompressedIntent::encode(&intent).bits(), 0x10);
    }
}
