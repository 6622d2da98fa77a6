//! Movement modes.
//!
//! The mode set is closed. A dash is not a mode of its own: it is an
//! impulse applied during the transition step that leaves the character in
//! [`MovementMode::Falling`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Packed value of the walking mode.
const PACKED_WALKING: u8 = 1;
/// Packed value of the falling mode.
const PACKED_FALLING: u8 = 3;
/// Packed value of engine-extension modes; the sub-mode lives in the high nibble.
const PACKED_CUSTOM: u8 = 6;
/// Sub-mode index of sliding.
const CUSTOM_SLIDE: u8 = 1;

/// Error raised for packed mode values this core does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ModeError {
    #[error("unknown packed movement mode {0:#04x}")]
    Unknown(u8),
}

/// Current locomotion mode of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MovementMode {
    /// Walking or sprinting on a walkable floor.
    #[default]
    Ground,
    /// Airborne. Driven by the engine's falling stepper.
    Falling,
    /// Crouched slide along a surface.
    Slide,
}

impl MovementMode {
    /// Pack into the single byte sent over the wire.
    pub fn pack(self) -> u8 {
        match self {
            Self::Ground => PACKED_WALKING,
            Self::Falling => PACKED_FALLING,
            Self::Slide => PACKED_CUSTOM | (CUSTOM_SLIDE << 4),
        }
    }

    /// Unpack a wire byte.
    pub fn unpack(packed: u8) -> Result<Self, ModeError> {
        match (packed & 0x0F, packed >> 4) {
            (PACKED_WALKING, 0) => Ok(Self::Ground),
            (PACKED_FALLING, 0) => Ok(Self::Falling),
            (PACKED_CUSTOM, CUSTOM_SLIDE) => Ok(Self::Slide),
            _ => Err(ModeError::Unknown(packed)),
        }
    }

    /// Ground or Slide.
    #[inline]
    pub fn is_moving_on_ground(self) -> bool {
        matches!(self, Self::Ground | Self::Slide)
    }
}

impl std::fmt::Display for MovementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ground => "ground",
            Self::Falling => "falling",
            Self::Slide => "slide",
        };
        f.write_str(name)
    }
}
