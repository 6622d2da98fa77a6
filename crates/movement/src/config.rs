//! Movement configuration.
//!
//! All movement parameters are grouped here for easy tuning. Values are in
//! centimetres and seconds.

use serde::{Deserialize, Serialize};
use slipstride_physics::Capsule;
use thiserror::Error;

use crate::mode::MovementMode;

/// Errors reported by [`MovementConfig::validate`] and
/// [`PredictionConfig::validate`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },

    #[error("authoritative dash cooldown {authority}s exceeds client cooldown {client}s")]
    AuthorityCooldown { authority: f32, client: f32 },

    #[error("slide min speed {min} must be below slide max speed {max}")]
    SlideSpeedRange { min: f32, max: f32 },

    #[error("capsule radius {radius} exceeds half height {half_height}")]
    Capsule { radius: f32, half_height: f32 },
}

/// Impulse magnitude for each discretized dash direction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DashImpulses {
    pub forward: f32,
    pub backward: f32,
    pub left: f32,
    pub right: f32,
}

impl DashImpulses {
    /// Same impulse in every direction.
    pub const fn uniform(impulse: f32) -> Self {
        Self {
            forward: impulse,
            backward: impulse,
            left: impulse,
            right: impulse,
        }
    }
}

/// Configuration for character movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    // ========================================================================
    // Character
    // ========================================================================
    /// Collision capsule.
    pub capsule: Capsule,

    // ========================================================================
    // Ground
    // ========================================================================
    /// Walking speed (cm/s).
    pub walk_speed: f32,

    /// Crouched walking speed (cm/s).
    pub crouch_speed: f32,

    /// Acceleration produced by full input (cm/s²).
    pub max_acceleration: f32,

    /// Ground friction coefficient.
    pub ground_friction: f32,

    /// Braking deceleration while walking (cm/s²).
    pub walking_braking_deceleration: f32,

    /// Braking deceleration while falling (cm/s²).
    pub falling_braking_deceleration: f32,

    // ========================================================================
    // Sprint
    // ========================================================================
    /// Sprinting speed (cm/s).
    pub sprint_speed: f32,

    /// Minimum speed before sprinting may start (cm/s).
    pub sprint_min_speed: f32,

    // ========================================================================
    // Slide
    // ========================================================================
    /// Below this speed a slide cannot start or continue (cm/s).
    pub slide_min_speed: f32,

    /// Speed cap while sliding (cm/s).
    pub slide_max_speed: f32,

    /// Braking deceleration while sliding (cm/s²).
    pub slide_braking_deceleration: f32,

    /// Speed boost along the horizontal velocity on slide entry (cm/s).
    pub slide_enter_impulse: f32,

    /// Downward acceleration keeping the slide glued to the surface (cm/s²).
    pub slide_gravity: f32,

    /// Friction while sliding.
    pub slide_friction: f32,

    /// Zero velocity when a slide ends.
    pub slide_reset_velocity: bool,

    /// Eligibility probe length, in capsule half heights.
    pub slide_probe_scale: f32,

    /// Surface probe length during the slide, in capsule half heights.
    pub slide_surface_probe_scale: f32,

    /// Half width of the look-yaw window while sliding (degrees).
    pub slide_yaw_deviation: f32,

    // ========================================================================
    // Dash
    // ========================================================================
    /// Impulse per dash direction (cm/s).
    pub dash_impulse: DashImpulses,

    /// Client-facing cooldown between dashes (seconds).
    pub dash_cooldown: f32,

    /// Stricter cooldown the authority enforces on remote characters
    /// (seconds). Shorter than `dash_cooldown` to absorb clock skew.
    pub dash_authority_cooldown: f32,

    /// Upward component added to the horizontal dash direction.
    pub dash_up_bias: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            capsule: Capsule::STANDING,

            // Ground
            walk_speed: 300.0,
            crouch_speed: 150.0,
            max_acceleration: 2048.0,
            ground_friction: 8.0,
            walking_braking_deceleration: 2048.0,
            falling_braking_deceleration: 0.0,

            // Sprint
            sprint_speed: 550.0,
            sprint_min_speed: 10.0,

            // Slide
            slide_min_speed: 200.0,
            slide_max_speed: 600.0,
            slide_braking_deceleration: 2048.0,
            slide_enter_impulse: 500.0,
            slide_gravity: 5000.0,
            slide_friction: 1.3,
            slide_reset_velocity: false,
            slide_probe_scale: 2.5,
            slide_surface_probe_scale: 2.0,
            slide_yaw_deviation: 20.0,

            // Dash
            dash_impulse: DashImpulses::uniform(100.0),
            dash_cooldown: 1.0,
            dash_authority_cooldown: 0.9,
            dash_up_bias: 0.1,
        }
    }
}

impl MovementConfig {
    /// Fast movement with long slides and strong dashes.
    pub fn arcade() -> Self {
        Self {
            walk_speed: 450.0,
            sprint_speed: 800.0,
            slide_max_speed: 900.0,
            slide_enter_impulse: 700.0,
            slide_friction: 0.8,
            dash_impulse: DashImpulses {
                forward: 900.0,
                backward: 600.0,
                left: 750.0,
                right: 750.0,
            },
            dash_cooldown: 0.6,
            dash_authority_cooldown: 0.5,
            ..Default::default()
        }
    }

    /// Slower, heavier movement.
    pub fn tactical() -> Self {
        Self {
            walk_speed: 250.0,
            sprint_speed: 450.0,
            slide_min_speed: 250.0,
            slide_enter_impulse: 300.0,
            slide_friction: 2.0,
            dash_cooldown: 1.5,
            dash_authority_cooldown: 1.3,
            ..Default::default()
        }
    }

    /// Check the configuration for values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("capsule.radius", self.capsule.radius)?;
        positive("capsule.half_height", self.capsule.half_height)?;
        if self.capsule.radius > self.capsule.half_height {
            return Err(ConfigError::Capsule {
                radius: self.capsule.radius,
                half_height: self.capsule.half_height,
            });
        }

        positive("walk_speed", self.walk_speed)?;
        positive("crouch_speed", self.crouch_speed)?;
        positive("sprint_speed", self.sprint_speed)?;
        positive("max_acceleration", self.max_acceleration)?;
        non_negative("ground_friction", self.ground_friction)?;
        non_negative("walking_braking_deceleration", self.walking_braking_deceleration)?;
        non_negative("falling_braking_deceleration", self.falling_braking_deceleration)?;

        non_negative("slide_min_speed", self.slide_min_speed)?;
        if self.slide_min_speed >= self.slide_max_speed {
            return Err(ConfigError::SlideSpeedRange {
                min: self.slide_min_speed,
                max: self.slide_max_speed,
            });
        }
        non_negative("slide_friction", self.slide_friction)?;
        non_negative("slide_gravity", self.slide_gravity)?;
        positive("slide_probe_scale", self.slide_probe_scale)?;
        positive("slide_surface_probe_scale", self.slide_surface_probe_scale)?;
        non_negative("slide_yaw_deviation", self.slide_yaw_deviation)?;

        non_negative("dash_impulse.forward", self.dash_impulse.forward)?;
        non_negative("dash_impulse.backward", self.dash_impulse.backward)?;
        non_negative("dash_impulse.left", self.dash_impulse.left)?;
        non_negative("dash_impulse.right", self.dash_impulse.right)?;
        positive("dash_cooldown", self.dash_cooldown)?;
        positive("dash_authority_cooldown", self.dash_authority_cooldown)?;
        if self.dash_authority_cooldown > self.dash_cooldown {
            return Err(ConfigError::AuthorityCooldown {
                authority: self.dash_authority_cooldown,
                client: self.dash_cooldown,
            });
        }

        Ok(())
    }

    /// Max speed for a mode.
    pub fn max_speed(&self, mode: MovementMode, wants_sprint: bool, crouched: bool) -> f32 {
        match mode {
            MovementMode::Ground if crouched => self.crouch_speed,
            MovementMode::Ground if wants_sprint => self.sprint_speed,
            MovementMode::Ground | MovementMode::Falling => self.walk_speed,
            MovementMode::Slide => self.slide_max_speed,
        }
    }

    /// Max braking deceleration for a mode.
    pub fn max_braking_deceleration(&self, mode: MovementMode) -> f32 {
        match mode {
            MovementMode::Ground => self.walking_braking_deceleration,
            MovementMode::Falling => self.falling_braking_deceleration,
            MovementMode::Slide => self.slide_braking_deceleration,
        }
    }

    /// Max speed for a packed wire mode. Unknown modes log an error and
    /// report zero.
    pub fn max_speed_packed(&self, packed: u8, wants_sprint: bool, crouched: bool) -> f32 {
        match MovementMode::unpack(packed) {
            Ok(mode) => self.max_speed(mode, wants_sprint, crouched),
            Err(e) => {
                log::error!("max speed query: {e}");
                0.0
            }
        }
    }

    /// Max braking deceleration for a packed wire mode. Unknown modes log an
    /// error and report zero.
    pub fn max_braking_deceleration_packed(&self, packed: u8) -> f32 {
        match MovementMode::unpack(packed) {
            Ok(mode) => self.max_braking_deceleration(mode),
            Err(e) => {
                log::error!("max braking deceleration query: {e}");
                0.0
            }
        }
    }
}

/// Tuning for client prediction and server verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionConfig {
    /// Unacknowledged moves kept for replay.
    pub history_capacity: usize,

    /// Longest tick two combined moves may add up to (seconds).
    pub max_combined_delta: f32,

    /// Largest position disagreement the authority accepts (cm).
    pub position_tolerance: f32,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            history_capacity: 96,
            max_combined_delta: 0.125,
            position_tolerance: 5.0,
        }
    }
}

impl PredictionConfig {
    /// Check the configuration for values prediction cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::NotPositive {
                field: "history_capacity",
                value: 0.0,
            });
        }
        positive("max_combined_delta", self.max_combined_delta)?;
        positive("position_tolerance", self.position_tolerance)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}
