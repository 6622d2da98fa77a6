//! Reference engine tuning.
//!
//! Values are in world units (centimetres) and seconds, matching the scale
//! the movement core is tuned for.

use serde::{Deserialize, Serialize};

/// Configuration of the reference locomotion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    // ========================================================================
    // Physics
    // ========================================================================
    /// Gravity acceleration (cm/s²).
    pub gravity: f32,

    /// Fraction of input acceleration applied while airborne.
    pub air_control: f32,

    /// Lateral friction while airborne.
    pub falling_lateral_friction: f32,

    // ========================================================================
    // Floors
    // ========================================================================
    /// Minimum surface normal Y to be considered a walkable floor.
    /// 0.71 ≈ 45 degrees.
    pub walkable_floor_y: f32,

    /// Lower bound of the gap kept between capsule bottom and floor.
    pub min_floor_distance: f32,

    /// Upper bound of the gap kept between capsule bottom and floor.
    pub max_floor_distance: f32,

    /// How far below the capsule a walking character still snaps down
    /// (stairs, small ledges).
    pub max_step_height: f32,

    // ========================================================================
    // Collision
    // ========================================================================
    /// Maximum collision planes per slide move.
    pub max_clip_planes: usize,

    /// Overbounce factor for velocity reflection (prevents sticking).
    pub overbounce: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: 980.0,
            air_control: 0.35,
            falling_lateral_friction: 0.0,

            walkable_floor_y: 0.71,
            min_floor_distance: 1.9,
            max_floor_distance: 2.4,
            max_step_height: 45.0,

            max_clip_planes: 5,
            overbounce: 1.001,
        }
    }
}

impl EngineConfig {
    /// Gap the floor snap aims for.
    pub fn target_floor_distance(&self) -> f32 {
        (self.min_floor_distance + self.max_floor_distance) * 0.5
    }
}
