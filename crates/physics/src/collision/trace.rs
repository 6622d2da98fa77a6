//! Trace results and shapes for collision queries.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::flags::ContentFlags;
use crate::actor::ActorId;

/// Outcome of sweeping a shape from a start to an end position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceResult {
    /// Share of the path travelled before the first blocking contact.
    /// `1.0` when nothing was hit.
    pub fraction: f32,

    /// Shape center where the sweep stopped, just outside any blocker.
    pub end_position: Vec3,

    /// Surface normal at the impact point, pointing away from the surface.
    /// `None` if no collision occurred.
    pub hit_normal: Option<Vec3>,

    /// Content flags of what was hit.
    pub hit_contents: ContentFlags,

    /// Whether the trace started inside solid geometry.
    pub started_in_solid: bool,

    /// Whether the trace could not move at all out of solid geometry.
    pub all_solid: bool,

    /// Actor owning the geometry that was hit. `None` for world geometry.
    pub hit_actor: Option<ActorId>,
}

impl Default for TraceResult {
    fn default() -> Self {
        Self::no_hit(Vec3::ZERO)
    }
}

impl TraceResult {
    /// Unobstructed sweep ending at `end_position`.
    pub fn no_hit(end_position: Vec3) -> Self {
        Self {
            fraction: 1.0,
            end_position,
            hit_normal: None,
            hit_contents: ContentFlags::EMPTY,
            started_in_solid: false,
            all_solid: false,
            hit_actor: None,
        }
    }

    /// Whether the sweep stopped early.
    #[inline]
    pub fn hit_something(&self) -> bool {
        self.fraction < 1.0
    }

    /// Hit normal, or up for a miss.
    #[inline]
    pub fn normal_or_up(&self) -> Vec3 {
        self.hit_normal.unwrap_or(Vec3::Y)
    }
}

/// Shape used for collision traces.
///
/// Positions passed alongside a shape are the shape's center, matching how
/// a character's location is the center of its capsule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TraceShape {
    /// A vertical capsule.
    Capsule {
        /// Radius of the capsule cylinder and end caps.
        radius: f32,
        /// Half of the total height, caps included.
        half_height: f32,
    },

    /// A single point. Used for line probes.
    Point,
}
