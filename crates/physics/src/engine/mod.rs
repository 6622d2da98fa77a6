//! Locomotion engine seam.
//!
//! The movement core never touches collision geometry directly. Everything
//! it needs from the host (floor probes, swept moves, the stock walking and
//! falling steppers, velocity integration) goes through
//! [`LocomotionEngine`]. [`WorldEngine`] is the reference implementation
//! over a [`CollisionWorld`](crate::collision::CollisionWorld).

mod config;
mod slide_move;
mod velocity;
mod world_engine;

pub use config::EngineConfig;
pub use slide_move::{clip_velocity, slide_move, step_slide_move, SlideResult};
pub use velocity::{apply_braking, calc_velocity, VelocityParams, MIN_TICK_TIME};
pub use world_engine::WorldEngine;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::actor::{ActorId, IgnoreSet};
use crate::collision::TraceShape;

/// Acceleration directions closer than this (cosine) may be combined.
pub const ACCEL_DOT_THRESHOLD_COMBINE: f32 = 0.996;

/// Acceleration magnitudes further apart than this may not be combined.
pub const ACCEL_MAG_THRESHOLD_COMBINE: f32 = 1.0;

// ============================================================================
// Body and shape
// ============================================================================

/// Vertical collision capsule. Positions are capsule centers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    /// Radius (cm).
    pub radius: f32,
    /// Half height including the caps (cm).
    pub half_height: f32,
}

impl Capsule {
    /// Standing character capsule.
    pub const STANDING: Capsule = Capsule {
        radius: 34.0,
        half_height: 88.0,
    };

    /// The capsule as a trace shape.
    pub fn shape(&self) -> TraceShape {
        TraceShape::Capsule {
            radius: self.radius,
            half_height: self.half_height,
        }
    }
}

/// Kinematic state the engine reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    /// Capsule center in world space.
    pub position: Vec3,
    /// Body orientation.
    pub rotation: Quat,
    /// Velocity (cm/s).
    pub velocity: Vec3,
}

impl Default for Kinematics {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
        }
    }
}

// ============================================================================
// Query results
// ============================================================================

/// A surface found by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceHit {
    /// Impact point.
    pub point: Vec3,
    /// Surface normal, unit length.
    pub normal: Vec3,
    /// Distance from the probe origin.
    pub distance: f32,
    /// Actor owning the surface. `None` for level geometry.
    pub actor: Option<ActorId>,
}

/// Floor below a capsule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorHit {
    /// The surface that was hit.
    pub surface: SurfaceHit,
    /// Gap between capsule bottom and the floor. Negative when penetrating.
    pub floor_distance: f32,
    /// Whether the surface is flat enough to stand on.
    pub walkable: bool,
}

/// Blocking hit from a swept move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepHit {
    /// Fraction of the requested delta traveled before the hit, in [0, 1].
    pub time: f32,
    /// Normal of the blocking surface.
    pub normal: Vec3,
    /// Whether the sweep started inside geometry.
    pub started_penetrating: bool,
    /// Actor owning the blocking geometry.
    pub actor: Option<ActorId>,
}

/// Movement mode the stock steppers leave the body in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Standing on a walkable floor.
    Grounded,
    /// No walkable floor in reach.
    Airborne,
}

/// What the combine predicate needs to know about a recorded move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveSample {
    /// Tick duration (seconds).
    pub delta_time: f32,
    /// Input acceleration.
    pub acceleration: Vec3,
    /// Packed movement mode before the tick.
    pub start_mode: u8,
    /// Packed movement mode after the tick.
    pub end_mode: u8,
}

// ============================================================================
// Engine-owned intent bits
// ============================================================================

/// Bits 0-3 of the compressed movement byte belong to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EngineFlags(pub u8);

impl EngineFlags {
    /// Jump was held this tick.
    pub const JUMP_PRESSED: u8 = 0x01;
    /// Engine-level crouch request.
    pub const WANTS_CROUCH: u8 = 0x02;
    /// Free for host use.
    pub const RESERVED_1: u8 = 0x04;
    /// Free for host use.
    pub const RESERVED_2: u8 = 0x08;
    /// Every bit the engine owns.
    pub const MASK: u8 = 0x0F;

    /// Build from raw bits, keeping only engine-owned ones.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw bits.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Check whether a flag is set.
    pub fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    /// Set or clear a flag.
    pub fn set(&mut self, flag: u8, on: bool) {
        if on {
            self.0 |= flag & Self::MASK;
        } else {
            self.0 &= !flag;
        }
    }
}

// ============================================================================
// Engine trait
// ============================================================================

/// Host locomotion services used by the movement core.
///
/// Implementations must be deterministic: the same inputs against the
/// same world always produce the same outputs. Client prediction and
/// server replay depend on it.
pub trait LocomotionEngine {
    /// Cast a line straight down from `origin`.
    fn probe_down(&self, origin: Vec3, max_distance: f32, ignore: &IgnoreSet) -> Option<SurfaceHit>;

    /// Find the floor below a capsule centered at `position`.
    fn find_floor(&self, position: Vec3, capsule: Capsule, ignore: &IgnoreSet) -> Option<FloorHit>;

    /// Sweep the body by `delta`, setting its rotation to `rotation`.
    ///
    /// Moves as far as possible and returns the blocking hit, if any.
    fn sweep_move(
        &self,
        body: &mut Kinematics,
        delta: Vec3,
        rotation: Quat,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> Option<SweepHit>;

    /// Continue a blocked sweep along the blocking surface.
    ///
    /// `time` is the unspent fraction of `delta`. Returns the fraction of
    /// `delta` that was applied.
    fn slide_along_surface(
        &self,
        body: &mut Kinematics,
        delta: Vec3,
        time: f32,
        normal: Vec3,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> f32;

    /// Notify the host of a blocking impact. No-op by default.
    fn handle_impact(&self, _hit: &SweepHit) {}

    /// Integrate velocity with friction, braking and a speed cap.
    fn calc_velocity(
        &self,
        velocity: Vec3,
        acceleration: Vec3,
        delta_time: f32,
        params: &VelocityParams,
    ) -> Vec3 {
        calc_velocity(velocity, acceleration, delta_time, params)
    }

    /// Stock walking stepper.
    fn step_walking(
        &self,
        body: &mut Kinematics,
        acceleration: Vec3,
        delta_time: f32,
        params: &VelocityParams,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> StepOutcome;

    /// Stock falling stepper.
    fn step_falling(
        &self,
        body: &mut Kinematics,
        acceleration: Vec3,
        delta_time: f32,
        params: &VelocityParams,
        capsule: Capsule,
        ignore: &IgnoreSet,
    ) -> StepOutcome;

    /// Whether two consecutive recorded moves may be sent as one.
    fn can_combine_moves(&self, earlier: &MoveSample, later: &MoveSample, max_delta: f32) -> bool {
        default_can_combine(earlier, later, max_delta)
    }
}

/// Stock combine predicate.
///
/// Moves combine when they keep the same movement modes, the summed tick
/// fits `max_delta`, and their accelerations point the same way with the
/// same magnitude.
pub fn default_can_combine(earlier: &MoveSample, later: &MoveSample, max_delta: f32) -> bool {
    if earlier.start_mode != later.start_mode || earlier.end_mode != later.end_mode {
        return false;
    }

    if earlier.delta_time + later.delta_time > max_delta {
        return false;
    }

    let a = earlier.acceleration;
    let b = later.acceleration;
    let a_zero = a.length_squared() < 1e-8;
    let b_zero = b.length_squared() < 1e-8;
    if a_zero || b_zero {
        return a_zero && b_zero;
    }

    if a.normalize().dot(b.normalize()) < ACCEL_DOT_THRESHOLD_COMBINE {
        return false;
    }

    (a.length() - b.length()).abs() <= ACCEL_MAG_THRESHOLD_COMBINE
}
