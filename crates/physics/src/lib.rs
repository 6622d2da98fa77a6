//! Slipstride Physics
//!
//! Collision queries and the locomotion engine seam the character movement
//! core runs on.
//!
//! # Architecture
//!
//! - **Collision**: Traces capsules and rays through static and actor-owned
//!   geometry, honouring per-query ignore sets
//! - **Engine**: The [`LocomotionEngine`] trait plus a reference
//!   implementation, [`WorldEngine`], with stock walking and falling
//!   steppers
//!
//! Everything here is deterministic: the same inputs against the same world
//! produce bit-identical outputs, which client prediction and server replay
//! rely on.

pub mod actor;
pub mod collision;
pub mod engine;

pub use actor::{ActorId, IgnoreSet};
pub use collision::{CollisionWorld, ContentFlags, TraceResult, TraceShape};
pub use engine::{
    Capsule, EngineConfig, EngineFlags, FloorHit, Kinematics, LocomotionEngine, MoveSample,
    StepOutcome, SurfaceHit, SweepHit, VelocityParams, WorldEngine, MIN_TICK_TIME,
};
