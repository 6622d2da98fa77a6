//! Collision detection backing the reference locomotion engine.
//!
//! # Key Types
//!
//! - [`CollisionWorld`]: The collision environment containing all geometry
//! - [`TraceResult`]: Output from a collision trace
//! - [`TraceShape`]: Shape used for tracing (capsule or point)
//!
//! Traces sweep a shape through the world and return how far it traveled,
//! the final position, the surface normal at impact and the owner of the
//! geometry that was hit.

mod flags;
mod trace;
mod world;

pub use flags::ContentFlags;
pub use trace::{TraceResult, TraceShape};
pub use world::{CollisionBrush, CollisionWorld};
