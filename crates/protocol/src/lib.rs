//! Network protocol for slipstride movement replication.
//!
//! Defines the messages exchanged between a predicting client, the
//! authoritative server and observers. Uses binary encoding for minimal
//! bandwidth usage.

pub mod codec;
pub mod messages;

pub use codec::*;
pub use messages::*;
