//! Slipstride Movement
//!
//! Walk, sprint, slide and dash for a character whose movement is predicted
//! on the controlling client and verified by an authoritative server.
//!
//! # Architecture
//!
//! - **Intent**: Input handlers commit "wants" flags; each tick they are
//!   captured into a [`MovementIntent`] and packed into a
//!   [`CompressedIntent`] for the wire
//! - **Machine**: [`simulate_tick`] runs mode transitions, the dash guard
//!   and the mode physics against a [`LocomotionEngine`]
//! - **Prediction**: [`PredictingClient`] records moves in a
//!   [`MoveHistory`], [`AuthoritativeMovement`] re-simulates them and
//!   acknowledges or corrects
//!
//! The simulation is deterministic. Replaying the same records from the
//! same state gives the same result on every peer.
//!
//! [`LocomotionEngine`]: slipstride_physics::LocomotionEngine

pub mod character;
pub mod codec;
pub mod component;
pub mod config;
pub mod dash;
pub mod events;
pub mod frame;
pub mod guard;
pub mod history;
pub mod intent;
pub mod look;
pub mod machine;
pub mod mode;
pub mod net;
pub mod retry;
pub mod slide;
pub mod state;

pub use character::{CharacterBody, CharacterHooks, CharacterId, Role};
pub use codec::CompressedIntent;
pub use component::MovementComponent;
pub use config::{ConfigError, DashImpulses, MovementConfig, PredictionConfig};
pub use events::{DashDirection, MovementEvent, MovementEvents, NoEvents};
pub use history::{MoveHistory, MoveRecord};
pub use intent::MovementIntent;
pub use look::{LookLimiter, LookLimits};
pub use machine::{apply_move, replay, simulate_tick, TickContext, TickInput};
pub use mode::{ModeError, MovementMode};
pub use net::{
    AuthoritativeMovement, ClientMove, MoveAck, MoveCorrection, PredictingClient, ProxyState,
    ServerReply, SimulatedProxy,
};
pub use retry::DashRetryScheduler;
pub use state::{CooldownTimer, MovementState, RootMotion};
