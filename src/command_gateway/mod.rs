//! Command Gateway Module
//!
//! Text protocol for the control channel: one command per frame, at most
//! one reply.

pub mod service;
pub mod types;

pub use service::CommandGateway;
pub use types::*;
