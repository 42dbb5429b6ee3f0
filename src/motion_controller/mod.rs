//! Motion Controller Module
//!
//! Drive motors and camera pan: eased servo motion and the auto-stop
//! watchdog that halts the car when commands stop arriving.

pub mod controller;
pub mod service;
pub mod types;

pub use controller::MotionController;
pub use service::{MotionService, MotionTicker, DEFAULT_TICK_MS};
pub use types::*;
