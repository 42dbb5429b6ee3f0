//! Camcar Server Library
//!
//! Teleoperated camera car controller: a two-motor drive base, a pan servo
//! carrying a camera, and a flash LED, driven from a browser.
//!
//! ## Architecture
//!
//! 1. Hardware - actuator, image source, link and system traits
//! 2. MotionController - pan easing, drive duties, auto-stop watchdog
//! 3. CommandGateway - control channel text protocol
//! 4. StreamGatekeeper - exclusive MJPEG stream
//! 5. ControlHub - control connection registry
//! 6. WebAPI - control port and stream port routers
//!
//! ## Design Principles
//!
//! - Shared state is injected through `AppState`, never global
//! - Hardware sits behind traits; tests run against `hardware::mock`
//! - Exclusive resources are held by guards and released on drop

pub mod command_gateway;
pub mod control_hub;
pub mod error;
pub mod hardware;
pub mod models;
pub mod motion_controller;
pub mod state;
pub mod stream_gatekeeper;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
