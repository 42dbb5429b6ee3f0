//! Application state
//!
//! Holds all shared components and state

use crate::command_gateway::CommandGateway;
use crate::control_hub::ControlHub;
use crate::hardware::{
    Flashlight, FrameSize, ImageSource, LinkMonitor, MotorDriver, PanServo, SystemControl,
};
use crate::motion_controller::{MotionController, MotionService, DEFAULT_TICK_MS};
use crate::stream_gatekeeper::StreamGatekeeper;
use std::path::PathBuf;
use std::sync::Arc;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host
    pub host: String,
    /// Control port (page, WebSocket, capture, resolution)
    pub port: u16,
    /// Stream port (`/stream` only)
    pub stream_port: u16,
    /// Directory holding index.min.html / busy.min.html and other assets
    pub static_dir: PathBuf,
    /// Stored network credentials, removed by `reset`
    pub wifi_credentials_path: PathBuf,
    /// Resolution applied when a stream session starts
    pub stream_frame_size: Option<FrameSize>,
    /// Resolution at startup
    pub initial_frame_size: FrameSize,
    /// Motion controller tick period
    pub motion_tick_ms: u64,
    /// Signal strength reported by the simulated link
    pub sim_rssi: i32,
    /// Delay before restarting after a fatal init failure
    pub restart_delay_secs: u64,
}

fn env_frame_size(key: &str) -> Option<FrameSize> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(size) => Some(size),
        Err(e) => {
            tracing::warn!(key = key, error = %e, "Ignoring invalid frame size");
            None
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT", 80),
            stream_port: env_parse("STREAM_PORT", 81),
            static_dir: std::env::var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/opt/camcar/www")),
            wifi_credentials_path: std::env::var("WIFI_CREDENTIALS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/camcar/wifi.json")),
            stream_frame_size: env_frame_size("STREAM_FRAME_SIZE"),
            initial_frame_size: env_frame_size("INITIAL_FRAME_SIZE").unwrap_or(FrameSize::Qvga),
            motion_tick_ms: env_parse("MOTION_TICK_MS", DEFAULT_TICK_MS),
            sim_rssi: env_parse("SIM_RSSI", -55),
            restart_delay_secs: env_parse("RESTART_DELAY_SECS", 5),
        }
    }
}

/// Hardware backends injected at startup
#[derive(Clone)]
pub struct Hardware {
    pub motors: Arc<dyn MotorDriver>,
    pub servo: Arc<dyn PanServo>,
    pub flashlight: Arc<dyn Flashlight>,
    pub camera: Arc<dyn ImageSource>,
    pub link: Arc<dyn LinkMonitor>,
    pub system: Arc<dyn SystemControl>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// Motion controller (pan easing, drive, auto-stop)
    pub motion: Arc<MotionService>,
    /// Control channel dispatcher
    pub gateway: Arc<CommandGateway>,
    /// Exclusive stream access
    pub gatekeeper: Arc<StreamGatekeeper>,
    /// Control connections
    pub hub: Arc<ControlHub>,
    /// Image source, also used directly by single-shot capture
    pub camera: Arc<dyn ImageSource>,
}

impl AppState {
    /// Wire all components onto the given hardware
    pub fn new(config: AppConfig, hardware: Hardware) -> Self {
        let motion = Arc::new(MotionService::new(MotionController::new(
            hardware.motors,
            hardware.servo,
        )));
        let gateway = Arc::new(CommandGateway::new(
            motion.clone(),
            hardware.camera.clone(),
            hardware.flashlight,
            hardware.link,
            hardware.system,
        ));
        let gatekeeper = Arc::new(StreamGatekeeper::new(
            hardware.camera.clone(),
            config.stream_frame_size,
        ));

        Self {
            config,
            motion,
            gateway,
            gatekeeper,
            hub: Arc::new(ControlHub::new()),
            camera: hardware.camera,
        }
    }
}
