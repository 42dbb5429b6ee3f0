//! Command Gateway Service
//!
//! Decodes one control frame, dispatches it, and yields at most one reply.

use super::types::{Command, ParseError};
use crate::hardware::{FrameSize, Flashlight, ImageSource, LinkMonitor, SystemControl};
use crate::motion_controller::MotionService;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const FLASH_ON_REPLY: &str = "Flash-ON";
pub const FLASH_OFF_REPLY: &str = "Flash-OFF";

pub fn flash_reply(on: bool) -> &'static str {
    if on {
        FLASH_ON_REPLY
    } else {
        FLASH_OFF_REPLY
    }
}

pub fn link_status(connected: bool) -> String {
    format!("WIFI-{}", u8::from(connected))
}

pub fn frame_size_status(size: FrameSize) -> String {
    format!("FRAMESIZE-{}", size.name())
}

pub fn pong_reply(rssi: i32) -> String {
    format!("pong-{}", rssi.unsigned_abs())
}

pub struct CommandGateway {
    motion: Arc<MotionService>,
    camera: Arc<dyn ImageSource>,
    flashlight: Arc<dyn Flashlight>,
    link: Arc<dyn LinkMonitor>,
    system: Arc<dyn SystemControl>,
    /// Held across the LED write and the cap update
    flash_on: Mutex<bool>,
}

impl CommandGateway {
    pub fn new(
        motion: Arc<MotionService>,
        camera: Arc<dyn ImageSource>,
        flashlight: Arc<dyn Flashlight>,
        link: Arc<dyn LinkMonitor>,
        system: Arc<dyn SystemControl>,
    ) -> Self {
        flashlight.set(false);
        Self {
            motion,
            camera,
            flashlight,
            link,
            system,
            flash_on: Mutex::new(false),
        }
    }

    /// Handle one inbound text frame
    pub async fn dispatch(&self, frame: &str) -> Option<String> {
        match frame.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(ParseError::Unknown(raw)) => {
                tracing::warn!(command = %raw, "Unknown command");
                None
            }
            Err(e @ ParseError::MalformedPayload { .. }) => {
                tracing::debug!(error = %e, "Ignoring malformed command");
                None
            }
        }
    }

    pub async fn execute(&self, command: Command) -> Option<String> {
        tracing::debug!(command = ?command, "Dispatching command");

        match command {
            Command::ToggleFlash => {
                let on = self.toggle_flash().await;
                Some(flash_reply(on).to_string())
            }
            Command::SetPan { x, .. } => {
                self.motion.set_pan_target(x).await;
                None
            }
            Command::Ping => Some(pong_reply(self.link.rssi())),
            Command::Move(direction) => {
                self.motion.issue_move(direction).await;
                None
            }
            Command::Stop => {
                self.motion.stop().await;
                None
            }
            Command::SetResolution(size) => {
                if !self.camera.set_resolution(size) {
                    tracing::warn!(resolution = %size, "Image source rejected resolution");
                }
                None
            }
            Command::ResetCredentials => {
                self.reset().await;
                None
            }
        }
    }

    /// Flip the flash LED; returns the new state
    pub async fn toggle_flash(&self) -> bool {
        let mut flash_on = self.flash_on.lock().await;
        *flash_on = !*flash_on;
        self.flashlight.set(*flash_on);
        self.motion.set_flash_cap(*flash_on).await;
        tracing::info!(flash_on = *flash_on, "Flash toggled");
        *flash_on
    }

    pub async fn flash_on(&self) -> bool {
        *self.flash_on.lock().await
    }

    pub fn link_connected(&self) -> bool {
        self.link.is_connected()
    }

    /// Status frames pushed to a newly attached controller
    pub async fn initial_status(&self) -> Vec<String> {
        vec![
            flash_reply(self.flash_on().await).to_string(),
            link_status(self.link.is_connected()),
            frame_size_status(self.camera.resolution()),
        ]
    }

    async fn reset(&self) {
        tracing::warn!("Credential reset requested");
        self.motion.stop().await;
        if let Err(e) = self.system.clear_credentials() {
            tracing::error!(error = %e, "Failed to clear network credentials");
        }
        self.system.restart();
    }
}
