//! Simulated hardware backends
//!
//! Used by the binary when no board support is linked in. Actuators log
//! their writes, the camera renders a moving test pattern in raw RGB so the
//! JPEG conversion path runs on every frame.

use super::{
    Flashlight, Frame, FrameSize, ImageSource, LinkMonitor, Motor, MotorDriver, PanServo,
    PixelFormat, SystemControl,
};
use crate::error::Result;
use bytes::Bytes;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Frame buffers the sensor driver can have outstanding at once
const FRAME_BUFFER_COUNT: usize = 2;

#[derive(Default)]
pub struct LoggingMotorDriver;

impl MotorDriver for LoggingMotorDriver {
    fn set_speed(&self, motor: Motor, duty: i16) {
        tracing::debug!(motor = ?motor, duty = duty, "Motor duty");
    }

    fn stop(&self, motor: Motor) {
        tracing::debug!(motor = ?motor, "Motor stop");
    }
}

#[derive(Default)]
pub struct LoggingPanServo;

impl PanServo for LoggingPanServo {
    fn set_angle(&self, angle: u8) {
        tracing::trace!(angle = angle, "Servo angle");
    }
}

#[derive(Default)]
pub struct LoggingFlashlight;

impl Flashlight for LoggingFlashlight {
    fn set(&self, on: bool) {
        tracing::debug!(on = on, "Flash LED");
    }
}

/// Test-pattern camera
pub struct TestPatternCamera {
    resolution: Mutex<FrameSize>,
    sequence: AtomicU64,
    outstanding: AtomicUsize,
    initialized: AtomicBool,
}

impl TestPatternCamera {
    pub fn new(initial: FrameSize) -> Self {
        Self {
            resolution: Mutex::new(initial),
            sequence: AtomicU64::new(0),
            outstanding: AtomicUsize::new(0),
            initialized: AtomicBool::new(false),
        }
    }

    fn current(&self) -> FrameSize {
        *self
            .resolution
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Diagonal gradient that scrolls one pixel per frame
    fn render(width: u32, height: u32, shift: u64) -> Vec<u8> {
        let mut pixels = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = ((x as u64 + y as u64 + shift) % 256) as u8;
                pixels.extend_from_slice(&[v, 255 - v, (y % 256) as u8]);
            }
        }
        pixels
    }
}

impl ImageSource for TestPatternCamera {
    fn init(&self) -> Result<()> {
        self.initialized.store(true, Ordering::SeqCst);
        tracing::info!(resolution = %self.current(), "Test pattern camera initialized");
        Ok(())
    }

    fn acquire_frame(&self) -> Option<Frame> {
        if !self.initialized.load(Ordering::SeqCst) {
            return None;
        }
        let reserved = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < FRAME_BUFFER_COUNT).then_some(n + 1)
            })
            .is_ok();
        if !reserved {
            return None;
        }

        let (width, height) = self.current().dimensions();
        let shift = self.sequence.fetch_add(1, Ordering::Relaxed);
        Some(Frame {
            data: Bytes::from(Self::render(width, height, shift)),
            format: PixelFormat::Rgb888,
            width,
            height,
            captured_at: Utc::now(),
        })
    }

    fn release_frame(&self, _frame: Frame) {
        let _ = self
            .outstanding
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    fn set_resolution(&self, size: FrameSize) -> bool {
        *self
            .resolution
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = size;
        tracing::info!(resolution = %size, "Test pattern resolution changed");
        true
    }

    fn resolution(&self) -> FrameSize {
        self.current()
    }
}

/// Link monitor reporting a fixed signal strength
pub struct StaticLink {
    rssi: i32,
}

impl StaticLink {
    pub fn new(rssi: i32) -> Self {
        Self { rssi }
    }
}

impl LinkMonitor for StaticLink {
    fn rssi(&self) -> i32 {
        self.rssi
    }

    fn is_connected(&self) -> bool {
        true
    }
}

/// Process control for a supervised host process
///
/// `restart` wakes the main task, which shuts the servers down and exits so
/// the supervisor can start a fresh process.
pub struct SupervisedProcess {
    credentials_path: PathBuf,
    restart: Arc<Notify>,
}

impl SupervisedProcess {
    pub fn new(credentials_path: PathBuf) -> Self {
        Self {
            credentials_path,
            restart: Arc::new(Notify::new()),
        }
    }

    /// Handle the main task waits on
    pub fn restart_signal(&self) -> Arc<Notify> {
        self.restart.clone()
    }
}

impl SystemControl for SupervisedProcess {
    fn clear_credentials(&self) -> Result<()> {
        match std::fs::remove_file(&self.credentials_path) {
            Ok(()) => {
                tracing::info!(path = %self.credentials_path.display(), "Network credentials cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn restart(&self) {
        tracing::warn!("Restart requested");
        self.restart.notify_one();
    }
}
