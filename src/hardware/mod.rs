//! Hardware boundary
//!
//! ## Responsibilities
//!
//! - Actuator primitives (drive motors, pan servo, flash LED)
//! - Image source access (acquire / release / resolution)
//! - Link and system control (signal strength, credential reset, restart)
//!
//! Actuator writes are fire-and-forget: they return `()` and callers never
//! branch on their outcome. Motion control must not block on I/O.

pub mod mock;
pub mod sim;
mod types;

pub use types::*;

use crate::error::Result;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use std::sync::Arc;
use std::time::Duration;

/// Default JPEG quality for frames converted from raw pixel formats
pub const JPEG_QUALITY: u8 = 80;

/// Drive motor output (H-bridge PWM pair per motor)
pub trait MotorDriver: Send + Sync {
    /// Signed duty: positive forward, negative backward, magnitude 0..=255
    fn set_speed(&self, motor: Motor, duty: i16);

    /// Zero duty on both bridge inputs
    fn stop(&self, motor: Motor);
}

/// Camera pan actuator
pub trait PanServo: Send + Sync {
    /// Angle in degrees, 0..=180
    fn set_angle(&self, angle: u8);
}

/// Illumination LED
pub trait Flashlight: Send + Sync {
    fn set(&self, on: bool);
}

/// Camera driver
pub trait ImageSource: Send + Sync {
    /// Bring up the sensor. Failure here is fatal for the process.
    fn init(&self) -> Result<()>;

    /// Take the next frame buffer, `None` when no frame is ready yet
    fn acquire_frame(&self) -> Option<Frame>;

    /// Hand a frame buffer back to the driver
    fn release_frame(&self, frame: Frame);

    /// Reconfigure the sensor. `false` when the sensor rejects the preset.
    fn set_resolution(&self, size: FrameSize) -> bool;

    fn resolution(&self) -> FrameSize;

    /// Convert a raw frame to JPEG. Frames already in JPEG pass through.
    fn encode_jpeg(&self, frame: &Frame) -> Option<Bytes> {
        encode_jpeg(frame, JPEG_QUALITY)
    }
}

/// Wireless link state
pub trait LinkMonitor: Send + Sync {
    /// Received signal strength in dBm (usually negative)
    fn rssi(&self) -> i32;

    fn is_connected(&self) -> bool;
}

/// Process-level control
pub trait SystemControl: Send + Sync {
    /// Forget stored network credentials
    fn clear_credentials(&self) -> Result<()>;

    /// Restart the process
    fn restart(&self);
}

/// Encode a frame to JPEG
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Option<Bytes> {
    let mut out = Vec::new();
    let result = {
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
        match frame.format {
            PixelFormat::Jpeg => return Some(frame.data.clone()),
            PixelFormat::Rgb888 => {
                let img = image::RgbImage::from_raw(frame.width, frame.height, frame.data.to_vec())?;
                encoder.encode_image(&img)
            }
            PixelFormat::Grayscale => {
                let img =
                    image::GrayImage::from_raw(frame.width, frame.height, frame.data.to_vec())?;
                encoder.encode_image(&img)
            }
        }
    };

    match result {
        Ok(()) => Some(Bytes::from(out)),
        Err(e) => {
            tracing::warn!(
                format = ?frame.format,
                width = frame.width,
                height = frame.height,
                error = %e,
                "JPEG conversion failed"
            );
            None
        }
    }
}

/// A frame held out of the image source. Dropping it returns the buffer.
pub struct FrameLease {
    source: Arc<dyn ImageSource>,
    frame: Option<Frame>,
}

impl FrameLease {
    /// Acquire one frame, `None` when the source has nothing ready
    pub fn acquire(source: &Arc<dyn ImageSource>) -> Option<Self> {
        source.acquire_frame().map(|frame| Self {
            source: source.clone(),
            frame: Some(frame),
        })
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Frame bytes in JPEG, converting if the sensor delivered raw pixels
    pub fn jpeg(&self) -> Option<Bytes> {
        let frame = self.frame.as_ref()?;
        match frame.format {
            PixelFormat::Jpeg => Some(frame.data.clone()),
            _ => self.source.encode_jpeg(frame),
        }
    }
}

impl Drop for FrameLease {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.source.release_frame(frame);
        }
    }
}

/// Bring up the image source, or schedule a restart
///
/// A camera that fails to initialize is fatal: the error is logged, the
/// process waits `restart_delay`, then asks `system` to restart and hands
/// the error back to the caller.
pub async fn init_or_restart(
    camera: &dyn ImageSource,
    system: &dyn SystemControl,
    restart_delay: Duration,
) -> Result<()> {
    match camera.init() {
        Ok(()) => {
            tracing::info!(resolution = %camera.resolution(), "Camera initialized");
            Ok(())
        }
        Err(e) => {
            tracing::error!(
                error = %e,
                delay_secs = restart_delay.as_secs(),
                "Camera init failed, restarting"
            );
            tokio::time::sleep(restart_delay).await;
            system.restart();
            Err(e)
        }
    }
}
