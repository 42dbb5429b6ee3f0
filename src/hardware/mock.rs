//! Recording hardware doubles
//!
//! Every write is captured so tests can assert on what the controllers
//! commanded without real GPIO.

use super::{
    Flashlight, Frame, FrameSize, ImageSource, LinkMonitor, Motor, MotorDriver, PanServo,
    PixelFormat, SystemControl,
};
use crate::error::{Error, Result};
use bytes::Bytes;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Records the last duty written per motor
#[derive(Default)]
pub struct MockMotorDriver {
    duties: Mutex<[i16; 2]>,
    writes: AtomicUsize,
}

impl MockMotorDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self, motor: Motor) -> i16 {
        lock(&self.duties)[motor.index()]
    }

    /// (left, right)
    pub fn duties(&self) -> (i16, i16) {
        let d = lock(&self.duties);
        (d[0], d[1])
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl MotorDriver for MockMotorDriver {
    fn set_speed(&self, motor: Motor, duty: i16) {
        lock(&self.duties)[motor.index()] = duty;
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self, motor: Motor) {
        lock(&self.duties)[motor.index()] = 0;
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Records every angle written
#[derive(Default)]
pub struct MockPanServo {
    angles: Mutex<Vec<u8>>,
}

impl MockPanServo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn angles(&self) -> Vec<u8> {
        lock(&self.angles).clone()
    }

    pub fn last_angle(&self) -> Option<u8> {
        lock(&self.angles).last().copied()
    }
}

impl PanServo for MockPanServo {
    fn set_angle(&self, angle: u8) {
        lock(&self.angles).push(angle);
    }
}

#[derive(Default)]
pub struct MockFlashlight {
    on: AtomicBool,
    writes: AtomicUsize,
}

impl MockFlashlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Flashlight for MockFlashlight {
    fn set(&self, on: bool) {
        self.on.store(on, Ordering::SeqCst);
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Camera double producing placeholder frames at the current resolution
pub struct MockCamera {
    resolution: Mutex<FrameSize>,
    format: Mutex<PixelFormat>,
    misses: AtomicUsize,
    acquired: AtomicUsize,
    released: AtomicUsize,
    accept_resolution: AtomicBool,
    fail_init: AtomicBool,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            resolution: Mutex::new(FrameSize::Qvga),
            format: Mutex::new(PixelFormat::Jpeg),
            misses: AtomicUsize::new(0),
            acquired: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            accept_resolution: AtomicBool::new(true),
            fail_init: AtomicBool::new(false),
        }
    }

    /// Deliver frames in the given pixel format from now on
    pub fn with_format(self, format: PixelFormat) -> Self {
        *lock(&self.format) = format;
        self
    }

    /// Report "no frame ready" for the next `n` acquisitions
    pub fn miss_next(&self, n: usize) {
        self.misses.store(n, Ordering::SeqCst);
    }

    pub fn reject_resolution_changes(&self) {
        self.accept_resolution.store(false, Ordering::SeqCst);
    }

    pub fn fail_init(&self) {
        self.fail_init.store(true, Ordering::SeqCst);
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Frames handed out but not yet returned
    pub fn outstanding(&self) -> usize {
        self.acquired() - self.released()
    }

    fn placeholder(&self) -> Frame {
        let (width, height) = lock(&self.resolution).dimensions();
        let format = *lock(&self.format);
        let data = match format {
            // SOI + EOI is enough for anything that only forwards bytes
            PixelFormat::Jpeg => Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
            PixelFormat::Rgb888 => Bytes::from(vec![0x40; (width * height * 3) as usize]),
            PixelFormat::Grayscale => Bytes::from(vec![0x40; (width * height) as usize]),
        };
        Frame {
            data,
            format,
            width,
            height,
            captured_at: Utc::now(),
        }
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSource for MockCamera {
    fn init(&self) -> Result<()> {
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(Error::Hardware("mock camera init failure".to_string()));
        }
        Ok(())
    }

    fn acquire_frame(&self) -> Option<Frame> {
        let missed = self
            .misses
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if missed {
            return None;
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Some(self.placeholder())
    }

    fn release_frame(&self, _frame: Frame) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn set_resolution(&self, size: FrameSize) -> bool {
        if !self.accept_resolution.load(Ordering::SeqCst) {
            return false;
        }
        *lock(&self.resolution) = size;
        true
    }

    fn resolution(&self) -> FrameSize {
        *lock(&self.resolution)
    }
}

pub struct MockLink {
    rssi: AtomicI32,
    connected: AtomicBool,
}

impl MockLink {
    pub fn new(rssi: i32) -> Self {
        Self {
            rssi: AtomicI32::new(rssi),
            connected: AtomicBool::new(true),
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl LinkMonitor for MockLink {
    fn rssi(&self) -> i32 {
        self.rssi.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MockSystem {
    credentials_cleared: AtomicBool,
    restarts: AtomicUsize,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn credentials_cleared(&self) -> bool {
        self.credentials_cleared.load(Ordering::SeqCst)
    }

    pub fn restart_count(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

impl SystemControl for MockSystem {
    fn clear_credentials(&self) -> Result<()> {
        self.credentials_cleared.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn restart(&self) {
        self.restarts.fetch_add(1, Ordering::SeqCst);
    }
}
