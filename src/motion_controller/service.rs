//! Motion Controller Service
//!
//! Shares one `MotionController` between command dispatch and the periodic
//! ticker. The mutex is the single-writer discipline for motion state; the
//! clock is read while it is held so commands and auto-stops stay ordered.

use super::controller::MotionController;
use super::types::{Direction, MotionSnapshot};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};

/// Default tick period (ms)
pub const DEFAULT_TICK_MS: u64 = 2;

pub struct MotionService {
    controller: Mutex<MotionController>,
    epoch: Instant,
}

impl MotionService {
    pub fn new(controller: MotionController) -> Self {
        Self {
            controller: Mutex::new(controller),
            epoch: Instant::now(),
        }
    }

    /// Monotonic milliseconds since the service was created
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    pub async fn set_pan_target(&self, x: i32) {
        self.controller.lock().await.set_pan_target(x);
    }

    pub async fn issue_move(&self, direction: Direction) {
        let mut controller = self.controller.lock().await;
        let now = self.now_ms();
        controller.issue_move(direction, now);
    }

    pub async fn stop(&self) {
        self.controller.lock().await.stop();
        tracing::debug!("Motors stopped");
    }

    pub async fn set_flash_cap(&self, flash_on: bool) {
        self.controller.lock().await.set_flash_cap(flash_on);
    }

    pub async fn tick(&self) {
        let mut controller = self.controller.lock().await;
        let now = self.now_ms();
        controller.tick(now);
    }

    pub async fn snapshot(&self) -> MotionSnapshot {
        self.controller.lock().await.snapshot()
    }
}

/// Background task driving `MotionService::tick` at a fixed period
pub struct MotionTicker {
    motion: Arc<MotionService>,
    period: Duration,
}

impl MotionTicker {
    pub fn new(motion: Arc<MotionService>, tick_ms: u64) -> Self {
        Self {
            motion,
            period: Duration::from_millis(tick_ms.max(1)),
        }
    }

    /// Spawn the tick loop. Runs until the runtime shuts down.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tracing::info!(period_ms = self.period.as_millis() as u64, "Motion ticker started");

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                self.motion.tick().await;
            }
        })
    }
}
