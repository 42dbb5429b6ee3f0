//! Motion state machine
//!
//! Pure state transitions plus actuator writes. Time comes in as a
//! parameter so the easing and watchdog logic run without a real clock.

use super::types::*;
use crate::hardware::{Motor, MotorDriver, PanServo};
use std::sync::Arc;

pub struct MotionController {
    motors: Arc<dyn MotorDriver>,
    servo: Arc<dyn PanServo>,
    current_pan_angle: u8,
    target_pan_angle: u8,
    last_servo_tick: u64,
    speed_cap: u8,
    last_command_at: u64,
    is_stopped: bool,
}

impl MotionController {
    /// Center the servo and hold both motors at zero
    pub fn new(motors: Arc<dyn MotorDriver>, servo: Arc<dyn PanServo>) -> Self {
        motors.stop(Motor::Left);
        motors.stop(Motor::Right);
        servo.set_angle(CENTER_PAN_ANGLE);

        Self {
            motors,
            servo,
            current_pan_angle: CENTER_PAN_ANGLE,
            target_pan_angle: CENTER_PAN_ANGLE,
            last_servo_tick: 0,
            speed_cap: MAX_SPEED_CAP,
            last_command_at: 0,
            is_stopped: true,
        }
    }

    /// Set where the pan servo should settle. Realized by `tick`.
    pub fn set_pan_target(&mut self, x: i32) {
        self.target_pan_angle = pan_input_to_angle(x);
        tracing::debug!(input = x, target = self.target_pan_angle, "Pan target set");
    }

    /// Periodic update: servo easing, then the auto-stop watchdog
    pub fn tick(&mut self, now_ms: u64) {
        self.step_servo(now_ms);

        let idle_ms = now_ms.saturating_sub(self.last_command_at);
        if !self.is_stopped && idle_ms > AUTO_STOP_TIMEOUT_MS {
            tracing::info!(idle_ms = idle_ms, "Auto-stop: motion command lapsed");
            self.stop();
        }
    }

    fn step_servo(&mut self, now_ms: u64) {
        if now_ms.saturating_sub(self.last_servo_tick) < SERVO_STEP_INTERVAL_MS {
            return;
        }
        self.last_servo_tick = now_ms;

        if self.current_pan_angle == self.target_pan_angle {
            return;
        }

        let current = self.current_pan_angle as i32;
        let target = self.target_pan_angle as i32;
        let diff = target - current;
        // Large gaps move fast, the last few degrees slow down
        let step = (diff.abs() / 4 + 1).clamp(1, MAX_SERVO_STEP);
        let next = if diff > 0 {
            (current + step).min(target)
        } else {
            (current - step).max(target)
        };

        self.current_pan_angle = next as u8;
        self.servo.set_angle(self.current_pan_angle);
    }

    /// Drive in `direction` under the current speed cap
    pub fn issue_move(&mut self, direction: Direction, now_ms: u64) {
        self.last_command_at = now_ms;
        self.is_stopped = false;

        let (left, right) = direction.duties(self.speed_cap);
        self.motors.set_speed(Motor::Left, left);
        self.motors.set_speed(Motor::Right, right);

        tracing::debug!(
            direction = direction.as_str(),
            left = left,
            right = right,
            "Move issued"
        );
    }

    pub fn stop(&mut self) {
        self.motors.stop(Motor::Left);
        self.motors.stop(Motor::Right);
        self.is_stopped = true;
    }

    /// Lower the drive cap while the flash LED draws current
    pub fn set_flash_cap(&mut self, flash_on: bool) {
        self.speed_cap = if flash_on { FLASH_SPEED_CAP } else { MAX_SPEED_CAP };
        tracing::debug!(flash_on = flash_on, speed_cap = self.speed_cap, "Speed cap updated");
    }

    pub fn snapshot(&self) -> MotionSnapshot {
        MotionSnapshot {
            current_pan_angle: self.current_pan_angle,
            target_pan_angle: self.target_pan_angle,
            speed_cap: self.speed_cap,
            is_stopped: self.is_stopped,
            last_command_at_ms: self.last_command_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::mock::{MockMotorDriver, MockPanServo};

    fn controller() -> (MotionController, Arc<MockMotorDriver>, Arc<MockPanServo>) {
        let motors = Arc::new(MockMotorDriver::new());
        let servo = Arc::new(MockPanServo::new());
        let c = MotionController::new(motors.clone(), servo.clone());
        (c, motors, servo)
    }

    /// Tick every 5 ms until the servo settles or `max_ticks` is hit
    fn run_until_settled(c: &mut MotionController, start_ms: u64, max_ticks: usize) -> u64 {
        let mut now = start_ms;
        for _ in 0..max_ticks {
            now += SERVO_STEP_INTERVAL_MS;
            c.tick(now);
            let s = c.snapshot();
            if s.current_pan_angle == s.target_pan_angle {
                break;
            }
        }
        now
    }

    #[test]
    fn test_initial_state() {
        let (c, motors, servo) = controller();
        let s = c.snapshot();
        assert_eq!(s.current_pan_angle, 90);
        assert_eq!(s.target_pan_angle, 90);
        assert_eq!(s.speed_cap, MAX_SPEED_CAP);
        assert!(s.is_stopped);
        assert_eq!(motors.duties(), (0, 0));
        assert_eq!(servo.last_angle(), Some(90));
    }

    #[test]
    fn test_set_pan_target_does_not_write_servo() {
        let (mut c, _, servo) = controller();
        c.set_pan_target(100);
        assert_eq!(c.snapshot().target_pan_angle, 180);
        assert_eq!(servo.angles(), vec![90]);
    }

    #[test]
    fn test_converges_without_overshoot_for_all_inputs() {
        for x in -100..=100 {
            let (mut c, _, servo) = controller();
            c.set_pan_target(x);
            let target = pan_input_to_angle(x);

            run_until_settled(&mut c, 0, 200);

            assert_eq!(c.snapshot().current_pan_angle, target, "input {}", x);
            // Every intermediate write stays on the near side of the target
            for angle in servo.angles() {
                if target >= 90 {
                    assert!(angle >= 90 && angle <= target, "input {} wrote {}", x, angle);
                } else {
                    assert!(angle <= 90 && angle >= target, "input {} wrote {}", x, angle);
                }
            }
        }
    }

    #[test]
    fn test_step_rate_bound() {
        let (mut c, _, servo) = controller();
        c.set_pan_target(-100);
        run_until_settled(&mut c, 0, 200);
        c.set_pan_target(100);
        run_until_settled(&mut c, 10_000, 200);

        let angles = servo.angles();
        for pair in angles.windows(2) {
            let delta = (pair[1] as i32 - pair[0] as i32).abs();
            assert!(delta <= MAX_SERVO_STEP, "step {} too large", delta);
        }
    }

    #[test]
    fn test_easing_decelerates() {
        let (mut c, _, servo) = controller();
        c.set_pan_target(100);
        run_until_settled(&mut c, 0, 200);

        let angles = servo.angles();
        let first = angles[1] as i32 - angles[0] as i32;
        let last = angles[angles.len() - 1] as i32 - angles[angles.len() - 2] as i32;
        assert_eq!(first, 8);
        assert_eq!(last, 1);
    }

    #[test]
    fn test_servo_skips_ticks_closer_than_interval() {
        let (mut c, _, servo) = controller();
        c.set_pan_target(100);

        c.tick(10);
        c.tick(11);
        c.tick(14);
        assert_eq!(servo.angles().len(), 2);

        c.tick(15);
        assert_eq!(servo.angles().len(), 3);
    }

    #[test]
    fn test_issue_move_writes_duty() {
        let (mut c, motors, _) = controller();
        c.issue_move(Direction::Forward, 100);
        assert_eq!(motors.duties(), (255, 255));
        assert!(!c.snapshot().is_stopped);

        c.issue_move(Direction::Left, 110);
        assert_eq!(motors.duties(), (-255, 255));
    }

    #[test]
    fn test_auto_stop_after_timeout() {
        let (mut c, motors, _) = controller();
        c.issue_move(Direction::Forward, 1_000);

        c.tick(1_500);
        assert!(!c.snapshot().is_stopped);
        assert_eq!(motors.duties(), (255, 255));

        c.tick(1_501);
        assert!(c.snapshot().is_stopped);
        assert_eq!(motors.duties(), (0, 0));

        // Further ticks do not write again
        let writes = motors.write_count();
        c.tick(2_000);
        c.tick(5_000);
        assert_eq!(motors.write_count(), writes);
        assert!(c.snapshot().is_stopped);
    }

    #[test]
    fn test_move_after_auto_stop_rearms() {
        let (mut c, motors, _) = controller();
        c.issue_move(Direction::Forward, 0);
        c.tick(600);
        assert!(c.snapshot().is_stopped);

        c.issue_move(Direction::Backward, 700);
        c.tick(1_100);
        assert!(!c.snapshot().is_stopped);
        assert_eq!(motors.duties(), (-255, -255));
    }

    #[test]
    fn test_repeated_moves_keep_motion_alive() {
        let (mut c, _, _) = controller();
        for t in (0..5_000).step_by(100) {
            c.issue_move(Direction::Forward, t);
            c.tick(t + 50);
        }
        assert!(!c.snapshot().is_stopped);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (mut c, motors, _) = controller();
        c.issue_move(Direction::Right, 0);
        c.stop();
        c.stop();
        assert!(c.snapshot().is_stopped);
        assert_eq!(motors.duties(), (0, 0));
    }

    #[test]
    fn test_flash_cap_applies_to_next_move() {
        let (mut c, motors, _) = controller();
        c.set_flash_cap(true);
        assert_eq!(c.snapshot().speed_cap, FLASH_SPEED_CAP);

        c.issue_move(Direction::Forward, 0);
        assert_eq!(motors.duties(), (200, 200));

        c.set_flash_cap(false);
        c.issue_move(Direction::ForwardRight, 10);
        assert_eq!(motors.duties(), (255, 212));
    }
}
