//! Motion Controller type definitions

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Pan angle at power-up (camera centered)
pub const CENTER_PAN_ANGLE: u8 = 90;
/// Pan angle limits in degrees
pub const MIN_PAN_ANGLE: u8 = 0;
pub const MAX_PAN_ANGLE: u8 = 180;
/// Operator pan input range
pub const PAN_INPUT_LIMIT: i32 = 100;

/// Minimum spacing between servo position updates (ms)
pub const SERVO_STEP_INTERVAL_MS: u64 = 5;
/// Largest per-update servo step in degrees
pub const MAX_SERVO_STEP: i32 = 8;

/// Drive halts when no move command arrives for longer than this (ms)
pub const AUTO_STOP_TIMEOUT_MS: u64 = 500;

/// Duty ceiling with the flash LED off
pub const MAX_SPEED_CAP: u8 = 255;
/// Duty ceiling with the flash LED on (LED and motors share the supply)
pub const FLASH_SPEED_CAP: u8 = 200;
/// Inner wheel of a diagonal runs at cap / this
pub const DIAGONAL_DIVISOR: f32 = 1.2;

/// Drive direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackwardLeft,
    BackwardRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Self::Forward,
        Self::Backward,
        Self::Left,
        Self::Right,
        Self::ForwardLeft,
        Self::ForwardRight,
        Self::BackwardLeft,
        Self::BackwardRight,
    ];

    /// Command word on the control channel
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Backward => "backward",
            Self::Left => "left",
            Self::Right => "right",
            Self::ForwardLeft => "forward-left",
            Self::ForwardRight => "forward-right",
            Self::BackwardLeft => "backward-left",
            Self::BackwardRight => "backward-right",
        }
    }

    /// Signed (left, right) duty for this direction under `cap`
    ///
    /// Straight runs both sides at the cap, turns spin in place, diagonals
    /// slow the inner side to `cap / 1.2`.
    pub fn duties(&self, cap: u8) -> (i16, i16) {
        let full = cap as i16;
        let slow = (cap as f32 / DIAGONAL_DIVISOR) as i16;
        match self {
            Self::Forward => (full, full),
            Self::Backward => (-full, -full),
            Self::Left => (-full, full),
            Self::Right => (full, -full),
            Self::ForwardLeft => (slow, full),
            Self::ForwardRight => (full, slow),
            Self::BackwardLeft => (-slow, -full),
            Self::BackwardRight => (-full, -slow),
        }
    }
}

impl FromStr for Direction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|d| d.as_str() == s)
            .copied()
            .ok_or(())
    }
}

/// Map operator pan input in [-100, 100] to a servo angle in [0, 180]
pub fn pan_input_to_angle(x: i32) -> u8 {
    let x = x.clamp(-PAN_INPUT_LIMIT, PAN_INPUT_LIMIT);
    let span = (MAX_PAN_ANGLE - MIN_PAN_ANGLE) as i32;
    let angle = (x + PAN_INPUT_LIMIT) * span / (2 * PAN_INPUT_LIMIT) + MIN_PAN_ANGLE as i32;
    angle as u8
}

/// Read-only view of the motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MotionSnapshot {
    pub current_pan_angle: u8,
    pub target_pan_angle: u8,
    pub speed_cap: u8,
    pub is_stopped: bool,
    pub last_command_at_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pan_mapping_endpoints() {
        assert_eq!(pan_input_to_angle(-100), 0);
        assert_eq!(pan_input_to_angle(0), 90);
        assert_eq!(pan_input_to_angle(100), 180);
        assert_eq!(pan_input_to_angle(50), 135);
    }

    #[test]
    fn test_pan_mapping_clamps() {
        assert_eq!(pan_input_to_angle(-500), 0);
        assert_eq!(pan_input_to_angle(i32::MAX), 180);
        assert_eq!(pan_input_to_angle(i32::MIN), 0);
    }

    #[test]
    fn test_pan_mapping_monotonic() {
        let mut prev = 0u8;
        for x in -100..=100 {
            let angle = pan_input_to_angle(x);
            assert!(angle >= prev);
            assert!(angle <= MAX_PAN_ANGLE);
            prev = angle;
        }
    }

    #[test]
    fn test_duty_table() {
        assert_eq!(Direction::Forward.duties(255), (255, 255));
        assert_eq!(Direction::Backward.duties(255), (-255, -255));
        assert_eq!(Direction::Left.duties(255), (-255, 255));
        assert_eq!(Direction::Right.duties(255), (255, -255));
        assert_eq!(Direction::ForwardLeft.duties(255), (212, 255));
        assert_eq!(Direction::ForwardRight.duties(255), (255, 212));
        assert_eq!(Direction::BackwardLeft.duties(200), (-166, -200));
        assert_eq!(Direction::BackwardRight.duties(200), (-200, -166));
    }

    #[test]
    fn test_diagonals_keep_sign() {
        for d in Direction::ALL {
            let (l, r) = d.duties(MAX_SPEED_CAP);
            match d {
                Direction::Left | Direction::Right => assert!(l.signum() != r.signum()),
                _ => assert_eq!(l.signum(), r.signum()),
            }
        }
    }

    #[test]
    fn test_direction_words_round_trip() {
        for d in Direction::ALL {
            assert_eq!(d.as_str().parse::<Direction>(), Ok(d));
        }
        assert!("Forward".parse::<Direction>().is_err());
        assert!("forward_left".parse::<Direction>().is_err());
    }
}
