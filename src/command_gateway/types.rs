//! Command Gateway type definitions

use crate::hardware::FrameSize;
use crate::motion_controller::Direction;
use std::str::FromStr;

const CAMERA_DRAG_PREFIX: &str = "cameraDrag_";
const FRAME_SIZE_PREFIX: &str = "frameSize_";

/// One decoded control-channel frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleFlash,
    /// Pan input; `y` is carried but unused (no tilt axis)
    SetPan { x: i32, y: i32 },
    Ping,
    Move(Direction),
    Stop,
    SetResolution(FrameSize),
    ResetCredentials,
}

/// Why a frame did not decode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    Unknown(String),
    #[error("malformed payload for {command}: {payload}")]
    MalformedPayload {
        command: &'static str,
        payload: String,
    },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let frame = s.trim();

        match frame {
            "toggleFlash" => return Ok(Self::ToggleFlash),
            "ping" => return Ok(Self::Ping),
            "stop" => return Ok(Self::Stop),
            "reset" => return Ok(Self::ResetCredentials),
            _ => {}
        }

        if let Ok(direction) = frame.parse::<Direction>() {
            return Ok(Self::Move(direction));
        }

        if let Some(payload) = frame.strip_prefix(CAMERA_DRAG_PREFIX) {
            return parse_drag(payload)
                .map(|(x, y)| Self::SetPan { x, y })
                .ok_or_else(|| ParseError::MalformedPayload {
                    command: "cameraDrag",
                    payload: payload.to_string(),
                });
        }

        if let Some(payload) = frame.strip_prefix(FRAME_SIZE_PREFIX) {
            return payload
                .parse::<FrameSize>()
                .map(Self::SetResolution)
                .map_err(|_| ParseError::MalformedPayload {
                    command: "frameSize",
                    payload: payload.to_string(),
                });
        }

        Err(ParseError::Unknown(frame.to_string()))
    }
}

/// `<int>_<int>`, anything after the second integer is ignored
fn parse_drag(payload: &str) -> Option<(i32, i32)> {
    let (x, rest) = leading_int(payload)?;
    let (y, _) = leading_int(rest.strip_prefix('_')?)?;
    Some((x, y))
}

/// Optionally signed decimal at the start of `s`, and what follows it
fn leading_int(s: &str) -> Option<(i32, &str)> {
    let s = s.trim_start();
    let sign_len = usize::from(s.starts_with('-') || s.starts_with('+'));
    let digits = s[sign_len..]
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    let end = sign_len + digits;
    Some((s[..end].parse().ok()?, &s[end..]))
}
