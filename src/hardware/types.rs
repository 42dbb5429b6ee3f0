//! Hardware boundary type definitions

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Drive motor selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motor {
    Left,
    Right,
}

impl Motor {
    pub fn index(&self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// Already JPEG compressed (wire format)
    Jpeg,
    /// Packed 8-bit RGB
    Rgb888,
    /// 8-bit luminance
    Grayscale,
}

/// Camera resolution preset
///
/// Wire names follow the sensor driver's naming (`VGA`, `FRAMESIZE_VGA`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameSize {
    R96x96,
    Qqvga,
    Qcif,
    Hqvga,
    R240x240,
    Qvga,
    Cif,
    Hvga,
    Vga,
    Svga,
    Xga,
    Hd,
    Sxga,
    Uxga,
}

/// Name prefix accepted (and stripped) when parsing
pub const FRAMESIZE_PREFIX: &str = "FRAMESIZE_";

/// Static preset table: (variant, wire name, width, height)
const FRAME_SIZES: [(FrameSize, &str, u32, u32); 14] = [
    (FrameSize::R96x96, "96X96", 96, 96),
    (FrameSize::Qqvga, "QQVGA", 160, 120),
    (FrameSize::Qcif, "QCIF", 176, 144),
    (FrameSize::Hqvga, "HQVGA", 240, 176),
    (FrameSize::R240x240, "240X240", 240, 240),
    (FrameSize::Qvga, "QVGA", 320, 240),
    (FrameSize::Cif, "CIF", 400, 296),
    (FrameSize::Hvga, "HVGA", 480, 320),
    (FrameSize::Vga, "VGA", 640, 480),
    (FrameSize::Svga, "SVGA", 800, 600),
    (FrameSize::Xga, "XGA", 1024, 768),
    (FrameSize::Hd, "HD", 1280, 720),
    (FrameSize::Sxga, "SXGA", 1280, 1024),
    (FrameSize::Uxga, "UXGA", 1600, 1200),
];

impl FrameSize {
    fn entry(&self) -> &'static (FrameSize, &'static str, u32, u32) {
        // Table covers every variant
        &FRAME_SIZES[*self as usize]
    }

    /// Wire name without prefix, e.g. `VGA`
    pub fn name(&self) -> &'static str {
        self.entry().1
    }

    /// Pixel dimensions (width, height)
    pub fn dimensions(&self) -> (u32, u32) {
        let (_, _, w, h) = *self.entry();
        (w, h)
    }

    /// All presets, smallest first
    pub fn all() -> impl Iterator<Item = FrameSize> {
        FRAME_SIZES.iter().map(|(size, _, _, _)| *size)
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unknown resolution name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frame size: {0}")]
pub struct UnknownFrameSize(pub String);

impl FromStr for FrameSize {
    type Err = UnknownFrameSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_prefix(FRAMESIZE_PREFIX).unwrap_or(name);
        FRAME_SIZES
            .iter()
            .find(|(_, wire, _, _)| *wire == name)
            .map(|(size, _, _, _)| *size)
            .ok_or_else(|| UnknownFrameSize(s.to_string()))
    }
}

/// One captured image
#[derive(Debug, Clone)]
pub struct Frame {
    pub data: Bytes,
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    /// `<sec>.<usec>` rendering of the capture time
    pub fn timestamp_header(&self) -> String {
        format!(
            "{}.{:06}",
            self.captured_at.timestamp(),
            self.captured_at.timestamp_subsec_micros()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_frame_size_table_matches_variant_order() {
        for (i, (size, _, _, _)) in FRAME_SIZES.iter().enumerate() {
            assert_eq!(*size as usize, i);
        }
    }

    #[test]
    fn test_frame_size_parse_with_and_without_prefix() {
        assert_eq!("VGA".parse::<FrameSize>().unwrap(), FrameSize::Vga);
        assert_eq!("FRAMESIZE_VGA".parse::<FrameSize>().unwrap(), FrameSize::Vga);
        assert_eq!("FRAMESIZE_96X96".parse::<FrameSize>().unwrap(), FrameSize::R96x96);
        assert_eq!(" UXGA\n".parse::<FrameSize>().unwrap(), FrameSize::Uxga);
    }

    #[test]
    fn test_frame_size_parse_rejects_unknown() {
        assert!("vga".parse::<FrameSize>().is_err());
        assert!("FRAMESIZE_".parse::<FrameSize>().is_err());
        assert!("4K".parse::<FrameSize>().is_err());
    }

    #[test]
    fn test_frame_size_dimensions() {
        assert_eq!(FrameSize::Vga.dimensions(), (640, 480));
        assert_eq!(FrameSize::Qvga.dimensions(), (320, 240));
        assert_eq!(FrameSize::Hd.name(), "HD");
        assert_eq!(FrameSize::all().count(), 14);
    }

    #[test]
    fn test_timestamp_header_pads_micros() {
        let frame = Frame {
            data: Bytes::new(),
            format: PixelFormat::Jpeg,
            width: 0,
            height: 0,
            captured_at: Utc.timestamp_opt(1_700_000_000, 42_000).unwrap(),
        };
        assert_eq!(frame.timestamp_header(), "1700000000.000042");
    }
}
