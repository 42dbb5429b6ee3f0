//! Shared response models

use crate::motion_controller::MotionSnapshot;
use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }
}

/// GET /status body
#[derive(Debug, Clone, Serialize)]
pub struct DeviceStatus {
    pub firmware_version: String,
    pub flash_on: bool,
    /// Resolution name, e.g. `QVGA`
    pub frame_size: String,
    pub stream_active: bool,
    pub control_connections: u64,
    pub link_connected: bool,
    pub motion: MotionSnapshot,
}
