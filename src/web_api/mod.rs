//! WebAPI - HTTP and WebSocket endpoints
//!
//! ## Responsibilities
//!
//! - Control port: page, control WebSocket, capture, resolution, status
//! - Stream port: exclusive MJPEG stream
//! - Response formatting

mod routes;
mod stream_routes;

pub use routes::{create_router, serve_control_connection};
pub use stream_routes::create_stream_router;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::models::{ApiResponse, DeviceStatus};
use crate::state::AppState;

/// Status endpoint
pub async fn device_status(State(state): State<AppState>) -> impl IntoResponse {
    let status = DeviceStatus {
        firmware_version: env!("CARGO_PKG_VERSION").to_string(),
        flash_on: state.gateway.flash_on().await,
        frame_size: state.camera.resolution().name().to_string(),
        stream_active: state.gatekeeper.is_active(),
        control_connections: state.hub.connection_count(),
        link_connected: state.gateway.link_connected(),
        motion: state.motion.snapshot().await,
    };

    Json(ApiResponse::success(status))
}
