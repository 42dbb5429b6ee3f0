//! Control port routes

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures::{Sink, SinkExt, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::hardware::{FrameLease, FrameSize};
use crate::state::AppState;

pub const INDEX_PAGE: &str = "index.min.html";
pub const BUSY_PAGE: &str = "busy.min.html";

/// Create control port router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/ws", get(websocket_handler))
        .route("/capture_photo", get(capture_photo))
        .route("/set_framesize", post(set_framesize))
        .route("/status", get(super::device_status))
        .with_state(state)
}

// ========================================
// Page
// ========================================

/// Control page, or the busy page while someone else is streaming
async fn index_page(State(state): State<AppState>) -> Result<Response> {
    let page = if state.gatekeeper.is_active() {
        BUSY_PAGE
    } else {
        INDEX_PAGE
    };
    let path = state.config.static_dir.join(page);

    let html = tokio::fs::read(&path).await.map_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "Failed to read page");
        Error::Io(e)
    })?;

    Ok((
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
        .into_response())
}

// ========================================
// Capture
// ========================================

async fn capture_photo(State(state): State<AppState>) -> Result<Response> {
    let lease = FrameLease::acquire(&state.camera)
        .ok_or_else(|| Error::Unavailable("Camera capture failed".to_string()))?;
    let timestamp = lease
        .frame()
        .map(|frame| frame.timestamp_header())
        .unwrap_or_default();
    // Raw frames are converted off the async workers; the lease drops there too
    let jpeg = tokio::task::spawn_blocking(move || lease.jpeg())
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
        .ok_or_else(|| Error::Hardware("JPEG compression failed".to_string()))?;

    tracing::debug!(bytes = jpeg.len(), timestamp = %timestamp, "Photo captured");

    Ok((
        StatusCode::OK,
        [
            ("content-type", "image/jpeg".to_string()),
            ("content-disposition", "inline; filename=capture.jpg".to_string()),
            ("x-timestamp", timestamp),
        ],
        jpeg,
    )
        .into_response())
}

// ========================================
// Resolution
// ========================================

async fn set_framesize(State(state): State<AppState>, body: String) -> Result<Response> {
    let size = body
        .parse::<FrameSize>()
        .map_err(|e| Error::Validation(e.to_string()))?;

    if !state.camera.set_resolution(size) {
        return Err(Error::Hardware(format!("Failed to set frame size {}", size)));
    }

    tracing::info!(resolution = %size, "Frame size changed");
    Ok((StatusCode::OK, format!("Frame size set to {}", size.name())).into_response())
}

// ========================================
// WebSocket Handler
// ========================================

/// WebSocket upgrade handler
async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_websocket(socket, state))
}

/// Handle one control connection
async fn handle_websocket(socket: WebSocket, state: AppState) {
    let (sender, receiver) = socket.split();
    serve_control_connection(sender, receiver, state).await;
}

/// Drive one control connection over any message sink and stream
///
/// - the status burst is queued before the first inbound frame is read
/// - each reply goes back on this connection only
/// - the connection leaves the hub when either direction ends
pub async fn serve_control_connection<S, R, E>(mut sender: S, mut receiver: R, state: AppState)
where
    S: Sink<Message> + Unpin + Send + 'static,
    R: Stream<Item = std::result::Result<Message, E>> + Unpin + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let (conn_id, mut rx) = state.hub.register().await;

    for status in state.gateway.initial_status().await {
        state.hub.send_to(&conn_id, status).await;
    }

    // Forward queued replies to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            let text = match result {
                Ok(Message::Text(text)) => text,
                Ok(Message::Binary(data)) => match String::from_utf8(data) {
                    Ok(text) => text,
                    Err(_) => {
                        tracing::debug!(connection_id = %conn_id, "Ignoring non-UTF-8 binary frame");
                        continue;
                    }
                },
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %conn_id, "WebSocket client closed");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(connection_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            };

            if let Some(reply) = recv_state.gateway.dispatch(&text).await {
                recv_state.hub.send_to(&conn_id, reply).await;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.hub.unregister(&conn_id).await;
}
