//! Stream port routes

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::error::{Error, Result};
use crate::state::AppState;
use crate::stream_gatekeeper::STREAM_CONTENT_TYPE;

/// Create stream port router
pub fn create_stream_router(state: AppState) -> Router {
    Router::new()
        .route("/stream", get(stream_handler))
        .with_state(state)
}

/// GET /stream
///
/// The body owns the session; hyper dropping it on disconnect unlocks the
/// stream for the next client.
async fn stream_handler(State(state): State<AppState>) -> Result<Response> {
    let frames = state
        .gatekeeper
        .open()
        .ok_or_else(|| Error::NotFound("Stream already active".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, STREAM_CONTENT_TYPE),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(frames),
    )
        .into_response())
}
