//! Error handling for the camcar server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found (also used for a rejected stream session)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (unknown resolution name, bad payload)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Transient hardware unavailability (no frame ready)
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// Hardware refused an operation
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error (blocking task failure)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            Error::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                msg.clone(),
            ),
            Error::Hardware(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "HARDWARE_ERROR",
                msg.clone(),
            ),
            Error::Io(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: Error) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (Error::Validation("x".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (Error::Unavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            (Error::Hardware("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "HARDWARE_ERROR"),
            (Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];

        for (error, status, code) in cases {
            let (got_status, body) = render(error).await;
            assert_eq!(got_status, status);
            assert_eq!(body["error_code"], code);
            assert_eq!(body["message"], "x");
        }
    }

    #[tokio::test]
    async fn test_io_error_maps_to_server_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "index.min.html");
        let (status, body) = render(Error::from(io)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error_code"], "IO_ERROR");
    }
}
