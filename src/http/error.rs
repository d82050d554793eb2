//! Proxy error types and response handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Fixed `error` field of every failure envelope.
pub const PROXY_FAILURE: &str = "Proxy request failed";

/// Everything that can go wrong while forwarding one request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No path segments, or the joined target is not a valid URL.
    #[error("malformed target: {0}")]
    MalformedTarget(String),

    /// The inbound body could not be read.
    #[error("failed to read request body: {0}")]
    BodyRead(String),

    /// The backend could not be reached or the exchange broke off.
    #[error("network failure: {0}")]
    Network(#[source] reqwest::Error),

    /// A non-stream response carried a body that is not JSON.
    #[error("invalid JSON from backend: {0}")]
    Parse(#[source] reqwest::Error),
}

impl ProxyError {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MalformedTarget(_) => "malformed_target",
            ProxyError::BodyRead(_) => "body_read",
            ProxyError::Network(_) => "network",
            ProxyError::Parse(_) => "parse",
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            error: PROXY_FAILURE,
            details: self.to_string(),
        }
    }
}

/// JSON envelope sent to the caller on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub details: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}
