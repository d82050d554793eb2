//! Relaying the backend's response to the caller.
//!
//! # Responsibilities
//! - Pick streaming or JSON relay from the backend `content-type`
//! - Stream event-stream/plain-text bodies chunk by chunk
//! - Decode and re-encode everything else as JSON
//!
//! # Design Decisions
//! - Streaming bodies are never collected; backpressure flows through
//!   `Body::from_stream`
//! - The upstream body is owned by the response body, so a caller
//!   disconnect drops it and closes the upstream connection

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use futures_util::{Stream, StreamExt};

use crate::http::error::ProxyError;

/// Content types relayed as a raw byte stream.
const STREAMING_TYPES: [&str; 2] = ["text/event-stream", "text/plain"];

/// How a backend response is handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayMode {
    Stream,
    Json,
}

impl RelayMode {
    /// Choose a mode from a raw `content-type` value.
    pub fn for_content_type(content_type: &str) -> Self {
        if STREAMING_TYPES.iter().any(|t| content_type.contains(t)) {
            RelayMode::Stream
        } else {
            RelayMode::Json
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelayMode::Stream => "stream",
            RelayMode::Json => "json",
        }
    }
}

/// Turn a backend response into the caller's response.
pub async fn relay(upstream: reqwest::Response) -> Result<(RelayMode, Response), ProxyError> {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match RelayMode::for_content_type(&content_type) {
        RelayMode::Stream => {
            let target = upstream.url().to_string();
            let body = Body::from_stream(RelayStream::new(target, upstream.bytes_stream()));

            let mut response = Response::new(body);
            *response.status_mut() = status;
            let headers = response.headers_mut();
            // The value came from a valid header, so it converts back.
            if let Ok(value) = HeaderValue::from_str(&content_type) {
                headers.insert(header::CONTENT_TYPE, value);
            }
            headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
            headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));

            Ok((RelayMode::Stream, response))
        }
        RelayMode::Json => {
            let data: serde_json::Value = upstream.json().await.map_err(ProxyError::Parse)?;
            Ok((RelayMode::Json, (status, Json(data)).into_response()))
        }
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Upstream body wrapper that reports how the relay ended.
///
/// Dropping it drops the upstream body, which releases the connection
/// whether or not the stream was read to the end.
pub struct RelayStream {
    inner: ByteStream,
    target: String,
    bytes: u64,
    finished: bool,
}

impl RelayStream {
    pub fn new<S>(target: String, inner: S) -> Self
    where
        S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
    {
        Self {
            inner: Box::pin(inner),
            target,
            bytes: 0,
            finished: false,
        }
    }
}

impl Stream for RelayStream {
    type Item = reqwest::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let next = self.inner.poll_next_unpin(cx);
        match &next {
            Poll::Ready(Some(Ok(chunk))) => self.bytes += chunk.len() as u64,
            Poll::Ready(Some(Err(e))) => {
                tracing::warn!(target_url = %self.target, error = %e, "Upstream stream failed");
                self.finished = true;
            }
            Poll::Ready(None) => self.finished = true,
            Poll::Pending => {}
        }
        next
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if self.finished {
            tracing::debug!(target_url = %self.target, bytes = self.bytes, "Stream relay finished");
        } else {
            tracing::info!(
                target_url = %self.target,
                bytes = self.bytes,
                "Stream relay closed before upstream finished"
            );
        }
    }
}
