//! Outbound half of the proxy: target URL construction and the request
//! sent to the backend.
//!
//! Only `Accept` and `Content-Type` are sent upstream, both fixed to
//! `application/json`. Inbound headers are never copied.

use axum::body::Bytes;
use axum::http::{header, Method};
use url::Url;

use crate::config::BackendUrl;
use crate::http::error::ProxyError;

const APPLICATION_JSON: &str = "application/json";

/// Split a wildcard capture such as `tasks/123` into its segments.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

/// Build `base/segment/segment[?query]`.
///
/// Segments arrive percent-decoded, so each one is re-encoded as a single
/// path segment: `?`, `#`, `/` and `%` inside a segment never change the
/// URL's structure. `.` and `..` segments are dropped.
pub fn target_url(
    base: &BackendUrl,
    segments: &[&str],
    query: Option<&str>,
) -> Result<Url, ProxyError> {
    if segments.is_empty() || segments.iter().all(|s| s.is_empty()) {
        return Err(ProxyError::MalformedTarget("no path segments".into()));
    }

    let mut target = Url::parse(base.as_str())
        .map_err(|e| ProxyError::MalformedTarget(format!("{}: {}", base, e)))?;
    target
        .path_segments_mut()
        .map_err(|_| ProxyError::MalformedTarget(format!("{}: cannot be a base", base)))?
        .pop_if_empty()
        .extend(segments);

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        target.set_query(Some(query));
    }

    Ok(target)
}

/// One request on its way to the backend.
#[derive(Debug, Clone)]
pub struct ForwardRequest {
    pub method: Method,
    pub url: Url,
    pub body: Option<Bytes>,
}

impl ForwardRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            body: None,
        }
    }

    pub fn post(url: Url, body: Bytes) -> Self {
        Self {
            method: Method::POST,
            url,
            body: Some(body),
        }
    }

    /// Issue the request, returning once response headers have arrived.
    pub async fn send(self, client: &reqwest::Client) -> Result<reqwest::Response, ProxyError> {
        let mut request = client
            .request(self.method, self.url)
            .header(header::ACCEPT, APPLICATION_JSON)
            .header(header::CONTENT_TYPE, APPLICATION_JSON);

        if let Some(body) = self.body {
            request = request.body(body);
        }

        request.send().await.map_err(ProxyError::Network)
    }
}
