//! Client-side fetch abstraction.
//!
//! # Data Flow
//! ```text
//! caller
//!     → ProxyFetch (proxy.rs: rewrite backend URLs to /api/proxy/...)
//!     → any Fetch implementation, e.g. HttpFetch (client.rs: reqwest)
//!     → proxy route handler → backend
//! ```
//!
//! # Design Decisions
//! - `Fetch` is the seam: the proxy wrapper is itself a `Fetch`, so it drops
//!   in wherever the wrapped implementation was used
//! - Inputs are normalized to a URL string before anything looks at them
//! - `RequestInit` is passed along untouched; only the URL may change

pub mod client;
pub mod proxy;

use std::future::Future;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::Url;

pub use client::{FetchError, HttpFetch};
pub use proxy::ProxyFetch;

/// Something that can issue an HTTP request.
pub trait Fetch {
    type Response;
    type Error;

    fn fetch(
        &self,
        input: FetchInput,
        init: Option<RequestInit>,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send;
}

/// The target of a fetch, normalized to a plain URL string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchInput(String);

impl FetchInput {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for FetchInput {
    fn from(url: &str) -> Self {
        Self(url.to_string())
    }
}

impl From<String> for FetchInput {
    fn from(url: String) -> Self {
        Self(url)
    }
}

impl From<Url> for FetchInput {
    fn from(url: Url) -> Self {
        Self(url.into())
    }
}

impl From<&Url> for FetchInput {
    fn from(url: &Url) -> Self {
        Self(url.as_str().to_string())
    }
}

/// A request-like value contributes only its URL.
impl From<&reqwest::Request> for FetchInput {
    fn from(request: &reqwest::Request) -> Self {
        Self::from(request.url())
    }
}

/// Per-request options, handed to the underlying fetch as given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestInit {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl RequestInit {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: axum::http::HeaderName, value: axum::http::HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}
