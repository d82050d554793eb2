//! `Fetch` over a `reqwest` client.

use thiserror::Error;
use url::Url;

use crate::fetch::{Fetch, FetchInput, RequestInit};

/// Errors raised by [`HttpFetch`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Request(#[from] reqwest::Error),
}

/// Issues requests with `reqwest`.
///
/// Relative URLs such as `/api/proxy/tasks` are resolved against `origin`,
/// the way a browser resolves them against the page it is on.
#[derive(Debug, Clone)]
pub struct HttpFetch {
    client: reqwest::Client,
    origin: Option<Url>,
}

impl HttpFetch {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Absolute URLs as-is, relative ones joined onto the origin.
    pub fn resolve(&self, url: &str) -> Result<Url, FetchError> {
        let parsed = match (Url::parse(url), &self.origin) {
            (Err(url::ParseError::RelativeUrlWithoutBase), Some(origin)) => origin.join(url),
            (parsed, _) => parsed,
        };

        parsed.map_err(|source| FetchError::InvalidUrl {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for HttpFetch {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Fetch for HttpFetch {
    type Response = reqwest::Response;
    type Error = FetchError;

    async fn fetch(
        &self,
        input: FetchInput,
        init: Option<RequestInit>,
    ) -> Result<reqwest::Response, FetchError> {
        let url = self.resolve(input.as_str())?;
        let RequestInit {
            method,
            headers,
            body,
        } = init.unwrap_or_default();

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            request = request.body(body);
        }

        Ok(request.send().await?)
    }
}
