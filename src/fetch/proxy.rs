//! Proxy-aware fetch wrapper.

use crate::config::BackendUrl;
use crate::fetch::{Fetch, FetchInput, RequestInit};
use crate::http::PROXY_PREFIX;

/// Sends requests aimed at the backend through `/api/proxy` instead.
///
/// Any URL starting with the backend base has that prefix replaced by
/// `/api/proxy`. Everything else, and every `init`, reaches the inner fetch
/// untouched. Errors from the inner fetch are returned as they are.
#[derive(Debug, Clone)]
pub struct ProxyFetch<F> {
    inner: F,
    backend: BackendUrl,
}

impl<F> ProxyFetch<F> {
    pub fn new(inner: F, backend: BackendUrl) -> Self {
        Self { inner, backend }
    }

    pub fn backend(&self) -> &BackendUrl {
        &self.backend
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    /// The URL a request for `url` is actually sent to.
    pub fn rewrite(&self, url: &str) -> String {
        match url.strip_prefix(self.backend.as_str()) {
            Some(rest) => format!("{PROXY_PREFIX}{rest}"),
            None => url.to_string(),
        }
    }
}

impl<F> Fetch for ProxyFetch<F>
where
    F: Fetch + Sync,
{
    type Response = F::Response;
    type Error = F::Error;

    async fn fetch(
        &self,
        input: FetchInput,
        init: Option<RequestInit>,
    ) -> Result<Self::Response, Self::Error> {
        let url = input.into_string();
        let target = self.rewrite(&url);

        if target != url {
            tracing::debug!(from = %url, to = %target, "Routing fetch through proxy");
        }

        self.inner.fetch(FetchInput::from(target), init).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue, Method};
    use std::sync::Mutex;

    /// Records every call instead of sending anything.
    #[derive(Default)]
    struct RecordingFetch {
        calls: Mutex<Vec<(String, Option<RequestInit>)>>,
    }

    impl Fetch for RecordingFetch {
        type Response = usize;
        type Error = String;

        async fn fetch(
            &self,
            input: FetchInput,
            init: Option<RequestInit>,
        ) -> Result<usize, String> {
            if input.as_str().contains("fail") {
                return Err(format!("refused: {}", input.as_str()));
            }
            let mut calls = self.calls.lock().unwrap();
            calls.push((input.into_string(), init));
            Ok(calls.len())
        }
    }

    fn proxy_fetch() -> ProxyFetch<RecordingFetch> {
        ProxyFetch::new(
            RecordingFetch::default(),
            BackendUrl::parse("http://localhost:8085").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_backend_url_is_rewritten() {
        let fetch = proxy_fetch();
        let init = RequestInit::new(Method::POST)
            .header(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"))
            .body(r#"{"method":"message/send"}"#);

        fetch
            .fetch("http://localhost:8085/tasks/123?status=open".into(), Some(init.clone()))
            .await
            .unwrap();

        let calls = fetch.inner().calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/api/proxy/tasks/123?status=open");
        assert_eq!(calls[0].1.as_ref(), Some(&init));
    }

    #[tokio::test]
    async fn test_other_urls_pass_through() {
        let fetch = proxy_fetch();

        fetch
            .fetch("https://example.com/data.json".into(), None)
            .await
            .unwrap();
        fetch
            .fetch("http://127.0.0.1:8085/tasks".into(), Some(RequestInit::default()))
            .await
            .unwrap();

        let calls = fetch.inner().calls.lock().unwrap();
        assert_eq!(calls[0], ("https://example.com/data.json".to_string(), None));
        assert_eq!(
            calls[1],
            ("http://127.0.0.1:8085/tasks".to_string(), Some(RequestInit::default()))
        );
    }

    #[tokio::test]
    async fn test_url_and_request_inputs() {
        let fetch = proxy_fetch();
        let url = url::Url::parse("http://localhost:8085/.well-known/agent.json").unwrap();
        let request = reqwest::Request::new(Method::GET, url.clone());

        fetch.fetch(url.into(), None).await.unwrap();
        fetch.fetch((&request).into(), None).await.unwrap();

        let calls = fetch.inner().calls.lock().unwrap();
        assert_eq!(calls[0].0, "/api/proxy/.well-known/agent.json");
        assert_eq!(calls[1].0, "/api/proxy/.well-known/agent.json");
    }

    #[test]
    fn test_bare_backend_url() {
        let fetch = proxy_fetch();
        assert_eq!(fetch.rewrite("http://localhost:8085"), "/api/proxy");
        assert_eq!(fetch.rewrite("http://localhost:8085/"), "/api/proxy/");
    }

    #[tokio::test]
    async fn test_inner_errors_are_returned_unchanged() {
        let fetch = proxy_fetch();

        let err = fetch
            .fetch("http://localhost:8085/fail".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err, "refused: /api/proxy/fail");

        let err = fetch
            .fetch("https://example.com/fail".into(), None)
            .await
            .unwrap_err();
        assert_eq!(err, "refused: https://example.com/fail");
    }
}
