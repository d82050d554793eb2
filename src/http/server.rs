//! HTTP server setup and the proxy route handlers.
//!
//! # Responsibilities
//! - Create the Axum Router for `/api/proxy/{*path}`
//! - Wire up middleware (tracing, request ID)
//! - Forward GET/POST to the backend and relay the reply
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, RawQuery, State},
    http::{Method, Uri},
    response::Response,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use url::Url;

use crate::config::{BackendUrl, BackendUrlError, ProxyConfig};
use crate::http::error::ProxyError;
use crate::http::forward::{split_segments, target_url, ForwardRequest};
use crate::http::relay::{relay, RelayMode};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Path prefix the proxy is mounted under.
pub const PROXY_PREFIX: &str = "/api/proxy";

/// Errors raised while setting the server up.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Backend(#[from] BackendUrlError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendUrl>,
    pub client: reqwest::Client,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(backend: BackendUrl, max_body_bytes: usize) -> Result<Self, reqwest::Error> {
        // One backend, addressed directly.
        let client = reqwest::Client::builder().no_proxy().build()?;

        Ok(Self {
            backend: Arc::new(backend),
            client,
            max_body_bytes,
        })
    }
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let backend = BackendUrl::try_from(&config.backend)?;
        let state = AppState::new(backend, config.limits.max_body_bytes)?;

        Ok(Self {
            router: build_router(state),
            config,
        })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.triggered().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/proxy/{*path}", get(proxy_get).post(proxy_post))
        .route("/api/proxy", get(missing_path).post(missing_path))
        .route("/api/proxy/", get(missing_path).post(missing_path))
        .with_state(state)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// `GET /api/proxy/{*path}`: path and query go upstream.
async fn proxy_get(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let url = match resolve_target(&state, path, query.as_deref()) {
        Ok(url) => url,
        Err(e) => return finish(Method::GET, uri.path(), start, Err(e)),
    };

    let target = url.to_string();
    let result = forward(&state, ForwardRequest::get(url)).await;
    finish(Method::GET, &target, start, result)
}

/// `POST /api/proxy/{*path}`: path and body go upstream; the query does not.
async fn proxy_post(
    State(state): State<AppState>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
    body: Body,
) -> Result<Response, ProxyError> {
    let start = Instant::now();
    let url = match resolve_target(&state, path, None) {
        Ok(url) => url,
        Err(e) => return finish(Method::POST, uri.path(), start, Err(e)),
    };

    let target = url.to_string();
    let result = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => forward(&state, ForwardRequest::post(url, body)).await,
        Err(e) => Err(ProxyError::BodyRead(e.to_string())),
    };
    finish(Method::POST, &target, start, result)
}

/// `/api/proxy` with nothing after it.
async fn missing_path(method: Method, uri: Uri) -> Result<Response, ProxyError> {
    let start = Instant::now();
    finish(
        method,
        uri.path(),
        start,
        Err(ProxyError::MalformedTarget("no path segments".into())),
    )
}

fn resolve_target(
    state: &AppState,
    path: Result<Path<String>, PathRejection>,
    query: Option<&str>,
) -> Result<Url, ProxyError> {
    let Path(path) = path.map_err(|e| ProxyError::MalformedTarget(e.body_text()))?;
    target_url(&state.backend, &split_segments(&path), query)
}

async fn forward(
    state: &AppState,
    request: ForwardRequest,
) -> Result<(RelayMode, Response), ProxyError> {
    tracing::info!(method = %request.method, target_url = %request.url, "Proxying request");

    let method = request.method.clone();
    let upstream = request.send(&state.client).await?;

    tracing::debug!(
        method = %method,
        target_url = %upstream.url(),
        status = upstream.status().as_u16(),
        "Backend responded"
    );
    relay(upstream).await
}

/// Log and count the outcome of one call.
///
/// `target` is the backend URL when one was built, else the inbound path.
fn finish(
    method: Method,
    target: &str,
    start: Instant,
    result: Result<(RelayMode, Response), ProxyError>,
) -> Result<Response, ProxyError> {
    match result {
        Ok((mode, response)) => {
            let status = response.status().as_u16();
            tracing::debug!(
                method = %method,
                target_url = %target,
                status,
                relay = mode.as_str(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Relaying backend response"
            );
            metrics::record_request(method.as_str(), status, mode.as_str(), start);
            Ok(response)
        }
        Err(e) => {
            tracing::error!(
                method = %method,
                target_url = %target,
                kind = e.kind(),
                error = %e,
                "Proxy request failed"
            );
            metrics::record_request(method.as_str(), 500, metrics::RELAY_ERROR, start);
            Err(e)
        }
    }
}
