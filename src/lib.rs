//! Backend proxy shim: `/api/proxy/{*path}` forwarding plus a proxy-aware
//! fetch wrapper for clients.

pub mod config;
pub mod fetch;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::{BackendUrl, ProxyConfig};
pub use fetch::{Fetch, FetchInput, HttpFetch, ProxyFetch, RequestInit};
pub use http::HttpServer;
pub use lifecycle::{Shutdown, ShutdownSignal};
