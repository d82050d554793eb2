//! HTTP proxy route handler.
//!
//! # Data Flow
//! ```text
//! GET/POST /api/proxy/{*path}
//!     → server.rs (Axum setup, request ID, handlers)
//!     → forward.rs (target URL, fixed JSON headers, send to backend)
//!     → relay.rs (stream or re-encode the backend response)
//!     → error.rs (any failure → 500 JSON envelope)
//!     → Send to client
//! ```

pub mod error;
pub mod forward;
pub mod relay;
pub mod server;

pub use error::{ErrorBody, ProxyError, PROXY_FAILURE};
pub use relay::RelayMode;
pub use server::{build_router, AppState, HttpServer, ServerError, PROXY_PREFIX};
