//! # api-adapters
//!
//! JSON-RPC 2.0 surface of the forum. [`methods::dispatch`] is transport
//! agnostic; the `web-axum` feature serves it over HTTP at `POST /rpc`
//! alongside `/health` and `/metrics`.

pub mod methods;
pub mod metrics;
pub mod rpc;

#[cfg(feature = "web-axum")]
pub mod http;

pub use methods::dispatch;
pub use metrics::Metrics;
pub use rpc::{RpcError, RpcRequest, RpcResponse};

#[cfg(feature = "web-axum")]
pub use http::{router, AppState};
