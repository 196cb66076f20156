use std::sync::Arc;

use auth_adapters::Authenticator;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use services::Forum;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn, Span};

use crate::metrics::Metrics;
use crate::methods::dispatch;
use crate::rpc::{RpcError, RpcRequest, RpcResponse};

#[derive(Clone)]
pub struct AppState {
    pub forum: Arc<Forum>,
    pub auth: Arc<dyn Authenticator>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(forum: Forum, auth: Arc<dyn Authenticator>) -> Self {
        Self {
            forum: Arc::new(forum),
            auth,
            metrics: Arc::new(Metrics::new()),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Decodes a request body. Errors carry the request id when one can be read.
fn decode(body: &[u8]) -> Result<RpcRequest, (Option<Value>, RpcError)> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| (None, RpcError::parse_error(e.to_string())))?;
    let id = value.get("id").cloned();
    let request: RpcRequest =
        serde_json::from_value(value).map_err(|e| (id.clone(), RpcError::invalid_request(e.to_string())))?;
    request.validate().map_err(|msg| (id, RpcError::invalid_request(msg)))?;
    Ok(request)
}

#[tracing::instrument(skip_all, fields(method = tracing::field::Empty, caller = tracing::field::Empty))]
async fn handle_rpc(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Json<RpcResponse> {
    let request = match decode(&body) {
        Ok(request) => request,
        Err((id, e)) => {
            debug!(code = e.code, message = %e.message, "undecodable rpc request");
            state.metrics.record("", outcome(&e));
            return Json(RpcResponse::error(id, e));
        }
    };
    let span = Span::current();
    span.record("method", request.method.as_str());

    // Non-ASCII header values count as malformed, not absent.
    let header = headers
        .get(header::AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default());
    let caller = match state.auth.authenticate(header) {
        Ok(caller) => caller,
        Err(e) => {
            warn!(error = %e, "authentication failed");
            state.metrics.record(&request.method, "Unauthorized");
            return Json(RpcResponse::error(request.id, RpcError::unauthorized(e.to_string())));
        }
    };
    span.record("caller", tracing::field::display(&caller));

    match dispatch(&state.forum, &caller, &request.method, request.params).await {
        Ok(result) => {
            debug!("rpc ok");
            state.metrics.record(&request.method, "ok");
            Json(RpcResponse::success(request.id, result))
        }
        Err(e) => {
            if e.code == RpcError::INTERNAL_ERROR {
                error!(code = e.code, message = %e.message, "rpc failed");
            } else {
                debug!(code = e.code, message = %e.message, "rpc rejected");
            }
            state.metrics.record(&request.method, outcome(&e));
            Json(RpcResponse::error(request.id, e))
        }
    }
}

fn outcome(err: &RpcError) -> &str {
    if let Some(kind) = err.kind() {
        return kind;
    }
    match err.code {
        RpcError::METHOD_NOT_FOUND => "MethodNotFound",
        RpcError::INVALID_PARAMS => "InvalidParams",
        RpcError::INVALID_REQUEST => "InvalidRequest",
        RpcError::PARSE_ERROR => "ParseError",
        _ => "Internal",
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/openmetrics-text; version=1.0.0; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
