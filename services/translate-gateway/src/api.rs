//! HTTP surface of the gateway
//!
//! `GET /translate?state=&from=&to=&text=` evaluates `mstranslate` against the
//! named state. Errors use the JSON shape
//! `{"error":{"type":"...","message":"...","request_id":"req_..."}}`.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{info, instrument, warn};
use translator::{StateRegistry, TokenSource, Translator};

use crate::metrics::record_request;

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<Translator>,
    pub registry: Arc<StateRegistry>,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
}

/// Build the router. `max_connections` caps concurrently served requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/translate", get(translate_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct TranslateQuery {
    state: Option<String>,
    from: Option<String>,
    to: Option<String>,
    text: Option<String>,
}

fn json_response(status: StatusCode, body: serde_json::Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

fn error_response(status: StatusCode, kind: &str, message: &str, request_id: &str) -> Response {
    json_response(
        status,
        serde_json::json!({
            "error": {
                "type": kind,
                "message": message,
                "request_id": request_id,
            }
        }),
    )
}

/// HTTP status for a failed translation.
pub fn status_for(err: &translator::Error) -> StatusCode {
    use translator::Error;
    if err.is_timeout() {
        return StatusCode::GATEWAY_TIMEOUT;
    }
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Config(_) | Error::Type(_) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        Error::Auth(_) | Error::Http(_) | Error::Status { .. } | Error::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
    }
}

#[instrument(skip_all, fields(request_id))]
async fn translate_handler(
    State(state): State<AppState>,
    Query(query): Query<TranslateQuery>,
) -> Response {
    let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
    tracing::Span::current().record("request_id", request_id.as_str());

    let (Some(name), Some(from), Some(to), Some(text)) =
        (query.state, query.from, query.to, query.text)
    else {
        record_request("/translate", 400);
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "state, from, to and text query parameters are required",
            &request_id,
        );
    };

    match state.translator.translate(&name, &from, &to, &text).await {
        Ok(result) => {
            record_request("/translate", 200);
            info!(state = %name, from = %from, to = %to, "translation served");
            json_response(StatusCode::OK, serde_json::json!({ "result": result }))
        }
        Err(e) => {
            let status = status_for(&e);
            record_request("/translate", status.as_u16());
            warn!(
                state = %name,
                error = %e,
                status = status.as_u16(),
                "translation request failed"
            );
            error_response(status, e.kind(), &e.to_string(), &request_id)
        }
    }
}

/// Health endpoint: registered states and whether each holds a usable token.
///
/// Reads token state without waiting on refreshes, so a slow token endpoint
/// never delays the answer.
async fn health_handler(State(state): State<AppState>) -> Response {
    let mut states = Vec::new();
    for name in state.registry.names() {
        let entry = match state.registry.resolve(&name) {
            Ok(cache) => serde_json::json!({
                "name": name,
                "token_cached": cache.snapshot().is_some(),
                "needs_refresh": cache.needs_refresh(),
                "refreshing": cache.is_refreshing(),
            }),
            Err(e) => serde_json::json!({ "name": name, "error": e.to_string() }),
        };
        states.push(entry);
    }

    let (status_code, status) = if states.is_empty() {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    } else {
        (StatusCode::OK, "healthy")
    };

    json_response(
        status_code,
        serde_json::json!({
            "status": status,
            "states": states,
            "uptime_seconds": state.started_at.elapsed().as_secs(),
        }),
    )
}

/// Prometheus metrics endpoint: metrics in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        state.prometheus.render(),
    )
}
