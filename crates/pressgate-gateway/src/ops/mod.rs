//! Operational HTTP endpoints.
//!
//! - `/healthz`  : liveness
//! - `/readyz`   : readiness (503 while under pressure)
//! - `/metrics`  : Prometheus text format
//! - `/pressure` : current verdict and snapshot as JSON

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app_state::AppState;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.gate().is_under_pressure() {
        (StatusCode::SERVICE_UNAVAILABLE, "under pressure")
    } else {
        (StatusCode::OK, "ready")
    }
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    let body = state.gate().render_metrics();

    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
        .into_response()
}

pub async fn pressure(State(state): State<AppState>) -> Json<serde_json::Value> {
    let gate = state.gate();
    let verdict = gate.evaluate();
    Json(json!({
        "active": gate.is_active(),
        "under_pressure": verdict.under_pressure,
        "reason": verdict.reason,
        "kind": verdict.kind,
        "snapshot": gate.snapshot(),
    }))
}
