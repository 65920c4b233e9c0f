//! Axum middleware entry point.
//!
//! Mount with `axum::middleware::from_fn_with_state(gate, pressure_gate)` on
//! the routes that should be protected.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use super::Gate;

pub async fn pressure_gate(State(gate): State<Gate>, req: Request, next: Next) -> Response {
    let verdict = gate.evaluate();
    gate.on_request(req, verdict, next).await
}
