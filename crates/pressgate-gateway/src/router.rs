//! Axum router wiring.
//!
//! Application routes go behind the pressure gate; the ops routes stay
//! outside it so probes keep answering while requests are being shed.

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, gate::pressure_gate, ops};

pub fn build_router(state: AppState, app: Router) -> Router {
    let gated = app.layer(middleware::from_fn_with_state(
        state.gate().clone(),
        pressure_gate,
    ));

    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .route("/pressure", get(ops::pressure))
        .with_state(state)
        .merge(gated)
}
