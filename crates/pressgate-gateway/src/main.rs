//! pressgate demo server.
//!
//! - `GET /` behind the pressure gate
//! - ops routes: /healthz, /readyz, /metrics, /pressure
//! - config: `pressgate.yaml` or the path given as the first argument

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tracing_subscriber::{fmt, EnvFilter};

use pressgate_core::error::{PressGateError, Result};
use pressgate_gateway::{app_state, config, gate::HandlerRegistry, router, source};

#[global_allocator]
static HEAP: source::TrackingAllocator = source::TrackingAllocator::new();

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "pressgate.yaml".into());
    if let Err(e) = run(&path).await {
        tracing::error!(code = e.code().as_str(), error = %e, "pressgate exited");
        std::process::exit(1);
    }
}

async fn run(path: &str) -> Result<()> {
    let cfg = config::load_from_file(path)?;
    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        PressGateError::InvalidConfiguration(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;

    let resolution = cfg.pressure.resolution();
    let state = app_state::AppState::new(
        &cfg,
        || source::SystemMetricsSource::start(resolution).with_heap_tracker(&HEAP),
        &HandlerRegistry::new(),
    )?;

    let app = Router::new().route("/", get(|| async { "hello" }));
    let gate = state.gate().clone();
    let app = router::build_router(state, app);

    tracing::info!(%listen, active = gate.is_active(), "pressgate starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| PressGateError::Io(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| PressGateError::Io(format!("server failed: {e}")))?;

    gate.stop();
    tracing::info!("pressgate stopped");
    Ok(())
}
