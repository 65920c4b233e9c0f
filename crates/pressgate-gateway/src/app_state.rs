//! Shared application state: the admission gate built from config.
//!
//! Startup errors are returned as `Result` so `main` can report them instead
//! of panicking.

use pressgate_core::error::Result;
use pressgate_core::MetricsSource;

use crate::config::GatewayConfig;
use crate::gate::{Gate, HandlerRegistry};

#[derive(Clone)]
pub struct AppState {
    gate: Gate,
}

impl AppState {
    /// Build the gate from `cfg.pressure`. `source` is only invoked when a
    /// pressure check is active.
    ///
    /// An active gate needs a tokio runtime; see `Gate::configure`.
    pub fn new<S, F>(cfg: &GatewayConfig, source: F, handlers: &HandlerRegistry) -> Result<Self>
    where
        S: MetricsSource,
        F: FnOnce() -> S,
    {
        let gate = Gate::configure(&cfg.pressure, source, handlers)?;
        Ok(Self { gate })
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }
}
