//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use pressgate_core::error::{PressGateError, Result};

pub use schema::{GatewayConfig, PressureConfig, ServerSection};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PressGateError::Io(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| PressGateError::InvalidConfiguration(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
