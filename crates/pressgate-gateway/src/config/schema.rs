use std::time::Duration;

use serde::Deserialize;
use pressgate_core::error::{PressGateError, Result};
use pressgate_core::Thresholds;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub pressure: PressureConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PressGateError::UnsupportedVersion);
        }
        self.pressure.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

/// Admission gate settings. Every `max_*` field is disabled when `<= 0`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PressureConfig {
    #[serde(default)]
    pub max_event_loop_delay_ms: f64,
    #[serde(default)]
    pub max_heap_used_bytes: u64,
    #[serde(default)]
    pub max_resident_bytes: u64,
    #[serde(default)]
    pub max_utilization: f64,

    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,
    #[serde(default = "default_resolution_ms")]
    pub resolution_ms: u64,
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub disable_check: bool,

    /// Name of a handler registered in the `HandlerRegistry`.
    #[serde(default)]
    pub pressure_handler: Option<String>,
}

impl Default for PressureConfig {
    fn default() -> Self {
        Self {
            max_event_loop_delay_ms: 0.0,
            max_heap_used_bytes: 0,
            max_resident_bytes: 0,
            max_utilization: 0.0,
            sample_interval_ms: default_sample_interval_ms(),
            resolution_ms: default_resolution_ms(),
            retry_after_secs: default_retry_after_secs(),
            message: default_message(),
            disable_check: false,
            pressure_handler: None,
        }
    }
}

impl PressureConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=60000).contains(&self.sample_interval_ms) {
            return Err(PressGateError::InvalidConfiguration(
                "pressure.sample_interval_ms must be between 1 and 60000".into(),
            ));
        }
        if self.resolution_ms == 0 || self.resolution_ms > self.sample_interval_ms {
            return Err(PressGateError::InvalidConfiguration(
                "pressure.resolution_ms must be between 1 and sample_interval_ms".into(),
            ));
        }
        if self.max_event_loop_delay_ms.is_nan() {
            return Err(PressGateError::InvalidConfiguration(
                "pressure.max_event_loop_delay_ms must be a number".into(),
            ));
        }
        if self.max_utilization.is_nan() || self.max_utilization > 1.0 {
            return Err(PressGateError::InvalidConfiguration(
                "pressure.max_utilization must be at most 1.0".into(),
            ));
        }
        Ok(())
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds::from_raw(
            self.max_event_loop_delay_ms,
            self.max_heap_used_bytes,
            self.max_resident_bytes,
            self.max_utilization,
        )
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn resolution(&self) -> Duration {
        Duration::from_millis(self.resolution_ms)
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_sample_interval_ms() -> u64 {
    1000
}
fn default_resolution_ms() -> u64 {
    10
}
fn default_retry_after_secs() -> u64 {
    10
}
fn default_message() -> String {
    "Service Unavailable".into()
}
