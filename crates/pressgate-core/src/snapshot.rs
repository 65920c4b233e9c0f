//! Metric snapshot published by the sampler and read by the gate.

use serde::Serialize;

/// Which health metric a verdict refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    EventLoopDelay,
    HeapUsed,
    Resident,
    Utilization,
    None,
}

impl MetricKind {
    /// Label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::EventLoopDelay => "event_loop_delay",
            MetricKind::HeapUsed => "heap_used",
            MetricKind::Resident => "resident",
            MetricKind::Utilization => "utilization",
            MetricKind::None => "none",
        }
    }
}

/// One fully-formed set of readings. Replaced wholesale on every publish.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricSnapshot {
    /// Scheduler delay in milliseconds, `>= 0`. `+inf` when unmeasurable.
    pub event_loop_delay_ms: f64,
    pub heap_used_bytes: u64,
    pub resident_bytes: u64,
    /// Busy fraction in `[0, 1]`; 0 when unsupported.
    pub utilization: f64,
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self {
            event_loop_delay_ms: 0.0,
            heap_used_bytes: 0,
            resident_bytes: 0,
            utilization: 0.0,
        }
    }
}

/// Turn a raw delay-histogram mean (nanoseconds) into the published delay.
///
/// The probe's own sleep (`resolution_ms`) is subtracted and the result is
/// clamped at 0. A NaN mean (empty or broken histogram) becomes `+inf` so that
/// missing data rejects rather than admits.
pub fn normalize_delay_ms(mean_ns: f64, resolution_ms: f64) -> f64 {
    let ms = mean_ns / 1e6 - resolution_ms;
    if ms.is_nan() {
        return f64::INFINITY;
    }
    ms.max(0.0)
}

/// Clamp a utilization reading into `[0, 1]`; missing or NaN readings are 0.
pub fn normalize_utilization(raw: Option<f64>) -> f64 {
    match raw {
        Some(u) if u.is_finite() => u.clamp(0.0, 1.0),
        _ => 0.0,
    }
}
