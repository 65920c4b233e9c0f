//! Admission decision: snapshot + thresholds -> verdict.
//!
//! Checks run in a fixed order (delay, heap, resident, utilization) and stop
//! at the first breach. A breach is strictly `current > max`.
//! `evaluate` and `is_under_pressure` share `first_breach`, so they cannot
//! disagree.

use std::fmt;

use serde::Serialize;

use crate::snapshot::{MetricKind, MetricSnapshot};
use crate::thresholds::Thresholds;

/// Result of one evaluation. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PressureVerdict {
    pub under_pressure: bool,
    pub reason: Option<String>,
    pub kind: MetricKind,
}

impl PressureVerdict {
    pub fn admit() -> Self {
        Self {
            under_pressure: false,
            reason: None,
            kind: MetricKind::None,
        }
    }
}

/// A metric value in its native unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Millis(f64),
    Bytes(u64),
    Fraction(f64),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reading::Millis(v) => write!(f, "{v}ms"),
            Reading::Bytes(v) => write!(f, "{v} bytes"),
            Reading::Fraction(v) => write!(f, "{v}"),
        }
    }
}

/// First threshold exceeded by a snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub kind: MetricKind,
    pub current: Reading,
    pub max: Reading,
}

impl Breach {
    /// Human-readable reason naming the metric, its maximum, and current value.
    pub fn reason(&self) -> String {
        let metric = match self.kind {
            MetricKind::EventLoopDelay => "event loop delay",
            MetricKind::HeapUsed => "heap used",
            MetricKind::Resident => "resident memory",
            MetricKind::Utilization => "utilization",
            MetricKind::None => return String::new(),
        };
        format!("{metric} {} exceeds max {}", self.current, self.max)
    }
}

pub fn first_breach(snapshot: &MetricSnapshot, thresholds: &Thresholds) -> Option<Breach> {
    if let Some(max) = thresholds.max_event_loop_delay_ms {
        if snapshot.event_loop_delay_ms > max {
            return Some(Breach {
                kind: MetricKind::EventLoopDelay,
                current: Reading::Millis(snapshot.event_loop_delay_ms),
                max: Reading::Millis(max),
            });
        }
    }
    if let Some(max) = thresholds.max_heap_used_bytes {
        if snapshot.heap_used_bytes > max {
            return Some(Breach {
                kind: MetricKind::HeapUsed,
                current: Reading::Bytes(snapshot.heap_used_bytes),
                max: Reading::Bytes(max),
            });
        }
    }
    if let Some(max) = thresholds.max_resident_bytes {
        if snapshot.resident_bytes > max {
            return Some(Breach {
                kind: MetricKind::Resident,
                current: Reading::Bytes(snapshot.resident_bytes),
                max: Reading::Bytes(max),
            });
        }
    }
    if let Some(max) = thresholds.max_utilization {
        if snapshot.utilization > max {
            return Some(Breach {
                kind: MetricKind::Utilization,
                current: Reading::Fraction(snapshot.utilization),
                max: Reading::Fraction(max),
            });
        }
    }
    None
}

/// Full verdict including the reason string.
pub fn evaluate(snapshot: &MetricSnapshot, thresholds: &Thresholds) -> PressureVerdict {
    match first_breach(snapshot, thresholds) {
        Some(b) => PressureVerdict {
            under_pressure: true,
            reason: Some(b.reason()),
            kind: b.kind,
        },
        None => PressureVerdict::admit(),
    }
}

/// Side-effect-free pressure query.
pub fn is_under_pressure(snapshot: &MetricSnapshot, thresholds: &Thresholds) -> bool {
    first_breach(snapshot, thresholds).is_some()
}
