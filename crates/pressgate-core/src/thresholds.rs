//! Threshold configuration, compiled once at startup.

/// Per-metric maxima. `None` means the check is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    pub max_event_loop_delay_ms: Option<f64>,
    pub max_heap_used_bytes: Option<u64>,
    pub max_resident_bytes: Option<u64>,
    pub max_utilization: Option<f64>,
}

impl Thresholds {
    /// Build from raw configured values; anything `<= 0` disables that check.
    pub fn from_raw(
        max_event_loop_delay_ms: f64,
        max_heap_used_bytes: u64,
        max_resident_bytes: u64,
        max_utilization: f64,
    ) -> Self {
        Self {
            max_event_loop_delay_ms: positive_f64(max_event_loop_delay_ms),
            max_heap_used_bytes: positive_u64(max_heap_used_bytes),
            max_resident_bytes: positive_u64(max_resident_bytes),
            max_utilization: positive_f64(max_utilization),
        }
    }

    /// True when every check is disabled.
    pub fn is_disabled(&self) -> bool {
        self.max_event_loop_delay_ms.is_none()
            && self.max_heap_used_bytes.is_none()
            && self.max_resident_bytes.is_none()
            && self.max_utilization.is_none()
    }
}

fn positive_f64(v: f64) -> Option<f64> {
    (v > 0.0).then_some(v)
}

fn positive_u64(v: u64) -> Option<u64> {
    (v > 0).then_some(v)
}
