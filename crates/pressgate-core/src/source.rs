//! Metrics source contract consumed by the sampler.
//!
//! The sampler owns its source exclusively and calls it from one task at a
//! time, so methods take `&mut self` and implementations need not be `Sync`.

/// Process memory reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryUsage {
    pub heap_used_bytes: u64,
    pub resident_bytes: u64,
}

/// Provider of raw process health readings.
pub trait MetricsSource: Send + 'static {
    /// Mean of the delay histogram since the last reset, in nanoseconds.
    /// NaN when nothing has been recorded.
    fn event_loop_delay_mean(&mut self) -> f64;

    /// Clear the delay histogram accumulator.
    fn reset_event_loop_delay(&mut self);

    fn memory_usage(&mut self) -> MemoryUsage;

    /// Busy fraction since the previous call. `None` when unsupported or when
    /// there is no previous reading yet.
    fn utilization_since_previous(&mut self) -> Option<f64>;
}

impl<T: MetricsSource + ?Sized> MetricsSource for Box<T> {
    fn event_loop_delay_mean(&mut self) -> f64 {
        (**self).event_loop_delay_mean()
    }
    fn reset_event_loop_delay(&mut self) {
        (**self).reset_event_loop_delay()
    }
    fn memory_usage(&mut self) -> MemoryUsage {
        (**self).memory_usage()
    }
    fn utilization_since_previous(&mut self) -> Option<f64> {
        (**self).utilization_since_previous()
    }
}
