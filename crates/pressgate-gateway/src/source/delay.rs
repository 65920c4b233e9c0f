//! Scheduler delay probe.
//!
//! A background task sleeps for `resolution` in a loop and records how long
//! each sleep actually took. On an idle runtime the mean is close to
//! `resolution`; the excess is time the task waited to be polled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Running count/sum of probe observations (nanoseconds).
#[derive(Debug, Default)]
pub struct DelayRecorder {
    count: AtomicU64,
    sum_nanos: AtomicU64,
}

impl DelayRecorder {
    pub fn record(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.sum_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Release);
    }

    /// Mean in nanoseconds since the last reset. NaN when empty.
    pub fn mean_nanos(&self) -> f64 {
        let count = self.count.load(Ordering::Acquire);
        let sum = self.sum_nanos.load(Ordering::Relaxed);
        mean_of(sum, count)
    }

    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.sum_nanos.store(0, Ordering::Relaxed);
    }
}

/// `record` bumps the sum before the count, so a concurrent read can see a
/// sum with no count yet. Only completed observations count; with none the
/// mean is NaN (no data), never a sum divided by zero.
fn mean_of(sum_nanos: u64, count: u64) -> f64 {
    if count == 0 {
        return f64::NAN;
    }
    sum_nanos as f64 / count as f64
}

/// Spawn the probe loop. Abort the handle to stop it.
pub fn spawn_probe(recorder: Arc<DelayRecorder>, resolution: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let start = Instant::now();
            tokio::time::sleep(resolution).await;
            recorder.record(start.elapsed());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_recorder_mean_is_nan() {
        assert!(DelayRecorder::default().mean_nanos().is_nan());
    }

    #[test]
    fn sum_without_count_is_nan_not_infinite() {
        assert!(mean_of(10_000_000, 0).is_nan());
        assert_eq!(mean_of(30, 3), 10.0);
    }

    #[test]
    fn mean_and_reset() {
        let r = DelayRecorder::default();
        r.record(Duration::from_millis(10));
        r.record(Duration::from_millis(20));
        assert_eq!(r.mean_nanos(), 15_000_000.0);
        r.reset();
        assert!(r.mean_nanos().is_nan());
    }

    #[tokio::test(start_paused = true)]
    async fn probe_records_sleeps() {
        let r = Arc::new(DelayRecorder::default());
        let probe = spawn_probe(Arc::clone(&r), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(55)).await;
        probe.abort();

        let mean = r.mean_nanos();
        assert!(mean >= 10_000_000.0, "mean was {mean}");
        assert!(mean < 11_000_000.0, "mean was {mean}");
    }
}
