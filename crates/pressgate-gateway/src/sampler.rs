//! Background metric sampler.
//!
//! One task owns the `MetricsSource`. Each tick it reads the source, builds a
//! fresh `MetricSnapshot`, and swaps it in behind an `ArcSwap`. Readers load
//! the current `Arc` without locking, so neither side ever waits on the other.
//! The task sleeps *after* each tick, so a slow tick delays the next one
//! instead of overlapping it.
//!
//! The task is a plain tokio task: it does not keep the runtime alive and is
//! dropped with it on shutdown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio::task::JoinHandle;

use pressgate_core::snapshot::{normalize_delay_ms, normalize_utilization};
use pressgate_core::{is_under_pressure, MetricSnapshot, MetricsSource, Thresholds};

use crate::obs::GateMetrics;

#[derive(Debug, Clone, Copy)]
pub struct SamplerSettings {
    pub interval: Duration,
    pub resolution_ms: f64,
}

pub struct Sampler {
    latest: Arc<ArcSwap<MetricSnapshot>>,
    task: JoinHandle<()>,
    stopped: AtomicBool,
}

impl Sampler {
    /// Take one synchronous sample, publish it, then start the tick loop.
    /// Must be called inside a tokio runtime.
    pub fn start<S: MetricsSource>(
        settings: SamplerSettings,
        mut source: S,
        thresholds: Thresholds,
        metrics: Arc<GateMetrics>,
    ) -> Self {
        let first = sample_once(&mut source, settings.resolution_ms);
        let latest = Arc::new(ArcSwap::from_pointee(first));

        tracing::info!(
            interval_ms = settings.interval.as_millis() as u64,
            resolution_ms = settings.resolution_ms,
            "sampler started"
        );

        let task = tokio::spawn(run(source, Arc::clone(&latest), settings, thresholds, metrics));
        Self {
            latest,
            task,
            stopped: AtomicBool::new(false),
        }
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> MetricSnapshot {
        **self.latest.load()
    }

    /// Cancel the tick loop. Safe to call repeatedly and while a tick runs:
    /// the task is cancelled at its next sleep, so it is never re-armed.
    pub fn stop(&self) {
        if !self.stopped.swap(true, Ordering::AcqRel) {
            self.task.abort();
            tracing::info!("sampler stopped");
        }
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Read every metric once and build a snapshot. Resets the delay histogram.
pub fn sample_once<S: MetricsSource + ?Sized>(source: &mut S, resolution_ms: f64) -> MetricSnapshot {
    let mean_ns = source.event_loop_delay_mean();
    source.reset_event_loop_delay();
    let memory = source.memory_usage();
    let utilization = normalize_utilization(source.utilization_since_previous());

    MetricSnapshot {
        event_loop_delay_ms: normalize_delay_ms(mean_ns, resolution_ms),
        heap_used_bytes: memory.heap_used_bytes,
        resident_bytes: memory.resident_bytes,
        utilization,
    }
}

async fn run<S: MetricsSource>(
    mut source: S,
    latest: Arc<ArcSwap<MetricSnapshot>>,
    settings: SamplerSettings,
    thresholds: Thresholds,
    metrics: Arc<GateMetrics>,
) {
    let mut pressured = is_under_pressure(&latest.load(), &thresholds);
    loop {
        tokio::time::sleep(settings.interval).await;

        let started = Instant::now();
        let snapshot = sample_once(&mut source, settings.resolution_ms);
        metrics.sample_duration.observe(&[], started.elapsed());

        let now = is_under_pressure(&snapshot, &thresholds);
        if now != pressured {
            if now {
                let verdict = pressgate_core::evaluate(&snapshot, &thresholds);
                tracing::warn!(
                    kind = verdict.kind.as_str(),
                    reason = verdict.reason.as_deref().unwrap_or_default(),
                    "gate rejecting"
                );
            } else {
                tracing::info!("gate admitting");
            }
            pressured = now;
        }

        latest.store(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, AtomicUsize};

    use pressgate_core::MemoryUsage;

    /// Source whose heap reading is driven by the test.
    struct Dial {
        heap: Arc<AtomicU64>,
        reads: Arc<AtomicUsize>,
        delay_mean: f64,
    }

    impl MetricsSource for Dial {
        fn event_loop_delay_mean(&mut self) -> f64 {
            self.delay_mean
        }
        fn reset_event_loop_delay(&mut self) {}
        fn memory_usage(&mut self) -> MemoryUsage {
            self.reads.fetch_add(1, Ordering::SeqCst);
            MemoryUsage {
                heap_used_bytes: self.heap.load(Ordering::SeqCst),
                resident_bytes: 0,
            }
        }
        fn utilization_since_previous(&mut self) -> Option<f64> {
            None
        }
    }

    fn settings() -> SamplerSettings {
        SamplerSettings {
            interval: Duration::from_millis(1000),
            resolution_ms: 10.0,
        }
    }

    fn dial(heap: u64) -> (Dial, Arc<AtomicU64>, Arc<AtomicUsize>) {
        let heap = Arc::new(AtomicU64::new(heap));
        let reads = Arc::new(AtomicUsize::new(0));
        let d = Dial {
            heap: Arc::clone(&heap),
            reads: Arc::clone(&reads),
            delay_mean: 12_000_000.0,
        };
        (d, heap, reads)
    }

    #[tokio::test(start_paused = true)]
    async fn first_sample_is_synchronous() {
        let (d, _heap, reads) = dial(77);
        let s = Sampler::start(settings(), d, Thresholds::default(), Arc::default());
        assert_eq!(reads.load(Ordering::SeqCst), 1);
        let snap = s.latest();
        assert_eq!(snap.heap_used_bytes, 77);
        assert!((snap.event_loop_delay_ms - 2.0).abs() < 1e-9);
        assert_eq!(snap.utilization, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_publish_new_snapshots() {
        let (d, heap, _reads) = dial(1);
        let metrics: Arc<GateMetrics> = Arc::default();
        let s = Sampler::start(settings(), d, Thresholds::default(), Arc::clone(&metrics));

        heap.store(500, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(1001)).await;
        assert_eq!(s.latest().heap_used_bytes, 500);
        assert_eq!(metrics.sample_duration.count(&[]), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_freezes_snapshot_and_is_idempotent() {
        let (d, heap, reads) = dial(1);
        let s = Sampler::start(settings(), d, Thresholds::default(), Arc::default());

        s.stop();
        s.stop();
        heap.store(999, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(s.latest().heap_used_bytes, 1);
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    /// Every reading reports the same counter for heap and resident.
    struct Counter(u64);

    impl MetricsSource for Counter {
        fn event_loop_delay_mean(&mut self) -> f64 {
            10_000_000.0
        }
        fn reset_event_loop_delay(&mut self) {}
        fn memory_usage(&mut self) -> MemoryUsage {
            self.0 += 1;
            MemoryUsage {
                heap_used_bytes: self.0,
                resident_bytes: self.0,
            }
        }
        fn utilization_since_previous(&mut self) -> Option<f64> {
            None
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_readers_see_whole_snapshots_while_ticks_publish() {
        let fast = SamplerSettings {
            interval: Duration::from_millis(1),
            resolution_ms: 10.0,
        };
        let s = Arc::new(Sampler::start(fast, Counter(0), Thresholds::default(), Arc::default()));

        let readers: Vec<_> = (0..8)
            .map(|_| {
                let s = Arc::clone(&s);
                tokio::spawn(async move {
                    let mut last = 0;
                    for _ in 0..2_000 {
                        let snap = s.latest();
                        assert_eq!(snap.heap_used_bytes, snap.resident_bytes);
                        assert!(snap.heap_used_bytes >= last);
                        last = snap.heap_used_bytes;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();
        for r in readers {
            r.await.unwrap();
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(s.latest().heap_used_bytes > 1, "sampler kept publishing");
        s.stop();
    }

    #[test]
    fn nan_mean_publishes_unbounded_delay() {
        let (mut d, _heap, _reads) = dial(0);
        d.delay_mean = f64::NAN;
        let snap = sample_once(&mut d, 10.0);
        assert_eq!(snap.event_loop_delay_ms, f64::INFINITY);
    }
}
