//! Minimal metrics registry for the admission gate.
//!
//! Decision counters are fixed atomics because they sit on the request path.
//! Labelled counters and histograms are backed by `DashMap` with sorted label
//! keys for deterministic ordering. Histogram buckets are fixed in
//! microseconds.

use dashmap::DashMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pressgate_core::{MetricKind, MetricSnapshot};

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

fn label_key(labels: &[(&str, &str)]) -> Vec<(String, String)> {
    let mut key: Vec<(String, String)> = labels
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    key.sort();
    key
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter()
        .map(|(k, v)| format!("{}=\"{}\"", k, escape_label(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Prometheus float formatting (`+Inf` instead of Rust's `inf`).
fn prom_f64(v: f64) -> String {
    if v.is_infinite() {
        if v > 0.0 { "+Inf".into() } else { "-Inf".into() }
    } else if v.is_nan() {
        "NaN".into()
    } else {
        v.to_string()
    }
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    /// Increment by 1.
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let counter = self
            .map
            .entry(label_key(labels))
            .or_insert_with(|| AtomicU64::new(0));
        counter.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        for r in self.map.iter() {
            let val = r.value().load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{{}}} {}", name, label_str(r.key()), val);
        }
    }
}

// 50us, 100us, 500us, 1ms, 5ms, 10ms, 50ms, 100ms, 1s
const BUCKETS_MICROS: [u64; 9] = [50, 100, 500, 1_000, 5_000, 10_000, 50_000, 100_000, 1_000_000];

#[derive(Default)]
struct AtomicHistogram {
    count: AtomicU64,
    sum: AtomicU64,
    buckets: [AtomicU64; 9],
}

#[derive(Default)]
pub struct HistogramVec {
    map: DashMap<Vec<(String, String)>, AtomicHistogram>,
}

impl HistogramVec {
    /// Observe a duration into cumulative buckets (microsecond scale).
    pub fn observe(&self, labels: &[(&str, &str)], duration: Duration) {
        let hist = self
            .map
            .entry(label_key(labels))
            .or_insert_with(AtomicHistogram::default);
        let micros = duration.as_micros() as u64;

        hist.count.fetch_add(1, Ordering::Relaxed);
        hist.sum.fetch_add(micros, Ordering::Relaxed);

        for (i, &b) in BUCKETS_MICROS.iter().enumerate() {
            if micros <= b {
                hist.buckets[i].fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn count(&self, labels: &[(&str, &str)]) -> u64 {
        self.map
            .get(&label_key(labels))
            .map(|h| h.count.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} histogram", name);
        for r in self.map.iter() {
            let hist = r.value();
            let labels = label_str(r.key());
            let prefix = if labels.is_empty() { String::new() } else { format!("{},", labels) };

            for (i, &le) in BUCKETS_MICROS.iter().enumerate() {
                let count = hist.buckets[i].load(Ordering::Relaxed);
                let _ = writeln!(out, "{}_bucket{{{}le=\"{}\"}} {}", name, prefix, le, count);
            }
            let count = hist.count.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_bucket{{{}le=\"+Inf\"}} {}", name, prefix, count);
            let sum = hist.sum.load(Ordering::Relaxed);
            let _ = writeln!(out, "{}_sum{{{}}} {}", name, labels, sum);
            let _ = writeln!(out, "{}_count{{{}}} {}", name, labels, count);
        }
    }
}

const REJECT_KINDS: [MetricKind; 4] = [
    MetricKind::EventLoopDelay,
    MetricKind::HeapUsed,
    MetricKind::Resident,
    MetricKind::Utilization,
];

/// Admit/reject counters, one slot per rejection kind.
#[derive(Default)]
pub struct DecisionCounters {
    admitted: AtomicU64,
    rejected: [AtomicU64; 4],
}

impl DecisionCounters {
    pub fn admit(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reject(&self, kind: MetricKind) {
        if let Some(i) = REJECT_KINDS.iter().position(|k| *k == kind) {
            self.rejected[i].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self, kind: MetricKind) -> u64 {
        REJECT_KINDS
            .iter()
            .position(|k| *k == kind)
            .map(|i| self.rejected[i].load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {} counter", name);
        let _ = writeln!(out, "{}{{outcome=\"admit\",kind=\"none\"}} {}", name, self.admitted());
        for (i, kind) in REJECT_KINDS.iter().enumerate() {
            let val = self.rejected[i].load(Ordering::Relaxed);
            let _ = writeln!(out, "{}{{outcome=\"reject\",kind=\"{}\"}} {}", name, kind.as_str(), val);
        }
    }
}

#[derive(Default)]
pub struct GateMetrics {
    pub decisions: DecisionCounters,
    pub handler_errors: CounterVec,
    pub sample_duration: HistogramVec, // In Microseconds
}

impl GateMetrics {
    /// Render all metrics plus gauges for the latest snapshot, if any.
    pub fn render(&self, snapshot: Option<&MetricSnapshot>, under_pressure: bool) -> String {
        let mut out = String::new();
        self.decisions.render("pressgate_decisions_total", &mut out);
        self.handler_errors.render("pressgate_handler_errors_total", &mut out);
        self.sample_duration.render("pressgate_sample_duration_micros", &mut out);

        if let Some(s) = snapshot {
            let gauges = [
                ("pressgate_event_loop_delay_ms", prom_f64(s.event_loop_delay_ms)),
                ("pressgate_heap_used_bytes", s.heap_used_bytes.to_string()),
                ("pressgate_resident_bytes", s.resident_bytes.to_string()),
                ("pressgate_utilization", prom_f64(s.utilization)),
            ];
            for (name, val) in gauges {
                let _ = writeln!(out, "# TYPE {} gauge\n{} {}", name, name, val);
            }
        }
        let _ = writeln!(
            out,
            "# TYPE pressgate_under_pressure gauge\npressgate_under_pressure {}",
            if under_pressure { 1 } else { 0 }
        );
        out
    }
}
