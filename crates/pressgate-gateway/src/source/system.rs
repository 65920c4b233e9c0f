//! `MetricsSource` for the current process.
//!
//! Resident memory and CPU usage come from sysinfo. A single process refresh
//! happens in `memory_usage`; `utilization_since_previous` reads the CPU usage
//! computed by that refresh, which sysinfo measures against the previous one.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Pid, System};
use tokio::task::JoinHandle;

use pressgate_core::{MemoryUsage, MetricsSource};

use super::alloc::TrackingAllocator;
use super::delay::{spawn_probe, DelayRecorder};

pub struct SystemMetricsSource {
    delay: Arc<DelayRecorder>,
    probe: JoinHandle<()>,
    heap: Option<&'static TrackingAllocator>,
    system: System,
    pid: Option<Pid>,
    parallelism: f64,
    refreshes: u64,
}

impl SystemMetricsSource {
    /// Start the delay probe at `resolution`.
    ///
    /// # Panics
    /// Outside a tokio runtime, since the probe is spawned as a task.
    pub fn start(resolution: Duration) -> Self {
        let delay = Arc::new(DelayRecorder::default());
        let probe = spawn_probe(Arc::clone(&delay), resolution);

        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!(error = %e, "current pid unavailable; resident memory and utilization disabled");
                None
            }
        };
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get() as f64)
            .unwrap_or(1.0);

        Self {
            delay,
            probe,
            heap: None,
            system: System::new(),
            pid,
            parallelism,
            refreshes: 0,
        }
    }

    /// Report heap usage from an installed `TrackingAllocator`.
    pub fn with_heap_tracker(mut self, heap: &'static TrackingAllocator) -> Self {
        self.heap = Some(heap);
        self
    }
}

impl MetricsSource for SystemMetricsSource {
    fn event_loop_delay_mean(&mut self) -> f64 {
        self.delay.mean_nanos()
    }

    fn reset_event_loop_delay(&mut self) {
        self.delay.reset();
    }

    fn memory_usage(&mut self) -> MemoryUsage {
        let heap_used_bytes = self.heap.map(TrackingAllocator::allocated).unwrap_or(0);

        let resident_bytes = match self.pid {
            Some(pid) if self.system.refresh_process(pid) => {
                self.refreshes += 1;
                self.system.process(pid).map(|p| p.memory()).unwrap_or(0)
            }
            _ => 0,
        };

        MemoryUsage {
            heap_used_bytes,
            resident_bytes,
        }
    }

    fn utilization_since_previous(&mut self) -> Option<f64> {
        // The first refresh has no baseline to diff against.
        if self.refreshes < 2 {
            return None;
        }
        let pid = self.pid?;
        let cpu_percent = self.system.process(pid)?.cpu_usage() as f64;
        Some(cpu_percent / 100.0 / self.parallelism)
    }
}

impl Drop for SystemMetricsSource {
    fn drop(&mut self) {
        self.probe.abort();
    }
}
