//! Metrics sources for a tokio process.
//!
//! - `delay`: scheduler-lag probe feeding a lock-free count/sum recorder
//! - `alloc`: opt-in global allocator that tracks live heap bytes
//! - `system`: `MetricsSource` impl combining the two with sysinfo process stats

pub mod alloc;
pub mod delay;
pub mod system;

pub use alloc::TrackingAllocator;
pub use delay::DelayRecorder;
pub use system::SystemMetricsSource;
