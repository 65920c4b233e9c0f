//! Lightweight in-process metrics.
//!
//! Gate decisions, handler failures, and sampler tick cost are stored as
//! atomics and rendered by the `/metrics` handler together with the latest
//! snapshot.

pub mod metrics;

pub use metrics::GateMetrics;
