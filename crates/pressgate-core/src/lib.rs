//! pressgate core: runtime-free admission primitives.
//!
//! This crate holds the metric snapshot model, threshold configuration, the
//! pure admission decision (`evaluate` / `is_under_pressure`), and the narrow
//! `MetricsSource` contract the sampler pulls readings from. It carries no
//! runtime or HTTP dependencies so the decision logic can be tested and
//! reused on its own.
//!
//! # Guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here.
//! All fallible paths surface as `PressGateError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod snapshot;
pub mod source;
pub mod thresholds;
pub mod verdict;

/// Shared result type.
pub use error::{PressGateError, Result};
pub use snapshot::{MetricKind, MetricSnapshot};
pub use source::{MemoryUsage, MetricsSource};
pub use thresholds::Thresholds;
pub use verdict::{evaluate, is_under_pressure, PressureVerdict};
