//! pressgate gateway library entry.
//!
//! Wires the sampler, the process metrics source, the admission gate and its
//! axum middleware, and the ops endpoints. Consumed by the binary
//! (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod gate;
pub mod obs;
pub mod ops;
pub mod router;
pub mod sampler;
pub mod source;
