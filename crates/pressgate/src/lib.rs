//! Top-level facade crate for pressgate.
//!
//! Re-exports core types and the gateway library so users can depend on a single crate.

pub mod core {
    pub use pressgate_core::*;
}

pub mod gateway {
    pub use pressgate_gateway::*;
}
