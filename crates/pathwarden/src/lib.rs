//! Top-level facade crate for pathwarden.
//!
//! Re-exports the policy engine and the gateway library so users can depend on
//! a single crate.

pub mod core {
    pub use pathwarden_core::*;
}

pub mod gateway {
    pub use pathwarden_gateway::*;
}
