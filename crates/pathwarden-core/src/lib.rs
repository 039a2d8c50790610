//! pathwarden core: policy model, compiler, and multi-client registry.
//!
//! This crate holds the decision semantics of the authorization engine. It
//! performs no I/O and carries no runtime dependencies, so the same registry
//! can be driven by the HTTP gateway, tests, or any other adapter.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Untrusted configuration is reported as `PathwardenError` or as
//! `CompileWarning`s, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod policy;
pub mod registry;

pub use error::{ErrorClass, PathwardenError, Result};
pub use policy::{Method, Mode, Policy};
pub use registry::{Registry, Verdict};
