//! pathwarden gateway library entry.
//!
//! This crate wires the directory loader, the atomically published registry,
//! the HTTP and gRPC check adapters and the operational endpoints into one service. It
//! is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod loader;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
