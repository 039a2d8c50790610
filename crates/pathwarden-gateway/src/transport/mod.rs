//! Transport layer (Envoy `ext_authz` HTTP and gRPC v3 check protocols).
//!
//! Translates proxy check requests into registry decisions and decisions back
//! into protocol responses. No decision logic lives here.

pub mod check;
pub mod grpc;
