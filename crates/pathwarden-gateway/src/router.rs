//! Axum router wiring.
//!
//! The check router answers every path (the proxy forwards the original
//! request path), so operational endpoints live on a separate router bound to
//! the ops listener.

use axum::{routing::get, Router};

use crate::{app_state::AppState, ops, transport};

pub fn build_check_router(state: AppState) -> Router {
    Router::new()
        .fallback(transport::check::check)
        .with_state(state)
}

pub fn build_ops_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/metrics", get(ops::metrics))
        .with_state(state)
}
