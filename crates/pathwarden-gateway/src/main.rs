//! pathwarden gateway
//!
//! - Check listener: every request is an Envoy `ext_authz` HTTP check
//! - gRPC listener: Envoy `ext_authz` v3 `Authorization/Check`
//! - Ops listener: /healthz, /readyz, /metrics
//! - SIGHUP rebuilds the client registry and swaps it in
//! - SIGINT/SIGTERM flip readiness to draining, then stop both listeners

use std::process::ExitCode;

use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

use pathwarden_core::error::Result;
use pathwarden_gateway::{app_state::AppState, config, router, transport::grpc::GrpcCheck};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, class = e.class().as_str(), "pathwarden-gateway failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = config::config_path();
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.gateway.listen_addr()?;
    let grpc_listen = cfg.gateway.grpc_listen_addr()?;
    let ops_listen = cfg.gateway.ops_listen_addr()?;

    tracing::info!(
        config = %path,
        client_header = %cfg.authz.client_header,
        host_header = %cfg.authz.host_header,
        "configuring pathwarden"
    );

    let state = AppState::load(cfg)?;
    let registry = state.registry();
    if registry.is_empty() {
        tracing::warn!("client registry is empty, running in passthrough mode (all requests allowed)");
    } else {
        tracing::info!(clients = ?registry.client_ids(), "client registry ready");
    }

    #[cfg(unix)]
    spawn_reload_on_sighup(state.clone());

    let (stop_tx, stop_rx) = watch::channel(false);

    let check_listener = tokio::net::TcpListener::bind(listen).await?;
    let ops_listener = tokio::net::TcpListener::bind(ops_listen).await?;
    tracing::info!(%listen, %grpc_listen, %ops_listen, "pathwarden-gateway starting");

    let check = axum::serve(check_listener, router::build_check_router(state.clone()))
        .with_graceful_shutdown(wait_stop(stop_rx.clone()));
    let check = async move { check.await };
    let grpc = tonic::transport::Server::builder()
        .add_service(GrpcCheck::new(state.clone()).into_server())
        .serve_with_shutdown(grpc_listen, wait_stop(stop_rx.clone()));
    let grpc = async move { grpc.await.map_err(std::io::Error::other) };
    let ops = axum::serve(ops_listener, router::build_ops_router(state.clone()))
        .with_graceful_shutdown(wait_stop(stop_rx));
    let ops = async move { ops.await };

    let drain = {
        let state = state.clone();
        async move {
            shutdown_signal().await;
            state.set_draining();
            tracing::info!("shutdown requested, draining");
            let _ = stop_tx.send(true);
            Ok::<(), std::io::Error>(())
        }
    };

    tokio::try_join!(check, grpc, ops, drain)?;
    tracing::info!("pathwarden-gateway stopped");
    Ok(())
}

async fn wait_stop(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[cfg(unix)]
fn spawn_reload_on_sighup(state: AppState) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hup = match signal(SignalKind::hangup()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGHUP, reload disabled");
                return;
            }
        };
        while hup.recv().await.is_some() {
            let s = state.clone();
            // reload failures are logged inside; the previous registry stays live
            if let Err(e) = tokio::task::spawn_blocking(move || s.reload()).await {
                tracing::error!(error = %e, "reload task failed");
            }
        }
    });
}
