//! Shared application state for the pathwarden gateway.
//!
//! The live registry sits behind an `ArcSwap`: request handlers take a
//! lock-free snapshot per decision, and a reload builds a complete registry
//! off to the side before publishing it in one store. A live registry is
//! never mutated in place.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;

use pathwarden_core::error::{PathwardenError, Result};
use pathwarden_core::{Method, Registry, Verdict};

use crate::config::GatewayConfig;
use crate::loader;
use crate::obs::DecisionMetrics;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    registry: ArcSwap<Registry>,
    metrics: DecisionMetrics,
}

impl AppState {
    /// Build state around an already-loaded registry.
    pub fn new(cfg: GatewayConfig, registry: Registry) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry: ArcSwap::from_pointee(registry),
                metrics: DecisionMetrics::default(),
            }),
        }
    }

    /// Load the registry from `authz.clients_dir` and build state.
    pub fn load(cfg: GatewayConfig) -> Result<Self> {
        let registry = loader::load_dir(&cfg.authz.clients_dir)?;
        Ok(Self::new(cfg, registry))
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    /// Current registry snapshot.
    pub fn registry(&self) -> Arc<Registry> {
        self.inner.registry.load_full()
    }

    /// Publish a fully built registry.
    pub fn publish(&self, registry: Registry) {
        self.inner.registry.store(Arc::new(registry));
    }

    /// Rebuild the registry from disk and swap it in.
    ///
    /// On failure the previous registry stays live. A rebuild that comes back
    /// empty while clients are live also counts as a failure: passthrough is
    /// only for a gateway that never had a configuration.
    pub fn reload(&self) -> Result<usize> {
        let dir = &self.inner.cfg.authz.clients_dir;
        let res = loader::load_dir(dir).and_then(|registry| {
            let live = self.inner.registry.load().len();
            if registry.is_empty() && live > 0 {
                return Err(PathwardenError::Config(format!(
                    "reload of '{dir}' produced no clients, {live} live clients kept"
                )));
            }
            Ok(registry)
        });

        match res {
            Ok(registry) => {
                let n = registry.len();
                self.publish(registry);
                self.inner.metrics.reloads.inc(&[("result", "ok")]);
                tracing::info!(dir = %dir, clients = n, "client registry reloaded");
                Ok(n)
            }
            Err(e) => {
                self.inner.metrics.reloads.inc(&[("result", "failed")]);
                tracing::error!(dir = %dir, error = %e, "client registry reload failed, keeping previous registry");
                Err(e)
            }
        }
    }

    /// Decide one request against the current snapshot and record metrics.
    ///
    /// `client_id` is `None` when the proxy did not forward the identity
    /// header; that is only acceptable while nothing is configured.
    pub fn decide(&self, host: &str, client_id: Option<&str>, path: &str, method: Method) -> Result<Verdict> {
        let started = Instant::now();
        let registry = self.inner.registry.load();
        let res = match client_id {
            Some(id) => registry.decide(host, id, path, method),
            None if registry.is_empty() => Ok(Verdict::Passthrough),
            None => Err(PathwardenError::MissingClientHeader(
                self.inner.cfg.authz.client_header.clone(),
            )),
        };

        let m = &self.inner.metrics;
        m.decision_duration.observe(&[], started.elapsed());
        match &res {
            Ok(v) => m.decisions.inc(&[("outcome", v.as_str())]),
            Err(e) => {
                m.decisions.inc(&[("outcome", "denied")]);
                // unknown ids come straight from a request header; keep label cardinality bounded
                let label = match (e, client_id) {
                    (PathwardenError::NotAuthorized { .. }, Some(id)) => id,
                    (PathwardenError::MissingClientHeader(_), _) => "missing",
                    _ => "unknown",
                };
                m.denied.inc(&[("client_id", label)]);
            }
        }
        res
    }

    pub fn metrics(&self) -> &DecisionMetrics {
        &self.inner.metrics
    }

    /// Gauges computed at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![("pathwarden_registry_clients", self.registry().len() as u64)]
    }

    pub fn set_draining(&self) {
        self.inner.metrics.set_draining();
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }
}
