//! Multi-client policy registry.
//!
//! Maps every client id and alias to a shared `Arc<Policy>`. A registry is
//! assembled once (startup or reload) and then only read; callers publish a
//! finished registry rather than mutating a live one.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PathwardenError, Result};
use crate::policy::{Method, Policy};

/// Positive outcome of a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A client policy permitted the request.
    Allowed,
    /// Registry is empty: nothing is configured, every request passes.
    Passthrough,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Passthrough => "passthrough",
        }
    }
}

/// Client id / alias -> policy lookup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    policies: HashMap<String, Arc<Policy>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `policy` under its client id and every alias.
    /// Existing entries with the same key are replaced.
    pub fn add(&mut self, policy: Policy) -> Result<()> {
        if policy.client_id().is_empty() {
            return Err(PathwardenError::MissingClientId);
        }

        let policy = Arc::new(policy);
        let keys = std::iter::once(policy.client_id()).chain(policy.aliases().iter().map(String::as_str));
        for key in keys {
            if let Some(prev) = self.policies.insert(key.to_string(), Arc::clone(&policy)) {
                tracing::warn!(
                    key = %key,
                    previous = %prev.client_id(),
                    replacement = %policy.client_id(),
                    "client id registered twice, last definition wins"
                );
            }
        }
        Ok(())
    }

    /// Number of registered keys (ids and aliases).
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn get(&self, client_id: &str) -> Option<&Arc<Policy>> {
        self.policies.get(client_id)
    }

    /// Registered keys, sorted.
    pub fn client_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.policies.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Render the decision for one request.
    ///
    /// `Ok` means the request may proceed. `Err` carries the deny reason
    /// (unknown client, or the client's policy refused the request).
    pub fn decide(&self, host: &str, client_id: &str, path: &str, method: Method) -> Result<Verdict> {
        if self.policies.is_empty() {
            return Ok(Verdict::Passthrough);
        }

        let policy = self
            .policies
            .get(client_id)
            .ok_or_else(|| PathwardenError::UnknownClient(client_id.to_string()))?;

        if !policy.is_allowed(host, path, method) {
            return Err(PathwardenError::NotAuthorized {
                client_id: client_id.to_string(),
                method,
                path: path.to_string(),
            });
        }
        Ok(Verdict::Allowed)
    }
}
