//! Per-client compiled rule set and the matching algorithm.
//!
//! Matching is two-tier: the request's own method bucket first, then the
//! `All` bucket. Any match yields the configured mode; no match yields its
//! opposite. Allow mode is therefore strictly an allow-list and deny mode
//! strictly a deny-list.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use super::compile::CompileWarning;
use super::method::Method;
use crate::error::{PathwardenError, Result};

/// Policy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Listed endpoints are permitted, everything else denied.
    Allow,
    /// Listed endpoints are forbidden, everything else permitted.
    Deny,
}

impl Mode {
    /// Parse `allow` / `deny` case-insensitively. Surrounding whitespace is
    /// not accepted.
    pub fn parse(s: &str) -> Option<Mode> {
        match s.to_ascii_lowercase().as_str() {
            "allow" => Some(Mode::Allow),
            "deny" => Some(Mode::Deny),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Allow => "allow",
            Mode::Deny => "deny",
        }
    }
}

/// One client's compiled authorization rules.
/// Built once by the compiler, then shared read-only via `Arc`.
#[derive(Debug, Clone)]
pub struct Policy {
    client_id: String,
    aliases: Vec<String>,
    mode: Mode,
    hosts: HashSet<String>,
    endpoints: HashMap<Method, Vec<Regex>>,
}

impl Policy {
    pub fn new(client_id: impl Into<String>, mode: Mode) -> Self {
        Self {
            client_id: client_id.into(),
            aliases: Vec::new(),
            mode,
            hosts: HashSet::new(),
            endpoints: HashMap::new(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }
    pub fn mode(&self) -> Mode {
        self.mode
    }
    /// True in allow-list mode.
    pub fn allow(&self) -> bool {
        self.mode == Mode::Allow
    }
    pub fn hosts(&self) -> &HashSet<String> {
        &self.hosts
    }
    pub fn endpoints(&self) -> &HashMap<Method, Vec<Regex>> {
        &self.endpoints
    }
    /// Patterns registered under `method`, if any.
    pub fn patterns(&self, method: Method) -> Option<&[Regex]> {
        self.endpoints.get(&method).map(Vec::as_slice)
    }
    pub fn has_endpoints(&self) -> bool {
        !self.endpoints.is_empty()
    }

    /// Restrict the policy to `host` (normalized). Empty set means all hosts.
    /// Returns `false` when `host` is blank and nothing was added.
    pub fn add_host(&mut self, host: &str) -> bool {
        let h = normalize_host(host);
        if h.is_empty() {
            return false;
        }
        self.hosts.insert(h);
        true
    }

    pub fn add_alias(&mut self, alias: impl Into<String>) {
        self.aliases.push(alias.into());
    }

    /// Register `pattern` for the methods listed in `methods` (CSV).
    ///
    /// An empty list, or any token equal to `all`, registers the pattern only
    /// under `Method::All`. Unknown tokens are dropped and reported back as
    /// warnings. If the pattern does not compile nothing is registered.
    pub fn configure_path(&mut self, pattern: &str, methods: &str) -> Result<Vec<CompileWarning>> {
        let rx = Regex::new(pattern).map_err(|source| PathwardenError::InvalidPattern {
            pattern: pattern.to_string(),
            client_id: self.client_id.clone(),
            source,
        })?;

        let mut warnings = Vec::new();
        let mut resolved: Vec<Method> = Vec::new();

        let tokens: Vec<&str> = methods.split(',').map(str::trim).collect();
        let wildcard = methods.trim().is_empty()
            || tokens.iter().any(|t| t.eq_ignore_ascii_case("all"));

        if wildcard {
            resolved.push(Method::All);
        } else {
            for token in tokens {
                let method = Method::parse(token);
                if !method.is_rule_key() {
                    tracing::warn!(
                        client_id = %self.client_id,
                        method = %token,
                        pattern = %pattern,
                        "unsupported http method ignored"
                    );
                    warnings.push(CompileWarning::UnknownMethod {
                        method: token.to_string(),
                        pattern: pattern.to_string(),
                    });
                    continue;
                }
                if !resolved.contains(&method) {
                    resolved.push(method);
                }
            }
        }

        for method in resolved {
            self.endpoints.entry(method).or_default().push(rx.clone());
        }
        Ok(warnings)
    }

    /// Decide whether `method path` on `host` is permitted.
    ///
    /// Host membership is compared after `normalize_host` on both sides: case
    /// is folded and a trailing `:port` is ignored, so `Poke.API:8443` matches
    /// a configured `poke.api`. Paths and methods get no such treatment.
    pub fn is_allowed(&self, host: &str, path: &str, method: Method) -> bool {
        if !self.hosts.is_empty() && !self.hosts.contains(&normalize_host(host)) {
            return false;
        }

        let allow = self.allow();

        if method.is_rule_key() && method != Method::All {
            if let Some(patterns) = self.endpoints.get(&method) {
                if patterns.iter().any(|p| p.is_match(path)) {
                    return allow;
                }
            }
        }

        match self.endpoints.get(&Method::All) {
            None => !allow,
            Some(patterns) => {
                if patterns.iter().any(|p| p.is_match(path)) {
                    allow
                } else {
                    !allow
                }
            }
        }
    }
}

/// Lower-case a host and strip any `:port` suffix (IPv6 literals keep brackets).
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let bare = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((h, port)) if !h.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => h,
            _ => host,
        }
    };
    bare.to_ascii_lowercase()
}
