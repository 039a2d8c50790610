//! Client document schema and the document -> `Policy` compiler.
//!
//! Document-level faults (missing `clientID`, bad `mode`, broken YAML) reject
//! the whole document. Rule-level faults (bad regex, unknown method, odd path
//! entry shape) drop only that rule and are returned as `CompileWarning`s
//! alongside the compiled policy.

use std::fmt;

use serde::Deserialize;

use super::rules::{Mode, Policy};
use crate::error::{PathwardenError, Result};

/// Raw client document as found on disk.
///
/// `clientID` and `mode` are kept as raw values so that type errors surface
/// as `MissingClientId` / `InvalidMode` rather than as YAML errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientDocument {
    #[serde(rename = "clientID", default)]
    pub client_id: Option<serde_yaml::Value>,
    #[serde(default)]
    pub mode: Option<serde_yaml::Value>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub hosts: Option<Vec<String>>,
    #[serde(default)]
    pub paths: Option<Vec<PathEntry>>,
}

/// One entry of the `paths` list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PathEntry {
    /// Bare pattern, all methods.
    Pattern(String),
    /// Nested list; unsupported. Listed ahead of `Rule` so a sequence is
    /// never read positionally into `PathRule`.
    Sequence(serde_yaml::Sequence),
    /// `{ path, methods }` map.
    Rule(PathRule),
    /// Anything else; skipped with a warning.
    Other(serde_yaml::Value),
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathRule {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub methods: Option<String>,
}

/// Non-fatal issue found while compiling a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileWarning {
    /// Pattern failed to compile; the entry was skipped.
    InvalidPattern { pattern: String, reason: String },
    /// Method token not recognized; dropped for that pattern.
    UnknownMethod { method: String, pattern: String },
    /// Map entry without a `path` key.
    MissingPath { index: usize },
    /// Entry that is neither a string nor a `{ path, methods }` map.
    UnsupportedEntry { index: usize },
    /// Blank alias, or alias equal to the client id.
    IgnoredAlias { alias: String },
    /// Blank host entry.
    IgnoredHost { host: String },
    /// No endpoint survived; the policy answers `!allow` for every request.
    NoEndpoints { mode: Mode },
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompileWarning::InvalidPattern { pattern, reason } => {
                write!(f, "path '{pattern}' ignored: {reason}")
            }
            CompileWarning::UnknownMethod { method, pattern } => {
                write!(f, "http method '{method}' ignored for path '{pattern}'")
            }
            CompileWarning::MissingPath { index } => {
                write!(f, "paths[{index}] has no 'path' key and was skipped")
            }
            CompileWarning::UnsupportedEntry { index } => {
                write!(f, "paths[{index}] has an unsupported shape and was skipped")
            }
            CompileWarning::IgnoredAlias { alias } => write!(f, "alias '{alias}' ignored"),
            CompileWarning::IgnoredHost { host } => write!(f, "host '{host}' ignored"),
            CompileWarning::NoEndpoints { mode } => {
                let outcome = match mode {
                    Mode::Allow => "refused",
                    Mode::Deny => "allowed",
                };
                write!(f, "no paths defined, requests will always be {outcome} in mode '{}'", mode.as_str())
            }
        }
    }
}

/// Compiled policy plus the rule-level warnings produced along the way.
#[derive(Debug, Clone)]
pub struct CompiledPolicy {
    pub policy: Policy,
    pub warnings: Vec<CompileWarning>,
}

/// Parse and compile one YAML client document.
pub fn compile_yaml(text: &str) -> Result<CompiledPolicy> {
    let doc: ClientDocument = serde_yaml::from_str(text)
        .map_err(|e| PathwardenError::InvalidDocument(e.to_string()))?;
    compile_document(&doc)
}

/// Compile an already-parsed client document.
pub fn compile_document(doc: &ClientDocument) -> Result<CompiledPolicy> {
    let client_id = match doc.client_id.as_ref().and_then(serde_yaml::Value::as_str) {
        Some(id) if !id.trim().is_empty() => id.trim().to_string(),
        _ => return Err(PathwardenError::MissingClientId),
    };

    let mode = doc
        .mode
        .as_ref()
        .and_then(serde_yaml::Value::as_str)
        .and_then(Mode::parse)
        .ok_or(PathwardenError::InvalidMode)?;

    let mut policy = Policy::new(client_id, mode);
    let mut warnings = Vec::new();

    for alias in doc.aliases.iter().flatten() {
        let alias = alias.trim();
        if alias.is_empty() || alias == policy.client_id() {
            warnings.push(CompileWarning::IgnoredAlias { alias: alias.to_string() });
            continue;
        }
        policy.add_alias(alias);
    }

    for host in doc.hosts.iter().flatten() {
        if !policy.add_host(host) {
            tracing::warn!(client_id = %policy.client_id(), host = %host, "blank host entry ignored");
            warnings.push(CompileWarning::IgnoredHost { host: host.clone() });
        }
    }

    for (index, entry) in doc.paths.iter().flatten().enumerate() {
        let (pattern, methods) = match entry {
            PathEntry::Pattern(p) => (p.as_str(), ""),
            PathEntry::Rule(PathRule { path: Some(p), methods }) => {
                (p.as_str(), methods.as_deref().unwrap_or(""))
            }
            PathEntry::Rule(PathRule { path: None, .. }) => {
                warnings.push(CompileWarning::MissingPath { index });
                continue;
            }
            PathEntry::Sequence(_) | PathEntry::Other(_) => {
                tracing::error!(client_id = %policy.client_id(), index, entry = ?entry, "unsupported path construct");
                warnings.push(CompileWarning::UnsupportedEntry { index });
                continue;
            }
        };

        match policy.configure_path(pattern, methods) {
            Ok(w) => warnings.extend(w),
            Err(e) => {
                tracing::warn!(error = %e, "incompatible path detected");
                warnings.push(CompileWarning::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if !policy.has_endpoints() {
        let w = CompileWarning::NoEndpoints { mode };
        tracing::warn!(client_id = %policy.client_id(), "{w}");
        warnings.push(w);
    }

    Ok(CompiledPolicy { policy, warnings })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::policy::Method;

    const SCENARIO_PATHS: &str = r#"
paths:
  - path: /api/pokemon/.*?
    methods: get
  - path: /api/encounter
    methods: put
  - /api/pokemon/pikachu
"#;

    fn scenario(mode: &str) -> Policy {
        let doc = format!("clientID: client\nmode: {mode}\n{SCENARIO_PATHS}");
        compile_yaml(&doc).unwrap().policy
    }

    #[test]
    fn scenario_allow_mode() {
        let p = scenario("allow");
        assert!(p.is_allowed("h", "/api/pokemon/ditto", Method::Get));
        assert!(!p.is_allowed("h", "/api/encounter", Method::Get));
        assert!(p.is_allowed("h", "/api/encounter", Method::Put));
        assert!(p.is_allowed("h", "/api/pokemon/pikachu", Method::Put));
    }

    #[test]
    fn scenario_deny_mode() {
        let yml = r#"
clientID: client
mode: deny
paths:
  - path: /api/encounter
    methods: put
  - path: /api/pokemon/pikachu
"#;
        let p = compile_yaml(yml).unwrap().policy;
        assert!(p.is_allowed("h", "/api/pokemon/ditto", Method::Get));
        assert!(!p.is_allowed("h", "/api/encounter", Method::Put));
        assert!(p.is_allowed("h", "/api/encounter", Method::Get));
        assert!(!p.is_allowed("h", "/api/pokemon/pikachu", Method::Put));
    }

    #[test]
    fn deny_mode_forbids_listed_get_rule() {
        let p = scenario("deny");
        assert!(!p.is_allowed("h", "/api/pokemon/ditto", Method::Get));
        assert!(p.is_allowed("h", "/api/pokemon/ditto", Method::Put));
        assert!(!p.is_allowed("h", "/api/pokemon/pikachu", Method::Put));
    }

    #[test]
    fn load_from_valid_yaml() {
        let yml = r#"
clientID: client
mode: allow
aliases: [client-a, client-b]
hosts: [localhost]
paths:
  - /pokemon/pikachu
  - path: /pokemon
    methods: GET, POST
  - path: /pokemon/tortank
    methods: POST
  - /pokemon/ditto
  - path: /encounters
"#;
        let out = compile_yaml(yml).unwrap();
        let p = &out.policy;
        assert_eq!(p.client_id(), "client");
        assert!(p.allow());
        assert_eq!(p.aliases(), ["client-a", "client-b"]);
        assert!(p.hosts().contains("localhost"));
        assert_eq!(p.patterns(Method::All).unwrap().len(), 3);
        assert_eq!(p.patterns(Method::Get).unwrap().len(), 1);
        assert_eq!(p.patterns(Method::Post).unwrap().len(), 2);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn mode_is_case_insensitive() {
        let out = compile_yaml("clientID: c\nmode: DeNy\n").unwrap();
        assert_eq!(out.policy.mode(), Mode::Deny);
        let err = compile_yaml("clientID: c\nmode: ' allow'\n").unwrap_err();
        assert!(matches!(err, PathwardenError::InvalidMode));
    }

    #[test]
    fn missing_client_id_is_fatal() {
        let err = compile_yaml("mode: allow\n").unwrap_err();
        assert!(matches!(err, PathwardenError::MissingClientId));

        let err = compile_yaml("clientID: 42\nmode: allow\n").unwrap_err();
        assert!(matches!(err, PathwardenError::MissingClientId));

        let err = compile_yaml("clientID: ''\nmode: allow\n").unwrap_err();
        assert!(matches!(err, PathwardenError::MissingClientId));
    }

    #[test]
    fn invalid_mode_is_fatal() {
        for doc in ["clientID: c\n", "clientID: c\nmode: reject\n", "clientID: c\nmode: [allow]\n"] {
            let err = compile_yaml(doc).unwrap_err();
            assert!(matches!(err, PathwardenError::InvalidMode), "{doc}");
        }
    }

    #[test]
    fn broken_yaml_is_fatal() {
        let err = compile_yaml("clientID: [unterminated\n").unwrap_err();
        assert!(matches!(err, PathwardenError::InvalidDocument(_)));
    }

    #[test]
    fn malformed_entries_are_skipped_not_fatal() {
        let yml = r#"
clientID: client
mode: allow
paths:
  - "[ab"
  - methods: get
  - 42
  - path: /ok
    methods: get, bogus
"#;
        let out = compile_yaml(yml).unwrap();
        assert_eq!(out.policy.patterns(Method::Get).unwrap().len(), 1);
        assert_eq!(out.warnings.len(), 4);
        assert!(matches!(out.warnings[0], CompileWarning::InvalidPattern { .. }));
        assert_eq!(out.warnings[1], CompileWarning::MissingPath { index: 1 });
        assert_eq!(out.warnings[2], CompileWarning::UnsupportedEntry { index: 2 });
        assert!(matches!(out.warnings[3], CompileWarning::UnknownMethod { .. }));
    }

    #[test]
    fn zero_endpoints_is_accepted_with_warning() {
        let out = compile_yaml("clientID: c\nmode: allow\npaths: []\n").unwrap();
        assert!(!out.policy.has_endpoints());
        assert_eq!(out.warnings, vec![CompileWarning::NoEndpoints { mode: Mode::Allow }]);
        assert!(out.warnings[0].to_string().contains("refused"));
    }

    #[test]
    fn self_alias_is_ignored() {
        let out = compile_yaml("clientID: c\nmode: deny\naliases: [c, '', d]\n").unwrap();
        assert_eq!(out.policy.aliases(), ["d"]);
        assert_eq!(
            out.warnings
                .iter()
                .filter(|w| matches!(w, CompileWarning::IgnoredAlias { .. }))
                .count(),
            2
        );
    }

    #[test]
    fn blank_hosts_are_reported() {
        let out = compile_yaml("clientID: c\nmode: allow\nhosts: [\"  \"]\npaths: [/x]\n").unwrap();
        assert!(out.policy.hosts().is_empty());
        assert_eq!(out.warnings, vec![CompileWarning::IgnoredHost { host: "  ".to_string() }]);

        let out = compile_yaml("clientID: c\nmode: allow\nhosts: ['', poke.api]\npaths: [/x]\n").unwrap();
        assert_eq!(out.warnings.len(), 1);
        assert!(!out.policy.is_allowed("evil.com", "/x", Method::Get));
        assert!(out.policy.is_allowed("poke.api", "/x", Method::Get));
    }

    #[test]
    fn compiling_twice_is_idempotent() {
        let a = scenario("allow");
        let b = scenario("allow");
        let paths = ["/api/pokemon/ditto", "/api/encounter", "/api/pokemon/pikachu", "/x"];
        for path in paths {
            for m in Method::CONCRETE {
                assert_eq!(a.is_allowed("h", path, m), b.is_allowed("h", path, m));
            }
        }
    }
}
