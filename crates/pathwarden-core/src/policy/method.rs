//! HTTP method vocabulary.
//!
//! A closed set of recognized methods plus two sentinels:
//! - `All`: wildcard bucket consulted when the specific method has no match.
//! - `Unknown`: produced by the parser for unrecognized tokens. Never used as a
//!   rule key.

use std::fmt;

/// Recognized HTTP method (or one of the `All` / `Unknown` sentinels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
    All,
    Unknown,
}

impl Method {
    /// Every concrete method (excludes `All` and `Unknown`).
    pub const CONCRETE: [Method; 9] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Connect,
        Method::Options,
        Method::Trace,
        Method::Patch,
    ];

    /// Normalize a free-text token. Unrecognized input yields `Unknown`.
    pub fn parse(token: &str) -> Method {
        match token.trim().to_ascii_uppercase().as_str() {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            "CONNECT" => Method::Connect,
            "OPTIONS" => Method::Options,
            "TRACE" => Method::Trace,
            "PATCH" => Method::Patch,
            "ALL" => Method::All,
            _ => Method::Unknown,
        }
    }

    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Connect => "CONNECT",
            Method::Options => "OPTIONS",
            Method::Trace => "TRACE",
            Method::Patch => "PATCH",
            Method::All => "ALL",
            Method::Unknown => "UNKNOWN",
        }
    }

    /// True if this method may key a rule bucket.
    pub fn is_rule_key(self) -> bool {
        self != Method::Unknown
    }
}

impl From<&str> for Method {
    fn from(token: &str) -> Self {
        Method::parse(token)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
