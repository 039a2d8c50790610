//! Shared error type across pathwarden crates.

use thiserror::Error;

use crate::policy::Method;

/// Stable error classes surfaced to operators (logs, metrics labels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// A whole client document (or the gateway config) is unusable.
    ConfigFatal,
    /// A single rule was dropped; the rest of the document stays effective.
    ConfigDegraded,
    /// Decision-time deny carrying a reason.
    Denied,
    /// Internal server error.
    Internal,
}

impl ErrorClass {
    /// String representation used in logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorClass::ConfigFatal => "CONFIG_FATAL",
            ErrorClass::ConfigDegraded => "CONFIG_DEGRADED",
            ErrorClass::Denied => "DENIED",
            ErrorClass::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PathwardenError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PathwardenError {
    #[error("clientID cannot be empty")]
    MissingClientId,
    #[error("mode is mandatory and should either be 'allow' or 'deny'")]
    InvalidMode,
    #[error("invalid yaml: {0}")]
    InvalidDocument(String),
    #[error("path '{pattern}' is not a valid regex and will be ignored for clientID '{client_id}': {source}")]
    InvalidPattern {
        pattern: String,
        client_id: String,
        #[source]
        source: regex::Error,
    },
    #[error("no authz configuration defined for {0}")]
    UnknownClient(String),
    #[error("{client_id} is not authorized to access {method} {path}")]
    NotAuthorized {
        client_id: String,
        method: Method,
        path: String,
    },
    #[error("missing client identity header '{0}'")]
    MissingClientHeader(String),
    #[error("config: {0}")]
    Config(String),
    #[error("io: {0}")]
    Io(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PathwardenError {
    /// Map an error onto its operator-facing class.
    pub fn class(&self) -> ErrorClass {
        match self {
            PathwardenError::MissingClientId
            | PathwardenError::InvalidMode
            | PathwardenError::InvalidDocument(_)
            | PathwardenError::Config(_)
            | PathwardenError::Io(_) => ErrorClass::ConfigFatal,
            PathwardenError::InvalidPattern { .. } => ErrorClass::ConfigDegraded,
            PathwardenError::UnknownClient(_)
            | PathwardenError::NotAuthorized { .. }
            | PathwardenError::MissingClientHeader(_) => ErrorClass::Denied,
            PathwardenError::Internal(_) => ErrorClass::Internal,
        }
    }

    /// True for decision-time denials (as opposed to configuration faults).
    pub fn is_denial(&self) -> bool {
        self.class() == ErrorClass::Denied
    }
}

impl From<std::io::Error> for PathwardenError {
    fn from(e: std::io::Error) -> Self {
        PathwardenError::Io(e.to_string())
    }
}
