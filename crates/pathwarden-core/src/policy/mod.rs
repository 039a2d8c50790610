//! Per-client policy: method vocabulary, compiled rules, document compiler.
//!
//! Policies are compiled once from YAML documents into regex-backed lookup
//! tables and are read-only afterwards. All compile paths are panic-free:
//! malformed rules are dropped and reported as `CompileWarning`s instead of
//! failing the whole document.

pub mod compile;
pub mod method;
pub mod rules;

pub use compile::{compile_document, compile_yaml, ClientDocument, CompileWarning, CompiledPolicy, PathEntry};
pub use method::Method;
pub use rules::{normalize_host, Mode, Policy};
