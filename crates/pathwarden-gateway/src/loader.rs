//! Client directory loader.
//!
//! Walks a directory tree, compiles every `*.yaml` / `*.yml` file into a
//! policy and assembles a fresh `Registry`. A broken file is logged and
//! skipped; only a missing or non-directory root fails the load.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use pathwarden_core::error::{PathwardenError, Result};
use pathwarden_core::policy::compile_yaml;
use pathwarden_core::Registry;

/// Summary of one directory load.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub registry: Registry,
    /// Files that produced a registered policy.
    pub loaded: usize,
    /// Files that were skipped, with the reason.
    pub skipped: Vec<(String, String)>,
    /// Rule-level warnings across all loaded files.
    pub warnings: usize,
}

/// Build a registry from every client document under `dir`.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Registry> {
    load_dir_report(dir).map(|r| r.registry)
}

/// Same as [`load_dir`] but keeps per-file outcomes.
pub fn load_dir_report(dir: impl AsRef<Path>) -> Result<LoadReport> {
    let dir = dir.as_ref();
    let meta = fs::metadata(dir)
        .map_err(|e| PathwardenError::Io(format!("'{}': {e}", dir.display())))?;
    if !meta.is_dir() {
        return Err(PathwardenError::Io(format!("'{}' is not a directory", dir.display())));
    }

    let mut report = LoadReport::default();

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::error!(dir = %dir.display(), error = %e, "walk error while loading client files");
                continue;
            }
        };
        if !entry.file_type().is_file() || !is_yaml(entry.path()) {
            continue;
        }

        let path = entry.path().display().to_string();
        match load_file(entry.path()) {
            Ok(compiled) => {
                let client_id = compiled.policy.client_id().to_string();
                let aliases = compiled.policy.aliases().join(",");
                report.warnings += compiled.warnings.len();
                if let Err(e) = report.registry.add(compiled.policy) {
                    tracing::error!(file = %path, error = %e, "unable to register client policy");
                    report.skipped.push((path, e.to_string()));
                    continue;
                }
                tracing::info!(file = %path, client_id = %client_id, aliases = %aliases, "loaded client authorizations");
                report.loaded += 1;
            }
            Err(e) => {
                tracing::error!(file = %path, error = %e, class = e.class().as_str(), "unable to load client file");
                report.skipped.push((path, e.to_string()));
            }
        }
    }

    if report.registry.is_empty() {
        tracing::warn!(
            dir = %dir.display(),
            "no client configuration could be loaded, every request will be accepted"
        );
    }

    Ok(report)
}

fn load_file(path: &Path) -> Result<pathwarden_core::policy::CompiledPolicy> {
    let content = fs::read_to_string(path)?;
    compile_yaml(&content)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}
