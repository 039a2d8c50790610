//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use pathwarden_core::error::{PathwardenError, Result};

pub use schema::{AuthzSection, GatewayConfig, GatewaySection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "PATHWARDEN_CONFIG";
/// Config file used when `PATHWARDEN_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "pathwarden.yaml";

pub fn config_path() -> String {
    std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| PathwardenError::Io(format!("read config '{path}' failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| PathwardenError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
