use std::net::SocketAddr;

use serde::Deserialize;
use pathwarden_core::error::{PathwardenError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub authz: AuthzSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PathwardenError::Config(format!(
                "unsupported config version {} (expected 1)",
                self.version
            )));
        }

        self.gateway.validate()?;
        self.authz.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    /// HTTP check listener (proxy -> pathwarden).
    #[serde(default = "default_listen")]
    pub listen: String,

    /// gRPC `ext_authz` v3 check listener.
    #[serde(default = "default_grpc_listen")]
    pub grpc_listen: String,

    /// Health, readiness and metrics listener.
    #[serde(default = "default_ops_listen")]
    pub ops_listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            grpc_listen: default_grpc_listen(),
            ops_listen: default_ops_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        let listen = self.listen_addr()?;
        let grpc = self.grpc_listen_addr()?;
        let ops = self.ops_listen_addr()?;
        if listen == ops || grpc == ops || listen == grpc {
            return Err(PathwardenError::Config(
                "gateway.listen, gateway.grpc_listen and gateway.ops_listen must differ".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        parse_addr("gateway.listen", &self.listen)
    }

    pub fn grpc_listen_addr(&self) -> Result<SocketAddr> {
        parse_addr("gateway.grpc_listen", &self.grpc_listen)
    }

    pub fn ops_listen_addr(&self) -> Result<SocketAddr> {
        parse_addr("gateway.ops_listen", &self.ops_listen)
    }
}

fn parse_addr(field: &str, raw: &str) -> Result<SocketAddr> {
    raw.parse()
        .map_err(|e| PathwardenError::Config(format!("{field} must be a valid SocketAddr ({raw}): {e}")))
}

fn default_listen() -> String {
    "0.0.0.0:8000".into()
}
fn default_grpc_listen() -> String {
    "0.0.0.0:9000".into()
}
fn default_ops_listen() -> String {
    "0.0.0.0:9090".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthzSection {
    /// Directory holding one YAML document per client.
    #[serde(default = "default_clients_dir")]
    pub clients_dir: String,

    /// Header carrying the already-authenticated client identifier.
    #[serde(default = "default_client_header")]
    pub client_header: String,

    /// Header carrying the originally requested host; falls back to `host`.
    #[serde(default = "default_host_header")]
    pub host_header: String,
}

impl Default for AuthzSection {
    fn default() -> Self {
        Self {
            clients_dir: default_clients_dir(),
            client_header: default_client_header(),
            host_header: default_host_header(),
        }
    }
}

impl AuthzSection {
    pub fn validate(&self) -> Result<()> {
        if self.clients_dir.trim().is_empty() {
            return Err(PathwardenError::Config("authz.clients_dir must not be empty".into()));
        }
        validate_header_name("authz.client_header", &self.client_header)?;
        validate_header_name("authz.host_header", &self.host_header)?;
        Ok(())
    }
}

// lower-case RFC 7230 token
fn validate_header_name(field: &str, name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b"!#$%&'*+-.^_`|~".contains(&b));
    if !ok {
        return Err(PathwardenError::Config(format!(
            "{field} must be a non-empty lower-case header name (got '{name}')"
        )));
    }
    Ok(())
}

fn default_clients_dir() -> String {
    "/var/run/pathwarden/clients".into()
}
fn default_client_header() -> String {
    "x-forwarded-sub".into()
}
fn default_host_header() -> String {
    "x-forwarded-host".into()
}
