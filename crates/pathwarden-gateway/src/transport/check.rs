//! HTTP check adapter (Envoy `ext_authz` HTTP service).
//!
//! Every request reaching the check listener is a check request: the proxy
//! forwards the original method, path and headers. The adapter extracts
//! (host, client id, path, method), asks the registry, and answers `200` or
//! `403` with the result header set.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response},
};

use pathwarden_core::error::Result;
use pathwarden_core::{Method, Verdict};

use crate::app_state::AppState;

/// Response header carrying the outcome for the proxy.
pub const RESULT_HEADER: &str = "x-ext-authz-check-result";
pub const RESULT_ALLOWED: &str = "allowed";
pub const RESULT_DENIED: &str = "denied";

/// Request attributes the decision is made on.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub host: String,
    pub client_id: Option<String>,
    pub path: String,
    pub method: Method,
}

impl CheckRequest {
    /// Extract attributes using the configured header names.
    pub fn from_parts(
        method: &HttpMethod,
        uri: &Uri,
        headers: &HeaderMap,
        client_header: &str,
        host_header: &str,
    ) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let host = header_str(host_header)
            .or_else(|| header_str(header::HOST.as_str()))
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or_default()
            .to_string();

        Self {
            host,
            client_id: header_str(client_header).map(str::to_string),
            path: uri.path().to_string(),
            method: Method::parse(method.as_str()),
        }
    }
}

pub async fn check(
    State(state): State<AppState>,
    method: HttpMethod,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let authz = &state.cfg().authz;
    let req = CheckRequest::from_parts(&method, &uri, &headers, &authz.client_header, &authz.host_header);

    let res = state.decide(&req.host, req.client_id.as_deref(), &req.path, req.method);
    log_decision("http", &req, &res);

    match res {
        Ok(_) => (StatusCode::OK, [(RESULT_HEADER, RESULT_ALLOWED)]).into_response(),
        Err(e) => (StatusCode::FORBIDDEN, [(RESULT_HEADER, RESULT_DENIED)], e.to_string()).into_response(),
    }
}

/// One structured line per decision, shared by the HTTP and gRPC adapters.
pub(crate) fn log_decision(protocol: &'static str, req: &CheckRequest, res: &Result<Verdict>) {
    let client_id = req.client_id.as_deref().unwrap_or_default();
    match res {
        Ok(verdict) => tracing::info!(
            protocol,
            allow = true,
            outcome = verdict.as_str(),
            host = %req.host,
            path = %req.path,
            method = %req.method,
            client_id = %client_id,
            "{} {} allowed for '{}'",
            req.method,
            req.path,
            client_id
        ),
        Err(e) => tracing::info!(
            protocol,
            allow = false,
            outcome = RESULT_DENIED,
            reason = %e,
            class = e.class().as_str(),
            host = %req.host,
            path = %req.path,
            method = %req.method,
            client_id = %client_id,
            "{} {} denied for '{}'",
            req.method,
            req.path,
            client_id
        ),
    }
}
