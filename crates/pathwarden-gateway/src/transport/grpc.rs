//! gRPC check adapter (Envoy `ext_authz` v3 `Authorization/Check`).
//!
//! Envoy hands over the original request as `AttributeContext.request.http`.
//! The adapter reads the same (host, client id, path, method) tuple as the
//! HTTP adapter and answers with an `OkHttpResponse` or a 403
//! `DeniedHttpResponse`, both carrying the result header.

use envoy_types::pb::envoy::config::core::v3::{HeaderValue, HeaderValueOption};
use envoy_types::pb::envoy::r#type::v3::{HttpStatus, StatusCode as HttpStatusCode};
use envoy_types::pb::envoy::service::auth::v3::{
    attribute_context::HttpRequest, authorization_server::Authorization, check_response::HttpResponse,
    CheckRequest as AuthzCheckRequest, CheckResponse, DeniedHttpResponse, OkHttpResponse,
};
use envoy_types::pb::google::rpc;
use tonic::{Code, Request, Response, Status};

use pathwarden_core::Method;

pub use envoy_types::pb::envoy::service::auth::v3::authorization_server::AuthorizationServer;

use super::check::{log_decision, CheckRequest, RESULT_ALLOWED, RESULT_DENIED, RESULT_HEADER};
use crate::app_state::AppState;

#[derive(Clone)]
pub struct GrpcCheck {
    state: AppState,
}

impl GrpcCheck {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub fn into_server(self) -> AuthorizationServer<Self> {
        AuthorizationServer::new(self)
    }

    /// Decide one check request. `None` when Envoy sent no HTTP attributes.
    pub fn respond(&self, request: &AuthzCheckRequest) -> Option<CheckResponse> {
        let http = request
            .attributes
            .as_ref()
            .and_then(|a| a.request.as_ref())
            .and_then(|r| r.http.as_ref())?;

        let authz = &self.state.cfg().authz;
        let req = attributes(http, &authz.client_header, &authz.host_header);
        let res = self.state.decide(&req.host, req.client_id.as_deref(), &req.path, req.method);
        log_decision("grpc", &req, &res);

        Some(match res {
            Ok(_) => allowed(),
            Err(e) => denied(e.to_string()),
        })
    }
}

#[tonic::async_trait]
impl Authorization for GrpcCheck {
    async fn check(&self, request: Request<AuthzCheckRequest>) -> Result<Response<CheckResponse>, Status> {
        self.respond(request.get_ref())
            .map(Response::new)
            .ok_or_else(|| Status::invalid_argument("check request carries no http attributes"))
    }
}

/// Map Envoy's HTTP attributes onto the shared check tuple.
///
/// Envoy lower-cases header keys and puts the query string in `path`.
pub fn attributes(http: &HttpRequest, client_header: &str, host_header: &str) -> CheckRequest {
    let header_str = |name: &str| {
        http.headers
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let host = header_str(host_header)
        .or_else(|| Some(http.host.trim()).filter(|h| !h.is_empty()))
        .unwrap_or_default()
        .to_string();
    let path = http.path.split(['?', '#']).next().unwrap_or_default().to_string();

    CheckRequest {
        host,
        client_id: header_str(client_header).map(str::to_string),
        path,
        method: Method::from(http.method.as_str()),
    }
}

fn result_header(value: &str) -> HeaderValueOption {
    HeaderValueOption {
        header: Some(HeaderValue {
            key: RESULT_HEADER.to_string(),
            value: value.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn allowed() -> CheckResponse {
    CheckResponse {
        status: Some(rpc::Status {
            code: Code::Ok as i32,
            ..Default::default()
        }),
        http_response: Some(HttpResponse::OkResponse(OkHttpResponse {
            headers: vec![result_header(RESULT_ALLOWED)],
            ..Default::default()
        })),
        ..Default::default()
    }
}

fn denied(reason: String) -> CheckResponse {
    CheckResponse {
        status: Some(rpc::Status {
            code: Code::PermissionDenied as i32,
            message: reason.clone(),
            ..Default::default()
        }),
        http_response: Some(HttpResponse::DeniedResponse(DeniedHttpResponse {
            status: Some(HttpStatus {
                code: HttpStatusCode::Forbidden as i32,
            }),
            headers: vec![result_header(RESULT_DENIED)],
            body: reason,
            ..Default::default()
        })),
        ..Default::default()
    }
}
