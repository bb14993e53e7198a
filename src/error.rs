//! Error types for the gateway.
//!
//! Two families: [`GatewayError`] is per-request and always becomes a response,
//! [`StartupError`] is fatal and stops the process before the listener binds.

use std::path::PathBuf;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::config::loader::ConfigError;

/// Per-request failures. Each variant maps to a distinct status and code.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Mutating request rejected because the deployment runs in demo mode.
    #[error("operation not permitted in demo mode: {method} {path}")]
    DemoMode { method: String, path: String },

    /// Client address is not covered by the configured allow list.
    #[error("client address {0} is not allowed")]
    IpNotAllowed(String),

    /// Host header does not match the bound domain.
    #[error("host {0} does not match the bound domain")]
    DomainNotBound(String),

    /// The loading guard refused the request (busy flag or no free slot).
    #[error("gateway is busy: {0}")]
    GlobalLoading(&'static str),

    /// The agent socket could not be reached or the exchange failed.
    #[error("agent request failed: {0}")]
    AgentUnavailable(String),

    /// The agent did not answer within the configured window.
    #[error("agent did not respond within {0:?}")]
    AgentTimeout(Duration),

    /// The inbound request could not be turned into an agent request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::DemoMode { .. } => StatusCode::FORBIDDEN,
            GatewayError::IpNotAllowed(_) => StatusCode::FORBIDDEN,
            GatewayError::DomainNotBound(_) => StatusCode::MISDIRECTED_REQUEST,
            GatewayError::GlobalLoading(_) => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::AgentUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::AgentTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable machine-readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::DemoMode { .. } => "demo_mode",
            GatewayError::IpNotAllowed(_) => "ip_not_allowed",
            GatewayError::DomainNotBound(_) => "domain_not_bound",
            GatewayError::GlobalLoading(_) => "global_loading",
            GatewayError::AgentUnavailable(_) => "agent_unavailable",
            GatewayError::AgentTimeout(_) => "agent_timeout",
            GatewayError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// Message shown to the caller. Upstream causes stay in the logs.
    fn public_message(&self) -> String {
        match self {
            GatewayError::AgentUnavailable(_) => "agent is unavailable".to_string(),
            GatewayError::AgentTimeout(_) => "agent did not respond in time".to_string(),
            other => other.to_string(),
        }
    }
}

/// JSON body of every gateway-generated error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.public_message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Conditions that prevent the gateway from starting at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("agent socket {path:?} is not available: {source}")]
    AgentSocketMissing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("agent socket path {0:?} exists but is not a unix socket")]
    AgentSocketNotSocket(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid allow list entry: {0}")]
    AllowList(String),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(std::io::Error),

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
