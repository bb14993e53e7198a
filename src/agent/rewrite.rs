//! Rewriting an inbound request into the request the agent receives.
//!
//! A pure value transform: no IO, no shared state. The agent sees the
//! caller's method, path, query and body unchanged; only the scheme and
//! authority are pinned to `http://unix` and transport headers are replaced.

use std::net::IpAddr;

use axum::http::{
    header, request::Parts, uri::PathAndQuery, HeaderMap, HeaderValue, Method, Request, Uri,
    Version,
};

use crate::error::GatewayError;
use crate::security::headers::{self, X_FORWARDED_HOST, X_FORWARDED_PROTO};

/// Authority used for every agent-bound URI. The connector ignores it.
pub const AGENT_AUTHORITY: &str = "unix";

/// Outgoing request descriptor, built before any connection is touched.
#[derive(Debug, Clone)]
pub struct AgentRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

impl AgentRequest {
    /// Build the agent request for `inbound`. `client` is appended to
    /// `X-Forwarded-For` when known.
    pub fn rewrite(inbound: &Parts, client: Option<IpAddr>) -> Result<Self, GatewayError> {
        let path_and_query = inbound
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        let uri = Uri::builder()
            .scheme("http")
            .authority(AGENT_AUTHORITY)
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;

        let mut outgoing = inbound.headers.clone();
        let upgrade = upgrade_protocol(&inbound.headers);
        headers::strip_hop_by_hop(&mut outgoing);

        if let Some(protocol) = upgrade {
            outgoing.insert(header::CONNECTION, HeaderValue::from_static("upgrade"));
            outgoing.insert(header::UPGRADE, protocol);
        }

        // HTTP/2 callers carry the host in the URI instead of a header.
        let host = inbound
            .headers
            .get(header::HOST)
            .cloned()
            .or_else(|| {
                inbound
                    .uri
                    .authority()
                    .and_then(|a| HeaderValue::from_str(a.as_str()).ok())
            });
        if let Some(host) = host {
            if !outgoing.contains_key(header::HOST) {
                outgoing.insert(header::HOST, host.clone());
            }
            outgoing.insert(X_FORWARDED_HOST.clone(), host);
        }

        if let Some(client) = client {
            headers::append_forwarded_for(&mut outgoing, client);
        }

        Ok(Self {
            method: inbound.method.clone(),
            uri,
            headers: outgoing,
        })
    }

    /// Record the scheme the caller used to reach the gateway.
    pub fn forwarded_proto(mut self, scheme: &'static str) -> Self {
        self.headers
            .insert(X_FORWARDED_PROTO.clone(), HeaderValue::from_static(scheme));
        self
    }

    pub fn is_upgrade(&self) -> bool {
        self.headers.contains_key(header::UPGRADE)
    }

    /// Attach a body. The agent connection is always HTTP/1.1.
    pub fn into_request<B>(self, body: B) -> Request<B> {
        let mut request = Request::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = Version::HTTP_11;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Protocol named in `Upgrade` when `Connection` asks for an upgrade.
pub fn upgrade_protocol(headers: &HeaderMap) -> Option<HeaderValue> {
    let wants_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));
    if !wants_upgrade {
        return None;
    }
    headers.get(header::UPGRADE).cloned()
}
