//! Reverse-proxy bridge to the agent.
//!
//! # Responsibilities
//! - Decide whether an unmatched path belongs to the agent
//! - Rewrite and send the request over the pooled socket client
//! - Stream the agent's response back without buffering
//! - Map connection failures and timeouts to gateway statuses

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::Request,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use hyper::body::Incoming;
use hyper_util::{client::legacy::Client, rt::TokioExecutor};

use crate::agent::connector::UnixConnector;
use crate::agent::rewrite::{upgrade_protocol, AgentRequest};
use crate::agent::target::AgentTarget;
use crate::agent::upgrade;
use crate::config::AgentConfig;
use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::RouteKind;
use crate::security::headers;

pub struct AgentBridge {
    client: Client<UnixConnector, Body>,
    prefix: PathPrefixMatcher,
    response_timeout: Duration,
    scheme: &'static str,
    target: AgentTarget,
}

impl AgentBridge {
    /// `scheme` is what callers use to reach the gateway (`http` or `https`).
    pub fn new(target: AgentTarget, config: &AgentConfig, scheme: &'static str) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .build(UnixConnector::new(target.socket_path()));

        Self {
            client,
            prefix: PathPrefixMatcher::new(config.forward_prefix.clone()),
            response_timeout: Duration::from_secs(config.response_timeout_secs),
            scheme,
            target,
        }
    }

    /// Whether an otherwise unmatched path is forwarded to the agent.
    pub fn claims(&self, path: &str) -> bool {
        self.prefix.matches(path)
    }

    /// Forward `request` and relay whatever the agent answers. Always yields a
    /// response; agent failures become 502/504. Dropping the returned future or
    /// body (client went away) drops the agent connection with it.
    pub async fn forward(&self, mut request: Request) -> Response {
        let started = Instant::now();
        let client_upgrade = if upgrade_protocol(request.headers()).is_some() {
            Some(hyper::upgrade::on(&mut request))
        } else {
            None
        };

        let (parts, body) = request.into_parts();
        let path = parts.uri.path().to_string();
        let client_ip = headers::peer_addr(&parts).map(|addr| addr.ip());

        let outgoing = match AgentRequest::rewrite(&parts, client_ip) {
            Ok(outgoing) => outgoing.forwarded_proto(self.scheme),
            Err(e) => return tag(e.into_response()),
        };

        tracing::debug!(
            method = %outgoing.method,
            path = %path,
            upgrade = outgoing.is_upgrade(),
            "Forwarding to agent"
        );

        let mut response = match self.send(outgoing, body).await {
            Ok(response) => response,
            Err(e) => return tag(e.into_response()),
        };

        tracing::debug!(
            path = %path,
            status = %response.status(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Agent responded"
        );

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            match client_upgrade {
                Some(client_upgrade) => {
                    let agent_upgrade = hyper::upgrade::on(&mut response);
                    upgrade::splice(client_upgrade, agent_upgrade, path);
                }
                None => {
                    tracing::warn!(path = %path, "Agent switched protocols without an upgrade request");
                    return tag(
                        GatewayError::AgentUnavailable("unexpected protocol switch".into())
                            .into_response(),
                    );
                }
            }
            let (parts, body) = response.into_parts();
            return tag(Response::from_parts(parts, Body::new(body)));
        }

        let (mut parts, body) = response.into_parts();
        headers::strip_hop_by_hop(&mut parts.headers);
        tag(Response::from_parts(parts, Body::new(body)))
    }

    /// Send a rewritten request over the pool and wait for the response head.
    /// Failures are logged with their cause and returned without it.
    pub async fn send(
        &self,
        outgoing: AgentRequest,
        body: Body,
    ) -> Result<hyper::Response<Incoming>, GatewayError> {
        let path = outgoing.uri.path().to_string();
        let sent = tokio::time::timeout(
            self.response_timeout,
            self.client.request(outgoing.into_request(body)),
        )
        .await;

        match sent {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                let kind = if e.is_connect() { "connect" } else { "exchange" };
                tracing::error!(
                    path = %path,
                    socket = %self.target.socket_path().display(),
                    error = %e,
                    kind,
                    "Agent request failed"
                );
                metrics::record_agent_error(kind);
                Err(GatewayError::AgentUnavailable(e.to_string()))
            }
            Err(_) => {
                tracing::error!(
                    path = %path,
                    timeout = ?self.response_timeout,
                    "Agent did not respond in time"
                );
                metrics::record_agent_error("timeout");
                Err(GatewayError::AgentTimeout(self.response_timeout))
            }
        }
    }
}

fn tag(mut response: Response) -> Response {
    response.extensions_mut().insert(RouteKind::Agent);
    response
}
