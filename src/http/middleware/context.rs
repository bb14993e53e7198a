//! Per-request state threaded through an interceptor chain.

use std::net::IpAddr;

use axum::{
    body::Body,
    http::{request::Parts, HeaderMap, Method, Request, Uri},
    response::Response,
};
use tokio::sync::OwnedSemaphorePermit;

use crate::security::headers;

/// Authenticated principal, set by an auth interceptor when one is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity(pub String);

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

struct Aborted {
    by: &'static str,
    response: Option<Response>,
}

/// Mutable view of one request while its interceptors run.
///
/// Attributes live in the request extensions, so whatever an interceptor
/// stores here is visible to the handler once the request continues.
/// The context outlives the handler call: guard permits held here are
/// released only after the inner service has produced its response.
pub struct RequestContext {
    method: Method,
    uri: Uri,
    parts: Parts,
    identity: Option<Identity>,
    held: Vec<OwnedSemaphorePermit>,
    aborted: Option<Aborted>,
}

impl RequestContext {
    pub fn new(parts: Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            parts,
            identity: None,
            held: Vec::new(),
            aborted: None,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Client address, optionally taken from trusted forwarding headers.
    pub fn client_ip(&self, trust_forwarded: bool) -> Option<IpAddr> {
        headers::client_ip(&self.parts, trust_forwarded)
    }

    /// Store an attribute for later interceptors and the handler.
    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.parts.extensions.insert(value);
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.parts.extensions.get::<T>()
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.parts.extensions.insert(identity.clone());
        self.identity = Some(identity);
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity
            .as_ref()
            .or_else(|| self.parts.extensions.get::<Identity>())
    }

    /// Keep a guard permit alive until the response is produced.
    pub fn hold(&mut self, permit: OwnedSemaphorePermit) {
        self.held.push(permit);
    }

    /// Record an abort. Only the first abort is kept; returns whether this
    /// call was the one that took effect.
    pub fn abort(&mut self, by: &'static str, response: Response) -> bool {
        if self.aborted.is_some() {
            tracing::warn!(
                interceptor = by,
                path = %self.uri.path(),
                "Ignoring second abort on an already aborted request"
            );
            return false;
        }
        self.aborted = Some(Aborted {
            by,
            response: Some(response),
        });
        true
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.is_some()
    }

    pub fn aborted_by(&self) -> Option<&'static str> {
        self.aborted.as_ref().map(|a| a.by)
    }

    /// Hand out the abort response. The aborted state itself is sticky.
    pub(crate) fn take_abort_response(&mut self) -> Option<Response> {
        self.aborted.as_mut().and_then(|a| a.response.take())
    }

    /// Rebuild the request for the inner service.
    pub(crate) fn take_request(&mut self, body: Body) -> Request<Body> {
        let (empty, _) = Request::new(()).into_parts();
        let parts = std::mem::replace(&mut self.parts, empty);
        Request::from_parts(parts, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    fn ctx() -> RequestContext {
        let (parts, _) = Request::post("/api/v1/files?page=2")
            .body(())
            .unwrap()
            .into_parts();
        RequestContext::new(parts)
    }

    #[test]
    fn first_abort_wins() {
        let mut ctx = ctx();
        assert!(ctx.abort("first", StatusCode::FORBIDDEN.into_response()));
        assert!(!ctx.abort("second", StatusCode::IM_A_TEAPOT.into_response()));

        assert_eq!(ctx.aborted_by(), Some("first"));
        let response = ctx.take_abort_response().unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(ctx.take_abort_response().is_none());
        assert!(ctx.is_aborted());
    }

    #[test]
    fn attributes_reach_the_rebuilt_request() {
        let mut ctx = ctx();
        ctx.insert(42u32);
        ctx.set_identity(Identity("admin".into()));

        let request = ctx.take_request(Body::empty());
        assert_eq!(request.extensions().get::<u32>(), Some(&42));
        assert_eq!(
            request.extensions().get::<Identity>(),
            Some(&Identity("admin".into()))
        );
        assert_eq!(request.uri().query(), Some("page=2"));
        // Metadata stays readable for completion hooks.
        assert_eq!(ctx.path(), "/api/v1/files");
        assert_eq!(ctx.identity(), Some(&Identity("admin".into())));
    }
}
