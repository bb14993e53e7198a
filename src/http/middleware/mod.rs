//! Interceptor pipeline.
//!
//! Interceptors run strictly in registration order against a shared
//! [`RequestContext`]. Any of them may abort with a response, after which no
//! later interceptor and no handler runs. Completion hooks run in reverse
//! order for every interceptor that was invoked, aborted or not.
//!
//! # Chains
//! ```text
//! global:  audit → demo (demo deployments only) → locale
//! private: whitelist → domain → loading → [extra private interceptors]
//! ```

pub mod audit;
pub mod context;
pub mod demo;
pub mod domain;
pub mod loading;
pub mod locale;
pub mod whitelist;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::GatewayError;
use crate::observability::metrics;
use crate::routing::RouteKind;

pub use context::{Identity, RequestContext};

/// Decision returned by an interceptor.
pub enum Flow {
    Continue,
    Abort(Response),
}

impl From<GatewayError> for Flow {
    fn from(err: GatewayError) -> Self {
        Flow::Abort(err.into_response())
    }
}

/// What a completion hook gets to see once the response exists.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: StatusCode,
    pub aborted_by: Option<&'static str>,
    pub identity: Option<Identity>,
    pub route: Option<RouteKind>,
    pub elapsed: Duration,
}

#[async_trait]
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow;

    /// Called after the response is known. Default does nothing.
    fn complete(&self, _ctx: &RequestContext, _outcome: &Outcome) {}
}

/// An ordered, immutable chain of interceptors.
#[derive(Clone)]
pub struct Pipeline {
    name: &'static str,
    route: Option<RouteKind>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Pipeline {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            route: None,
            interceptors: Vec::new(),
        }
    }

    /// Tag responses produced behind this pipeline with a route kind.
    pub fn tagging(mut self, route: RouteKind) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with<I: Interceptor + 'static>(mut self, interceptor: I) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    pub fn push(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run interceptors until one aborts. Returns how many were invoked.
    /// An already aborted context invokes nothing.
    pub async fn process(&self, ctx: &mut RequestContext) -> usize {
        let mut invoked = 0;
        for interceptor in &self.interceptors {
            if ctx.is_aborted() {
                break;
            }
            invoked += 1;
            if let Flow::Abort(response) = interceptor.intercept(ctx).await {
                tracing::debug!(
                    pipeline = self.name,
                    interceptor = interceptor.name(),
                    status = %response.status(),
                    "Interceptor aborted request"
                );
                metrics::record_abort(interceptor.name());
                ctx.abort(interceptor.name(), response);
            }
        }
        invoked
    }

    /// Completion hooks for the first `invoked` interceptors, innermost first.
    pub fn complete(&self, invoked: usize, ctx: &RequestContext, outcome: &Outcome) {
        for interceptor in self.interceptors[..invoked.min(self.len())].iter().rev() {
            interceptor.complete(ctx, outcome);
        }
    }
}

/// Axum adapter: `middleware::from_fn_with_state(Arc<Pipeline>, pipeline::run)`.
pub async fn run(State(pipeline): State<Arc<Pipeline>>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let mut ctx = RequestContext::new(parts);

    let invoked = pipeline.process(&mut ctx).await;
    let mut response = match ctx.take_abort_response() {
        Some(response) => response,
        None => next.run(ctx.take_request(body)).await,
    };

    if let Some(identity) = ctx.identity() {
        response.extensions_mut().insert(identity.clone());
    }
    if let Some(route) = pipeline.route {
        if response.extensions().get::<RouteKind>().is_none() {
            response.extensions_mut().insert(route);
        }
    }

    let outcome = Outcome {
        status: response.status(),
        aborted_by: ctx.aborted_by(),
        identity: ctx
            .identity()
            .cloned()
            .or_else(|| response.extensions().get::<Identity>().cloned()),
        route: response.extensions().get::<RouteKind>().copied(),
        elapsed: started.elapsed(),
    };
    pipeline.complete(invoked, &ctx, &outcome);

    response
}
