//! Domain binding: once a domain is bound, the private API only answers on it.

use async_trait::async_trait;

use super::{Flow, Interceptor, RequestContext};
use crate::error::GatewayError;
use crate::routing::matcher::{request_host, HostMatcher};

pub struct DomainBinding {
    host: Option<HostMatcher>,
}

impl DomainBinding {
    pub fn new(bind_domain: Option<&str>) -> Self {
        Self {
            host: bind_domain.map(HostMatcher::new),
        }
    }
}

#[async_trait]
impl Interceptor for DomainBinding {
    fn name(&self) -> &'static str {
        "domain"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        let Some(host) = &self.host else {
            return Flow::Continue;
        };
        if host.matches(ctx.headers(), ctx.uri()) {
            return Flow::Continue;
        }
        let seen = request_host(ctx.headers(), ctx.uri()).unwrap_or_default();
        tracing::warn!(host = %seen, bound = host.expected(), "Request host does not match bound domain");
        GatewayError::DomainNotBound(seen).into()
    }
}
