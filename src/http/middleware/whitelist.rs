//! IP allow list for the private API.

use async_trait::async_trait;

use super::{Flow, Interceptor, RequestContext};
use crate::error::GatewayError;
use crate::security::ip_matcher::IpMatcher;

pub struct IpWhitelist {
    matcher: IpMatcher,
    trust_forwarded: bool,
}

impl IpWhitelist {
    pub fn new(matcher: IpMatcher, trust_forwarded: bool) -> Self {
        Self {
            matcher,
            trust_forwarded,
        }
    }
}

#[async_trait]
impl Interceptor for IpWhitelist {
    fn name(&self) -> &'static str {
        "whitelist"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        if self.matcher.is_empty() {
            return Flow::Continue;
        }
        match ctx.client_ip(self.trust_forwarded) {
            Some(ip) if self.matcher.contains(ip) => Flow::Continue,
            Some(ip) => {
                tracing::warn!(client = %ip, path = %ctx.path(), "Client not in allow list");
                GatewayError::IpNotAllowed(ip.to_string()).into()
            }
            None => {
                tracing::warn!(path = %ctx.path(), "Client address unknown, denying");
                GatewayError::IpNotAllowed("unknown".to_string()).into()
            }
        }
    }
}
