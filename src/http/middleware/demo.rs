//! Demo-mode restriction: a demo deployment is browsable but read-only.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{Flow, Interceptor, RequestContext};
use crate::error::GatewayError;

/// Attribute recording that the request was served by a demo deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoMode;

pub struct DemoGuard {
    allow_paths: HashSet<String>,
}

impl DemoGuard {
    pub fn new(allow_paths: &[String]) -> Self {
        Self {
            allow_paths: allow_paths.iter().cloned().collect(),
        }
    }

    /// Safe methods, allow-listed paths and search endpoints pass.
    pub fn permits(&self, ctx: &RequestContext) -> bool {
        if ctx.method().is_safe() {
            return true;
        }
        let path = ctx.path();
        if self.allow_paths.contains(path) {
            return true;
        }
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .is_some_and(|last| last == "search")
    }
}

#[async_trait]
impl Interceptor for DemoGuard {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn intercept(&self, ctx: &mut RequestContext) -> Flow {
        ctx.insert(DemoMode);
        if self.permits(ctx) {
            return Flow::Continue;
        }
        GatewayError::DemoMode {
            method: ctx.method().to_string(),
            path: ctx.path().to_string(),
        }
        .into()
    }
}
