//! Operation audit log. First in the global chain so it sees every request,
//! including those rejected by later interceptors.

use async_trait::async_trait;

use super::{Flow, Interceptor, Outcome, RequestContext};
use crate::observability::metrics;

pub struct OperationLog;

impl OperationLog {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interceptor for OperationLog {
    fn name(&self) -> &'static str {
        "operation_log"
    }

    async fn intercept(&self, _ctx: &mut RequestContext) -> Flow {
        Flow::Continue
    }

    fn complete(&self, ctx: &RequestContext, outcome: &Outcome) {
        let identity = outcome
            .identity
            .as_ref()
            .map(|i| i.0.as_str())
            .unwrap_or("anonymous");
        let route = outcome.route.map(|r| r.as_str()).unwrap_or("unknown");
        let rejected_by = outcome.aborted_by.unwrap_or("-");
        let latency_ms = outcome.elapsed.as_millis() as u64;

        metrics::record_request(route, ctx.method(), outcome.status.as_u16(), outcome.elapsed);

        // Reads are only interesting while debugging; writes are operations.
        if ctx.method().is_safe() {
            tracing::debug!(
                target: "operation",
                method = %ctx.method(),
                path = %ctx.path(),
                identity,
                route,
                status = outcome.status.as_u16(),
                rejected_by,
                latency_ms,
                "request"
            );
        } else {
            tracing::info!(
                target: "operation",
                method = %ctx.method(),
                path = %ctx.path(),
                identity,
                route,
                status = outcome.status.as_u16(),
                rejected_by,
                latency_ms,
                "operation"
            );
        }
    }
}
