//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by route, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by route
//! - `gateway_pipeline_aborts_total` (counter): rejections by interceptor
//! - `gateway_agent_errors_total` (counter): agent failures by kind

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::Method;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint on `addr`. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(route: &'static str, method: &Method, status: u16, elapsed: Duration) {
    ::metrics::counter!(
        "gateway_requests_total",
        "route" => route,
        "method" => method_label(method),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("gateway_request_duration_seconds", "route" => route)
        .record(elapsed.as_secs_f64());
}

/// Label value for `method`. Extension methods collapse into `other` so
/// clients cannot grow the label set.
fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        "CONNECT" => "CONNECT",
        "TRACE" => "TRACE",
        _ => "other",
    }
}

pub fn record_abort(interceptor: &'static str) {
    ::metrics::counter!("gateway_pipeline_aborts_total", "interceptor" => interceptor)
        .increment(1);
}

pub fn record_agent_error(kind: &'static str) {
    ::metrics::counter!("gateway_agent_errors_total", "kind" => kind).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_methods_keep_their_label() {
        assert_eq!(method_label(&Method::GET), "GET");
        assert_eq!(method_label(&Method::DELETE), "DELETE");
    }

    #[test]
    fn extension_methods_share_one_label() {
        let purge = Method::from_bytes(b"PURGE").unwrap();
        let random = Method::from_bytes(b"X-RANDOM-4821").unwrap();
        assert_eq!(method_label(&purge), "other");
        assert_eq!(method_label(&random), "other");
    }
}
