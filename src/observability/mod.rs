//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → audit interceptor (operation log line, request counters)
//!     → logging.rs (structured events, pretty or JSON)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (log aggregation)
//!     → Prometheus scrape endpoint (when enabled)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line via the trace span
//! - Metrics calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
