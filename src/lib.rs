//! HTTP gateway for the server-management dashboard.
//!
//! One listener classifies every request: liveness check, embedded
//! front-end, private API route groups behind an interceptor chain, a
//! reverse proxy to the agent's unix socket, or the SPA index.

pub mod agent;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::{GatewayError, StartupError};
pub use gateway::{Gateway, GatewayBuilder};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
