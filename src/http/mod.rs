//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum serve loop, peer address, graceful drain)
//!     → request.rs (request ID, trace span)
//!     → middleware/ (global chain, then the private chain for API groups)
//!     → static_files.rs | route group handler | agent bridge
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;
pub mod static_files;
pub mod tls;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
