//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Private API request:
//!     → ip_matcher.rs (client address against the allow list)
//!     → headers.rs (client address resolution, X-Forwarded-*)
//!     → Pass to the private interceptors
//!
//! Agent-bound request:
//!     → headers.rs (strip hop-by-hop, append X-Forwarded-For)
//! ```
//!
//! # Design Decisions
//! - Fail closed: an unknown client address never passes a non-empty allow list
//! - Forwarded headers are ignored unless explicitly trusted

pub mod headers;
pub mod ip_matcher;
