//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method)
//!     → /health                      → Health
//!     → /, /assets, /public, images  → Static
//!     → public route group entry     → handler
//!     → private route group entry    → private chain → handler
//!     → forward prefix (matcher.rs)  → agent bridge
//!     → anything else                → SPA index
//! ```
//!
//! # Design Decisions
//! - Router built once at startup, immutable at runtime
//! - No regex in hot path (axum's path tree plus prefix matching)
//! - First match wins, in the order above

pub mod group;
pub mod matcher;
pub mod router;

pub use group::{CoreGroup, RouteGroup};
pub use router::{DispatchParts, API_PREFIX};

/// Which branch of the decision tree produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteKind {
    Health,
    Static,
    Public,
    Private,
    Agent,
    Spa,
}

impl RouteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::Health => "health",
            RouteKind::Static => "static",
            RouteKind::Public => "public",
            RouteKind::Private => "private",
            RouteKind::Agent => "agent",
            RouteKind::Spa => "spa",
        }
    }
}

impl std::fmt::Display for RouteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
