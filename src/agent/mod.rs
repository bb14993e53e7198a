//! Agent proxy subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     target.rs (socket must exist, else fatal)
//!
//! Unmatched request under the forward prefix:
//!     → rewrite.rs (AgentRequest: http://unix + original path/query/body)
//!     → connector.rs (pooled connection over the unix socket)
//!     → bridge.rs (send, map failures, stream response back)
//!     → upgrade.rs (splice both sides after 101)
//! ```

pub mod bridge;
pub mod connector;
pub mod rewrite;
pub mod target;
pub mod upgrade;

pub use bridge::AgentBridge;
pub use rewrite::AgentRequest;
pub use target::AgentTarget;
