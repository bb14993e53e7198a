//! The agent's socket address, checked once at startup.

use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

/// A socket path that was present when the gateway started.
#[derive(Debug, Clone)]
pub struct AgentTarget {
    socket_path: PathBuf,
}

impl AgentTarget {
    /// Fails unless `path` exists and is a unix socket. Nothing can be served
    /// without the agent, so callers treat the error as fatal.
    pub fn verify(path: impl AsRef<Path>) -> Result<Self, StartupError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|source| StartupError::AgentSocketMissing {
            path: path.to_path_buf(),
            source,
        })?;
        if !metadata.file_type().is_socket() {
            return Err(StartupError::AgentSocketNotSocket(path.to_path_buf()));
        }

        tracing::info!(socket = %path.display(), "Agent socket found");
        Ok(Self {
            socket_path: path.to_path_buf(),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}
