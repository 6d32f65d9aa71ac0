//! Error types for trace recording

use std::path::PathBuf;

/// Errors while writing or reading the ledger and spatial map
///
/// The gate logs these and carries on; they never reverse a completed action.
#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// IO error on a trace file
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Record could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Blocking writer task panicked or was cancelled
    #[error("writer task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl TraceError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
