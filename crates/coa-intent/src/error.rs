//! Error types for specification reading

use std::path::PathBuf;

/// Errors while reading the intent specification
///
/// These never reach the gate: the store degrades to an empty specification.
#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    /// Specification file does not exist
    #[error("specification not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error during read
    #[error("io error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Status value outside NOT_STARTED / IN_PROGRESS / DONE
    #[error("invalid intent status: '{0}'")]
    InvalidStatus(String),
}

impl SpecError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
