//! Error types for the governance layer
//!
//! Policy denials are not errors: they are [`crate::Denial`] values. These
//! cover configuration and the CLI surface.

use std::path::PathBuf;

/// Governance layer errors
#[derive(Debug, thiserror::Error)]
pub enum GovernanceError {
    /// IO error on a governance file
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed `governance.toml`
    #[error("invalid configuration in {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl GovernanceError {
    /// Create IO error for path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for governance operations
pub type Result<T> = std::result::Result<T, GovernanceError>;
