//! File-backed specification store
//!
//! The store re-reads the file on every load so edits made mid-session are
//! seen by the next gate check. A missing or unreadable file is treated as an
//! empty specification: every lookup is "not found", never an error.

use crate::error::SpecError;
use crate::intent::{Intent, IntentId, IntentSpec};
use crate::parser;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reader for the intent specification file
#[derive(Debug, Clone)]
pub struct SpecStore {
    path: PathBuf,
}

impl SpecStore {
    /// Create a store reading from `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Backing file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse, surfacing I/O failures
    ///
    /// # Errors
    /// - `SpecError::NotFound` if the file does not exist
    /// - `SpecError::Io` for any other read failure
    pub async fn try_load(&self) -> Result<IntentSpec, SpecError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(parser::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(SpecError::NotFound(self.path.clone())),
            Err(e) => Err(SpecError::io(&self.path, e)),
        }
    }

    /// Read and parse, degrading to an empty specification on failure
    pub async fn load(&self) -> IntentSpec {
        match self.try_load().await {
            Ok(spec) => spec,
            Err(SpecError::NotFound(path)) => {
                tracing::debug!(path = %path.display(), "specification file absent");
                IntentSpec::default()
            }
            Err(e) => {
                tracing::warn!("specification unreadable, treating as empty: {e}");
                IntentSpec::default()
            }
        }
    }

    /// Load and return the intent with `id`, if any
    pub async fn lookup(&self, id: &IntentId) -> Option<Intent> {
        self.load()
            .await
            .into_intents()
            .into_iter()
            .find(|i| &i.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_spec() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpecStore::new(dir.path().join("active_intents.yaml"));

        assert!(matches!(store.try_load().await, Err(SpecError::NotFound(_))));
        assert!(store.load().await.is_empty());
        assert!(store.lookup(&"INT-001".into()).await.is_none());
    }

    #[tokio::test]
    async fn reads_current_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("active_intents.yaml");
        let store = SpecStore::new(&path);

        tokio::fs::write(&path, "- id: A\n").await.unwrap();
        assert!(store.lookup(&"A".into()).await.is_some());

        // Edits are visible on the next load
        tokio::fs::write(&path, "- id: B\n").await.unwrap();
        assert!(store.lookup(&"A".into()).await.is_none());
        assert!(store.lookup(&"B".into()).await.is_some());
    }

    #[tokio::test]
    async fn directory_in_place_of_file_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let store = SpecStore::new(dir.path());
        assert!(store.load().await.is_empty());
    }
}
