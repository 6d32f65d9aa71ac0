//! Append-only trace ledger
//!
//! Each record is one JSON line. The writer never reopens earlier lines: the
//! file is opened in append mode and each record goes out in a single
//! `write_all`, so concurrent appenders within one process cannot interleave
//! partial lines. Cross-process locking is not attempted.

use crate::error::TraceError;
use crate::record::TraceRecord;
use coa_intent::IntentId;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Result of an append attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Record written
    Appended,
    /// Ledger directory missing; governance is disabled
    Skipped,
}

/// Writes trace records to the ledger file
#[derive(Debug, Clone)]
pub struct LedgerWriter {
    path: PathBuf,
}

impl LedgerWriter {
    /// Create a writer for `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Ledger file path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line
    ///
    /// # Errors
    /// - `TraceError::Serialize` if the record cannot be encoded
    /// - `TraceError::Io` if the file cannot be opened or written
    pub async fn append(&self, record: &TraceRecord) -> Result<AppendOutcome, TraceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !tokio::fs::try_exists(parent).await.unwrap_or(false) {
                tracing::debug!(path = %self.path.display(), "ledger directory absent, skipping");
                return Ok(AppendOutcome::Skipped);
            }
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> Result<(), TraceError> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| TraceError::io(&path, e))?;
            file.write_all(&line).map_err(|e| TraceError::io(&path, e))
        })
        .await??;

        tracing::info!(record = %record.id, files = record.files.len(), "trace record appended");
        Ok(AppendOutcome::Appended)
    }
}

/// Reads trace records back from the ledger file
#[derive(Debug, Clone)]
pub struct LedgerReader {
    path: PathBuf,
}

impl LedgerReader {
    /// Create a reader for `path`
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// All well-formed records, oldest first
    ///
    /// A missing ledger is empty. Lines that fail to decode are skipped.
    ///
    /// # Errors
    /// `TraceError::Io` if the file exists but cannot be read
    pub async fn records(&self) -> Result<Vec<TraceRecord>, TraceError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TraceError::io(&self.path, e)),
        };
        Ok(parse_lines(&text))
    }

    /// Up to `limit` most recent records related to `intent`, newest first
    ///
    /// # Errors
    /// `TraceError::Io` if the file exists but cannot be read
    pub async fn recent_for_intent(
        &self,
        intent: &IntentId,
        limit: usize,
    ) -> Result<Vec<TraceRecord>, TraceError> {
        let records = self.records().await?;
        Ok(records
            .into_iter()
            .rev()
            .filter(|r| r.relates_to(intent))
            .take(limit)
            .collect())
    }
}

fn parse_lines(text: &str) -> Vec<TraceRecord> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(n, line)| match serde_json::from_str(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!(line = n + 1, "skipping malformed ledger line: {e}");
                None
            }
        })
        .collect()
}
