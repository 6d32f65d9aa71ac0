//! Trace record schema
//!
//! One record per successfully executed mutating action, serialized as one
//! JSON object per ledger line:
//!
//! ```json
//! {"id":"01J...","timestamp":"2026-10-18T09:12:03Z","vcs":{"revision_id":"3f2a..."},
//!  "session_id":"task-7","tool":"write_to_file",
//!  "files":[{"relative_path":"src/auth/jwt.ts",
//!            "ranges":[{"start_line":12,"end_line":30,"content_hash":"sha256:..."}],
//!            "related_intent":"INT-001","mutation_class":"BEHAVIORAL_CHANGE"}]}
//! ```

use crate::classifier::MutationClass;
use chrono::{DateTime, Utc};
use coa_artifact::{ContentHash, WorkspacePath};
use coa_intent::IntentId;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Record identifier (ULID: unique and sortable by creation time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub Ulid);

impl RecordId {
    /// Generate new record ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Revision-control context at the time of the mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsInfo {
    /// Current revision identifier (e.g. a commit sha)
    pub revision_id: String,
}

/// Inclusive, 1-based line span plus the content hash it was recorded with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineRange {
    pub start_line: usize,
    pub end_line: usize,
    pub content_hash: ContentHash,
}

impl LineRange {
    /// Span of `next` that differs from `previous`
    ///
    /// Trims the common leading and trailing lines. Without a previous
    /// version, or when nothing differs, the whole file is covered. A pure
    /// deletion collapses to the single line at the deletion point. An empty
    /// file is `0..=0`.
    #[must_use]
    pub fn affected(previous: Option<&str>, next: &str, content_hash: ContentHash) -> Self {
        let next_lines: Vec<&str> = next.lines().collect();
        let n = next_lines.len();
        let whole = |hash| Self {
            start_line: usize::from(n > 0),
            end_line: n,
            content_hash: hash,
        };

        let Some(previous) = previous else {
            return whole(content_hash);
        };
        let prev_lines: Vec<&str> = previous.lines().collect();

        let prefix = prev_lines
            .iter()
            .zip(&next_lines)
            .take_while(|(a, b)| a == b)
            .count();
        if prefix == n && prefix == prev_lines.len() {
            return whole(content_hash);
        }

        let max_suffix = n.min(prev_lines.len()) - prefix;
        let suffix = prev_lines
            .iter()
            .rev()
            .zip(next_lines.iter().rev())
            .take(max_suffix)
            .take_while(|(a, b)| a == b)
            .count();

        let start = prefix + 1;
        let end = n - suffix;
        if end < start {
            let line = start.min(n);
            return Self {
                start_line: line,
                end_line: line,
                content_hash,
            };
        }
        Self {
            start_line: start,
            end_line: end,
            content_hash,
        }
    }
}

/// One file touched by a mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTrace {
    /// Workspace-relative path
    pub relative_path: WorkspacePath,
    /// Affected spans (at least one)
    pub ranges: Vec<LineRange>,
    /// Intent the session had selected, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_intent: Option<IntentId>,
    /// Refactor or behavioral change
    pub mutation_class: MutationClass,
}

impl FileTrace {
    /// Create a file entry with a single range
    #[must_use]
    pub fn new(relative_path: WorkspacePath, range: LineRange, mutation_class: MutationClass) -> Self {
        Self {
            relative_path,
            ranges: vec![range],
            related_intent: None,
            mutation_class,
        }
    }

    /// Attach the related intent
    #[inline]
    #[must_use]
    pub fn with_intent(mut self, intent: Option<IntentId>) -> Self {
        self.related_intent = intent;
        self
    }
}

/// One ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub id: RecordId,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<VcsInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<String>,
    pub files: Vec<FileTrace>,
}

impl TraceRecord {
    /// New record stamped with a fresh id and the current time
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: RecordId::new(),
            timestamp: Utc::now(),
            vcs: None,
            session_id: None,
            tool: None,
            files: Vec::new(),
        }
    }

    /// With revision id (None leaves it unset)
    #[inline]
    #[must_use]
    pub fn with_revision(mut self, revision_id: Option<String>) -> Self {
        self.vcs = revision_id.map(|revision_id| VcsInfo { revision_id });
        self
    }

    /// With originating session
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// With originating tool name
    #[inline]
    #[must_use]
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Add a file entry
    #[inline]
    #[must_use]
    pub fn with_file(mut self, file: FileTrace) -> Self {
        self.files.push(file);
        self
    }

    /// Does any file entry reference this intent?
    #[must_use]
    pub fn relates_to(&self, intent: &IntentId) -> bool {
        self.files
            .iter()
            .any(|f| f.related_intent.as_ref() == Some(intent))
    }
}

impl Default for TraceRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash() -> ContentHash {
        ContentHash::compute(b"x")
    }

    fn span(previous: Option<&str>, next: &str) -> (usize, usize) {
        let r = LineRange::affected(previous, next, hash());
        (r.start_line, r.end_line)
    }

    #[test]
    fn affected_range_for_new_file_is_whole() {
        assert_eq!(span(None, "a\nb\nc\n"), (1, 3));
        assert_eq!(span(None, ""), (0, 0));
    }

    #[test]
    fn affected_range_trims_common_lines() {
        assert_eq!(span(Some("a\nb\nc\nd"), "a\nB\nC\nd"), (2, 3));
        assert_eq!(span(Some("a\nb"), "a\nb\nc\nd"), (3, 4));
        assert_eq!(span(Some("b\nc"), "a\nb\nc"), (1, 1));
    }

    #[test]
    fn affected_range_for_deletion_and_no_change() {
        assert_eq!(span(Some("a\nb\nc"), "a\nc"), (2, 2));
        assert_eq!(span(Some("a\nb\nc"), "a\nb"), (2, 2));
        assert_eq!(span(Some("a\nb"), "a\nb"), (1, 2));
    }

    #[test]
    fn record_serializes_as_single_line_json() {
        let record = TraceRecord::new()
            .with_revision(Some("abc123".to_string()))
            .with_session("task-7")
            .with_tool("write_to_file")
            .with_file(
                FileTrace::new(
                    WorkspacePath::parse("src/a.ts").unwrap(),
                    LineRange::affected(None, "x\n", hash()),
                    MutationClass::BehavioralChange,
                )
                .with_intent(Some(IntentId::new("INT-001"))),
            );

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"revision_id\":\"abc123\""));
        assert!(json.contains("\"related_intent\":\"INT-001\""));
        assert!(json.contains("\"mutation_class\":\"BEHAVIORAL_CHANGE\""));
        assert!(json.contains("\"content_hash\":\"sha256:"));

        let back: TraceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert!(back.relates_to(&IntentId::new("INT-001")));
        assert!(!back.relates_to(&IntentId::new("INT-002")));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let json = serde_json::to_string(&TraceRecord::new()).unwrap();
        assert!(!json.contains("vcs"));
        assert!(!json.contains("session_id"));
    }

    #[test]
    fn record_ids_sort_by_creation() {
        let a = RecordId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = RecordId::new();
        assert!(a < b);
    }
}
