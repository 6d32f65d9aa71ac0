//! Approval-required intent list
//!
//! Plain text, one intent id per line. Blank lines and `#` comments are
//! ignored, as is anything after a `#` on an id line.

use crate::intent::IntentId;
use std::collections::BTreeSet;
use std::path::Path;

/// Intents whose destructive actions need explicit approval
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApprovalList {
    ids: BTreeSet<IntentId>,
}

impl ApprovalList {
    /// Parse list text
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let ids = text
            .lines()
            .map(|line| line.split_once('#').map_or(line, |(before, _)| before).trim())
            .filter(|line| !line.is_empty())
            .map(IntentId::new)
            .collect();
        Self { ids }
    }

    /// Read the list file; a missing or unreadable file is an empty list
    pub async fn load(path: &Path) -> Self {
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::parse(&text),
            Err(e) => {
                tracing::debug!(path = %path.display(), "approval list unavailable: {e}");
                Self::default()
            }
        }
    }

    /// Does this intent require approval?
    #[inline]
    #[must_use]
    pub fn requires_approval(&self, id: &IntentId) -> bool {
        self.ids.contains(id)
    }

    /// Number of listed intents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when nothing is listed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
