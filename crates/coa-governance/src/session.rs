//! Per-session governance state
//!
//! The registry is an explicit object owned by the host and shared by
//! reference (usually `Arc<SessionRegistry>`). Sessions are created lazily on
//! first interaction and live until [`SessionRegistry::clear`]; there is no
//! expiry. Keys are disjoint per session, so concurrent sessions never contend
//! beyond a shard lock.

use coa_artifact::{ContentHash, WorkspacePath};
use coa_intent::IntentId;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::watch;

/// Host-assigned session identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// String form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Target file content captured when a mutation was allowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// File did not exist
    Missing,
    /// File content (lossy UTF-8)
    Content(String),
}

impl Snapshot {
    /// Previous content for classification; `None` for a new file
    #[inline]
    #[must_use]
    pub fn as_previous(&self) -> Option<&str> {
        match self {
            Self::Missing => None,
            Self::Content(text) => Some(text),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    active_intent: Option<IntentId>,
    observed: HashMap<WorkspacePath, ContentHash>,
    snapshots: HashMap<WorkspacePath, Snapshot>,
    disposed: watch::Sender<bool>,
}

impl SessionState {
    fn new() -> Self {
        let (disposed, _) = watch::channel(false);
        Self {
            active_intent: None,
            observed: HashMap::new(),
            snapshots: HashMap::new(),
            disposed,
        }
    }
}

/// Session intent and observed-hash registry
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionState>,
}

impl SessionRegistry {
    /// Create an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the session's active intent
    ///
    /// This is the only way an active intent is ever set.
    pub fn select(&self, session: &SessionId, intent: IntentId) {
        tracing::info!(session = %session, intent = %intent, "intent selected");
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .active_intent = Some(intent);
    }

    /// The session's active intent, if one was selected
    #[must_use]
    pub fn active_intent(&self, session: &SessionId) -> Option<IntentId> {
        self.sessions
            .get(session)
            .and_then(|s| s.active_intent.clone())
    }

    /// Remember the hash of `path` as the session last saw it
    pub fn record_observed_hash(&self, session: &SessionId, path: WorkspacePath, hash: ContentHash) {
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .observed
            .insert(path, hash);
    }

    /// Last observed hash of `path`
    #[must_use]
    pub fn observed_hash(&self, session: &SessionId, path: &WorkspacePath) -> Option<ContentHash> {
        self.sessions
            .get(session)
            .and_then(|s| s.observed.get(path).copied())
    }

    /// Drop the observed hash of `path` (e.g. after deletion)
    pub fn forget_observed(&self, session: &SessionId, path: &WorkspacePath) {
        if let Some(mut state) = self.sessions.get_mut(session) {
            state.observed.remove(path);
        }
    }

    /// Store the pre-action content of `path`
    pub fn store_snapshot(&self, session: &SessionId, path: WorkspacePath, snapshot: Snapshot) {
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .snapshots
            .insert(path, snapshot);
    }

    /// Remove and return the pre-action content of `path`
    pub fn take_snapshot(&self, session: &SessionId, path: &WorkspacePath) -> Option<Snapshot> {
        self.sessions
            .get_mut(session)
            .and_then(|mut s| s.snapshots.remove(path))
    }

    /// Receiver that flips to `true` when the session is cleared
    #[must_use]
    pub fn disposal(&self, session: &SessionId) -> watch::Receiver<bool> {
        self.sessions
            .entry(session.clone())
            .or_insert_with(SessionState::new)
            .disposed
            .subscribe()
    }

    /// End a session, dropping all its state
    ///
    /// Pending approval waits on this session resolve as rejected. Returns
    /// whether the session existed.
    pub fn clear(&self, session: &SessionId) -> bool {
        match self.sessions.remove(session) {
            Some((_, state)) => {
                state.disposed.send_replace(true);
                tracing::info!(session = %session, "session cleared");
                true
            }
            None => false,
        }
    }

    /// Is there state for this session?
    #[inline]
    #[must_use]
    pub fn contains(&self, session: &SessionId) -> bool {
        self.sessions.contains_key(session)
    }

    /// Number of live sessions
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// No live sessions?
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
