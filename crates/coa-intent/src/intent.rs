//! Intent types
//!
//! An intent is a declared unit of work: an id, an authorized file scope and
//! the rules the work must respect. Intents are read-only here; they are
//! created by editing the specification file.

use crate::error::SpecError;
use coa_artifact::OwnedScope;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Intent identifier, unique within one specification
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(String);

impl IntentId {
    /// Wrap an identifier string
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IntentId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for IntentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Lifecycle status of an intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    /// Declared, no work yet
    NotStarted,
    /// Work underway
    InProgress,
    /// Acceptance criteria met
    Done,
}

impl IntentStatus {
    /// Wire name as written in the specification
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NOT_STARTED",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentStatus {
    type Err = SpecError;

    /// Accepts any case, with `-` or spaces in place of `_`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = s.trim().to_ascii_uppercase().replace(['-', ' '], "_");
        match canonical.as_str() {
            "NOT_STARTED" => Ok(Self::NotStarted),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(SpecError::InvalidStatus(s.to_string())),
        }
    }
}

/// A declared unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Identifier
    pub id: IntentId,
    /// Human-readable name
    pub name: Option<String>,
    /// Lifecycle status
    pub status: Option<IntentStatus>,
    /// Paths this intent may mutate (empty = unrestricted)
    pub owned_scope: OwnedScope,
    /// Free-text rules the work must respect
    pub constraints: Vec<String>,
    /// Free-text checks that define "done"
    pub acceptance_criteria: Vec<String>,
}

impl Intent {
    /// Create an intent with only an id
    #[must_use]
    pub fn new(id: impl Into<IntentId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            status: None,
            owned_scope: OwnedScope::default(),
            constraints: Vec::new(),
            acceptance_criteria: Vec::new(),
        }
    }

    /// With name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// With status
    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: IntentStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// With owned scope patterns
    #[inline]
    #[must_use]
    pub fn with_scope<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.owned_scope = OwnedScope::new(patterns);
        self
    }

    /// Name if set, otherwise the id
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// Parsed specification: intents in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSpec {
    intents: Vec<Intent>,
}

impl IntentSpec {
    /// Wrap a list of intents
    #[inline]
    #[must_use]
    pub fn new(intents: Vec<Intent>) -> Self {
        Self { intents }
    }

    /// First intent with the given id
    #[must_use]
    pub fn get(&self, id: &IntentId) -> Option<&Intent> {
        self.intents.iter().find(|i| &i.id == id)
    }

    /// Does an intent with this id exist?
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &IntentId) -> bool {
        self.get(id).is_some()
    }

    /// All intents
    #[inline]
    #[must_use]
    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Number of intents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.intents.len()
    }

    /// True when no intents were found
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Consume into the intent list
    #[inline]
    #[must_use]
    pub fn into_intents(self) -> Vec<Intent> {
        self.intents
    }
}
