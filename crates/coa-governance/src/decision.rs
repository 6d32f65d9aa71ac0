//! Gate outcomes
//!
//! A denial is a value returned to the calling agent, serialized as JSON:
//!
//! ```json
//! {"decision":"deny","code":"scope_violation","message":"...","suggestion":"..."}
//! ```

use coa_artifact::OwnedScope;
use coa_intent::IntentId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Machine-readable denial reason
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialCode {
    IntentRequired,
    IntentNotFound,
    ScopeViolation,
    StaleFile,
    UserRejected,
}

impl DenialCode {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IntentRequired => "intent_required",
            Self::IntentNotFound => "intent_not_found",
            Self::ScopeViolation => "scope_violation",
            Self::StaleFile => "stale_file",
            Self::UserRejected => "user_rejected",
        }
    }
}

impl fmt::Display for DenialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured denial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denial {
    pub code: DenialCode,
    pub message: String,
    pub suggestion: String,
}

impl Denial {
    /// Create a denial
    #[must_use]
    pub fn new(code: DenialCode, message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// No intent selected for the session
    #[must_use]
    pub fn intent_required() -> Self {
        Self::new(
            DenialCode::IntentRequired,
            "No active intent: mutating actions must be attributed to a declared intent.",
            "Select an intent from active_intents.yaml before modifying files.",
        )
    }

    /// Selected intent is not in the specification
    #[must_use]
    pub fn intent_not_found(id: &IntentId) -> Self {
        Self::new(
            DenialCode::IntentNotFound,
            format!("Intent '{id}' is not declared in the specification."),
            "Select an intent id listed in active_intents.yaml.",
        )
    }

    /// Target outside the intent's owned scope
    #[must_use]
    pub fn scope_violation(path: &str, id: &IntentId, scope: &OwnedScope) -> Self {
        Self::new(
            DenialCode::ScopeViolation,
            format!("'{path}' is outside the owned scope of intent '{id}'."),
            format!(
                "Limit changes to paths matching [{}], or select the intent that owns '{path}'.",
                scope.patterns().join(", ")
            ),
        )
    }

    /// Target changed since the agent last observed it
    #[must_use]
    pub fn stale_file(path: &str) -> Self {
        Self::new(
            DenialCode::StaleFile,
            format!("'{path}' changed since it was last read in this session."),
            format!("Re-read '{path}' and reapply the change against its current content."),
        )
    }

    /// Approval refused, or unavailable while failing closed
    #[must_use]
    pub fn user_rejected(id: &IntentId, tool: &str) -> Self {
        Self::new(
            DenialCode::UserRejected,
            format!("Destructive action '{tool}' under intent '{id}' was not approved."),
            "Choose a non-destructive approach or ask the user to approve the action.",
        )
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Outcome of a pre-action check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    Deny(Denial),
}

impl GateDecision {
    /// Was the action allowed?
    #[inline]
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Denial details, if denied
    #[inline]
    #[must_use]
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Self::Allow => None,
            Self::Deny(denial) => Some(denial),
        }
    }

    /// Denial code, if denied
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<DenialCode> {
        self.denial().map(|d| d.code)
    }
}

impl From<Denial> for GateDecision {
    fn from(denial: Denial) -> Self {
        Self::Deny(denial)
    }
}
