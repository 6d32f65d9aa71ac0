//! Approval seam for destructive actions
//!
//! The host installs an [`ApprovalPredicate`] (a dialog, a chat prompt, a
//! policy service). The gate awaits it only for destructive actions under
//! intents on the approval-required list.

use crate::session::SessionId;
use coa_intent::IntentId;
use serde::Serialize;

/// What the approver is asked to decide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApprovalRequest {
    pub session: SessionId,
    pub intent: IntentId,
    pub tool: String,
    /// Workspace-relative targets, if any
    pub targets: Vec<String>,
    /// Shell command, for command tools
    pub command: Option<String>,
}

impl ApprovalRequest {
    /// One-line summary for prompts and logs
    #[must_use]
    pub fn summary(&self) -> String {
        let subject = match (&self.command, self.targets.is_empty()) {
            (Some(cmd), _) => format!("run `{cmd}`"),
            (None, false) => format!("modify {}", self.targets.join(", ")),
            (None, true) => "proceed".to_string(),
        };
        format!("[{}] {} wants to {subject}", self.intent, self.tool)
    }
}

/// Async approval decision
#[async_trait::async_trait]
pub trait ApprovalPredicate: Send + Sync {
    /// `true` to approve. May wait indefinitely; the gate cancels the wait
    /// if the session is cleared.
    async fn approve(&self, request: &ApprovalRequest) -> bool;
}
