//! Testing utilities for COA workspace
//!
//! Shared fixtures: throwaway workspaces with or without a governance
//! directory, plus sample specifications.

#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

use coa_intent::{Intent, IntentStatus};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const GOVERNANCE_DIR: &str = ".orchestration";
pub const SPEC_FILE: &str = "active_intents.yaml";
pub const LEDGER_FILE: &str = "agent_trace.jsonl";
pub const MAP_FILE: &str = "intent_map.md";
pub const APPROVAL_FILE: &str = "approval_required.txt";

/// Two intents with disjoint scopes; INT-002 is sensitive in [`sample_approvals`]
pub const SAMPLE_SPEC: &str = "\
# Active intents
- id: INT-001
  name: \"JWT authentication\"
  status: IN_PROGRESS
  owned_scope:
    - src/auth/**
    - tests/auth/*.test.ts
  constraints:
    - Must not introduce new dependencies
  acceptance_criteria:
    - All auth tests pass
- id: INT-002
  name: Build cleanup
  status: NOT_STARTED
  owned_scope: [\"build/**\", \"scripts/*.sh\"]
";

/// Approval list requiring approval for INT-002
#[must_use]
pub fn sample_approvals() -> &'static str {
    "# destructive actions need sign-off\nINT-002\n"
}

/// Temporary workspace, deleted on drop
#[derive(Debug)]
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    /// Workspace without a governance directory
    #[must_use]
    pub fn ungoverned() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    /// Workspace with an empty governance directory
    #[must_use]
    pub fn governed() -> Self {
        let ws = Self::ungoverned();
        std::fs::create_dir_all(ws.governance_dir()).expect("create governance dir");
        ws
    }

    /// Governed workspace with [`SAMPLE_SPEC`] and [`sample_approvals`]
    #[must_use]
    pub fn with_sample_spec() -> Self {
        Self::governed()
            .with_governance_file(SPEC_FILE, SAMPLE_SPEC)
            .with_governance_file(APPROVAL_FILE, sample_approvals())
    }

    /// Write a file inside the governance directory
    #[must_use]
    pub fn with_governance_file(self, name: &str, content: &str) -> Self {
        std::fs::write(self.governance_dir().join(name), content).expect("write governance file");
        self
    }

    /// Workspace root
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Governance directory (may not exist)
    #[must_use]
    pub fn governance_dir(&self) -> PathBuf {
        self.root().join(GOVERNANCE_DIR)
    }

    /// Ledger path
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.governance_dir().join(LEDGER_FILE)
    }

    /// Spatial map path
    #[must_use]
    pub fn map_path(&self) -> PathBuf {
        self.governance_dir().join(MAP_FILE)
    }

    /// Write a workspace file, creating parent directories
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.root().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, content).expect("write workspace file");
    }

    /// Read a workspace file
    #[must_use]
    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.root().join(rel)).expect("read workspace file")
    }

    /// Remove a workspace file
    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.root().join(rel)).expect("remove workspace file");
    }

    /// Ledger lines, empty if the ledger does not exist
    #[must_use]
    pub fn ledger_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.ledger_path())
            .map(|text| text.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

/// In-memory intent matching INT-001 of [`SAMPLE_SPEC`] (scope only)
#[must_use]
pub fn sample_intent() -> Intent {
    Intent::new("INT-001")
        .with_name("JWT authentication")
        .with_status(IntentStatus::InProgress)
        .with_scope(["src/auth/**", "tests/auth/*.test.ts"])
}
