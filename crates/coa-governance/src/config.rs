//! Governance configuration
//!
//! Read from `<orchestration_dir>/governance.toml` when present:
//!
//! ```toml
//! fail_open_on_missing_approval = false
//! context_history_limit = 10
//! hash_algorithm = "sha256"
//! mutating_tools = ["write_to_file", "apply_patch", "execute_command"]
//! destructive_tools = ["execute_command"]
//! ```
//!
//! Every field is optional; omitted fields take their defaults.

use crate::action::ActionKind;
use crate::error::{GovernanceError, Result};
use coa_artifact::HashAlgorithm;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Default governance directory, relative to the workspace root
pub const DEFAULT_ORCHESTRATION_DIR: &str = ".orchestration";
/// Configuration file name inside the governance directory
pub const CONFIG_FILE: &str = "governance.toml";

const DEFAULT_MUTATING_TOOLS: &[&str] = &[
    "write_to_file",
    "apply_diff",
    "apply_patch",
    "insert_content",
    "search_and_replace",
    "edit_file",
    "execute_command",
    "delete_file",
];
const DEFAULT_DESTRUCTIVE_TOOLS: &[&str] = &["execute_command", "delete_file"];

/// Governance configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernanceConfig {
    /// Governance directory relative to the workspace root; its absence
    /// disables governance
    pub orchestration_dir: PathBuf,
    /// Intent specification, inside the governance directory
    pub spec_file: PathBuf,
    /// Append-only trace ledger, inside the governance directory
    pub ledger_file: PathBuf,
    /// Spatial map, inside the governance directory
    pub map_file: PathBuf,
    /// Approval-required intent list, inside the governance directory
    pub approval_file: PathBuf,
    /// Tools whose actions mutate the workspace
    pub mutating_tools: BTreeSet<String>,
    /// Mutating tools that need approval for sensitive intents
    pub destructive_tools: BTreeSet<String>,
    /// Approve destructive actions when no approval predicate is installed
    pub fail_open_on_missing_approval: bool,
    /// Ledger entries included in an intent context bundle
    pub context_history_limit: usize,
    /// Digest used for observed and recorded content hashes
    pub hash_algorithm: HashAlgorithm,
}

impl GovernanceConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `governance.toml` from the default governance directory
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    /// - `GovernanceError::Io` if the file exists but cannot be read
    /// - `GovernanceError::Config` if it is not valid TOML for this schema
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(DEFAULT_ORCHESTRATION_DIR).join(CONFIG_FILE);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let config = Self::from_toml(&text).map_err(|source| GovernanceError::Config {
                    path: path.clone(),
                    source,
                })?;
                tracing::debug!(path = %path.display(), "governance configuration loaded");
                Ok(config)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(GovernanceError::io(path, e)),
        }
    }

    /// Parse configuration text
    ///
    /// # Errors
    /// Returns the TOML error for malformed input or mistyped fields
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// With governance directory
    #[inline]
    #[must_use]
    pub fn with_orchestration_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.orchestration_dir = dir.into();
        self
    }

    /// With an additional mutating tool
    #[inline]
    #[must_use]
    pub fn with_mutating_tool(mut self, tool: impl Into<String>) -> Self {
        self.mutating_tools.insert(tool.into());
        self
    }

    /// With an additional destructive tool (also mutating)
    #[inline]
    #[must_use]
    pub fn with_destructive_tool(mut self, tool: impl Into<String>) -> Self {
        let tool = tool.into();
        self.mutating_tools.insert(tool.clone());
        self.destructive_tools.insert(tool);
        self
    }

    /// With fail-open behavior when no approval predicate is installed
    #[inline]
    #[must_use]
    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open_on_missing_approval = fail_open;
        self
    }

    /// With context history limit
    #[inline]
    #[must_use]
    pub fn with_context_history_limit(mut self, limit: usize) -> Self {
        self.context_history_limit = limit;
        self
    }

    /// With content hash algorithm
    #[inline]
    #[must_use]
    pub fn with_hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.hash_algorithm = algorithm;
        self
    }

    /// Classify a tool by name
    #[must_use]
    pub fn action_kind(&self, tool: &str) -> ActionKind {
        if self.destructive_tools.contains(tool) {
            ActionKind::Destructive
        } else if self.mutating_tools.contains(tool) {
            ActionKind::Mutating
        } else {
            ActionKind::ReadOnly
        }
    }

    /// Absolute governance directory
    #[must_use]
    pub fn governance_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.orchestration_dir)
    }

    /// Absolute specification path
    #[must_use]
    pub fn spec_path(&self, root: &Path) -> PathBuf {
        self.governance_dir(root).join(&self.spec_file)
    }

    /// Absolute ledger path
    #[must_use]
    pub fn ledger_path(&self, root: &Path) -> PathBuf {
        self.governance_dir(root).join(&self.ledger_file)
    }

    /// Absolute spatial map path
    #[must_use]
    pub fn map_path(&self, root: &Path) -> PathBuf {
        self.governance_dir(root).join(&self.map_file)
    }

    /// Absolute approval list path
    #[must_use]
    pub fn approval_path(&self, root: &Path) -> PathBuf {
        self.governance_dir(root).join(&self.approval_file)
    }
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            orchestration_dir: PathBuf::from(DEFAULT_ORCHESTRATION_DIR),
            spec_file: PathBuf::from("active_intents.yaml"),
            ledger_file: PathBuf::from("agent_trace.jsonl"),
            map_file: PathBuf::from("intent_map.md"),
            approval_file: PathBuf::from("approval_required.txt"),
            mutating_tools: DEFAULT_MUTATING_TOOLS.iter().map(|t| (*t).to_string()).collect(),
            destructive_tools: DEFAULT_DESTRUCTIVE_TOOLS.iter().map(|t| (*t).to_string()).collect(),
            fail_open_on_missing_approval: true,
            context_history_limit: 5,
            hash_algorithm: HashAlgorithm::Sha256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tool_policy() {
        let config = GovernanceConfig::new();
        assert_eq!(config.action_kind("read_file"), ActionKind::ReadOnly);
        assert_eq!(config.action_kind("write_to_file"), ActionKind::Mutating);
        assert_eq!(config.action_kind("apply_patch"), ActionKind::Mutating);
        assert_eq!(config.action_kind("execute_command"), ActionKind::Destructive);
        assert_eq!(config.action_kind("delete_file"), ActionKind::Destructive);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = GovernanceConfig::from_toml(
            "fail_open_on_missing_approval = false\nhash_algorithm = \"blake3\"\n",
        )
        .unwrap();
        assert!(!config.fail_open_on_missing_approval);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Blake3);
        assert_eq!(config.context_history_limit, 5);
        assert_eq!(config.spec_file, PathBuf::from("active_intents.yaml"));
    }

    #[test]
    fn tool_lists_replace_defaults() {
        let config = GovernanceConfig::from_toml(
            "mutating_tools = [\"write\"]\ndestructive_tools = [\"shell\"]\n",
        )
        .unwrap();
        assert_eq!(config.action_kind("write"), ActionKind::Mutating);
        assert_eq!(config.action_kind("shell"), ActionKind::Destructive);
        assert_eq!(config.action_kind("write_to_file"), ActionKind::ReadOnly);
    }

    #[test]
    fn builders() {
        let config = GovernanceConfig::new()
            .with_destructive_tool("rm_rf")
            .with_fail_open(false)
            .with_context_history_limit(2);
        assert_eq!(config.action_kind("rm_rf"), ActionKind::Destructive);
        assert!(config.mutating_tools.contains("rm_rf"));
        assert!(!config.fail_open_on_missing_approval);
        assert_eq!(config.context_history_limit, 2);
    }

    #[test]
    fn paths_resolve_under_root() {
        let config = GovernanceConfig::new();
        let root = Path::new("/work");
        assert_eq!(config.spec_path(root), PathBuf::from("/work/.orchestration/active_intents.yaml"));
        assert_eq!(config.ledger_path(root), PathBuf::from("/work/.orchestration/agent_trace.jsonl"));
    }

    #[test]
    fn load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(GovernanceConfig::load(dir.path()).unwrap(), GovernanceConfig::default());

        let gov = dir.path().join(DEFAULT_ORCHESTRATION_DIR);
        std::fs::create_dir_all(&gov).unwrap();
        std::fs::write(gov.join(CONFIG_FILE), "context_history_limit = \"many\"").unwrap();
        assert!(matches!(
            GovernanceConfig::load(dir.path()),
            Err(GovernanceError::Config { .. })
        ));
    }
}
