//! Tool actions as seen by the gate

use coa_trace::MutationClass;
use serde::{Deserialize, Serialize};

/// Patch body markers that name a target file
const PATCH_MARKERS: &[&str] = &[
    "*** Add File:",
    "*** Delete File:",
    "*** Update File:",
    "*** Move to:",
];

/// How a tool affects the workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// No workspace change; always allowed
    ReadOnly,
    /// Changes files
    Mutating,
    /// Mutating and subject to approval for sensitive intents
    Destructive,
}

impl ActionKind {
    /// Does this kind go through the full gate?
    #[inline]
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::ReadOnly)
    }
}

/// One tool invocation requested by the agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionRequest {
    /// Tool name, matched against the configured tool policy
    pub tool: String,
    /// Direct target path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Multi-file patch body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    /// Shell command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Full new content for write-style tools
    ///
    /// When set, the direct `path` target is classified against this text
    /// instead of the re-read file. Hashes and line ranges always use the
    /// persisted bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Caller-declared class; overrides the classifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_class: Option<MutationClass>,
}

impl ActionRequest {
    /// Request for `tool` with no arguments
    #[inline]
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            ..Self::default()
        }
    }

    /// With direct target path
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// With patch body
    #[inline]
    #[must_use]
    pub fn with_patch(mut self, patch: impl Into<String>) -> Self {
        self.patch = Some(patch.into());
        self
    }

    /// With shell command
    #[inline]
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// With new file content
    #[inline]
    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// With explicit mutation class
    #[inline]
    #[must_use]
    pub fn with_mutation_class(mut self, class: MutationClass) -> Self {
        self.mutation_class = Some(class);
        self
    }

    /// Raw target paths: the direct path first, then patch targets, without
    /// duplicates
    #[must_use]
    pub fn target_paths(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        let direct = self.path.iter().map(|p| p.trim().to_string());
        let patched = self.patch.as_deref().map(patch_paths).unwrap_or_default();
        for path in direct.chain(patched) {
            if !path.is_empty() && !targets.contains(&path) {
                targets.push(path);
            }
        }
        targets
    }
}

/// File paths named by a patch body's file markers, in order of appearance
#[must_use]
pub fn patch_paths(patch: &str) -> Vec<String> {
    patch
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            PATCH_MARKERS
                .iter()
                .find_map(|marker| line.strip_prefix(marker))
                .map(|rest| rest.trim().to_string())
        })
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATCH: &str = "\
*** Begin Patch
*** Update File: src/auth/jwt.ts
@@ fn verify
-  return decode(token);
+  return decode(token, key);
*** Add File: src/auth/keys.ts
+export const key = load();
*** Update File: src/old.ts
*** Move to: src/new.ts
*** Delete File: src/legacy.ts
*** End Patch
";

    #[test]
    fn extracts_every_marker() {
        assert_eq!(
            patch_paths(PATCH),
            vec![
                "src/auth/jwt.ts",
                "src/auth/keys.ts",
                "src/old.ts",
                "src/new.ts",
                "src/legacy.ts",
            ]
        );
    }

    #[test]
    fn target_paths_dedup_direct_first() {
        let action = ActionRequest::new("apply_patch")
            .with_path("src/auth/keys.ts")
            .with_patch(PATCH);
        let targets = action.target_paths();
        assert_eq!(targets[0], "src/auth/keys.ts");
        assert_eq!(targets.len(), 5);
    }

    #[test]
    fn command_only_has_no_targets() {
        let action = ActionRequest::new("execute_command").with_command("rm -rf build");
        assert!(action.target_paths().is_empty());
    }

    #[test]
    fn deserializes_partial_json() {
        let action: ActionRequest = serde_json::from_str(
            r#"{"tool":"write_to_file","path":"a.ts","mutation_class":"AST_REFACTOR"}"#,
        )
        .unwrap();
        assert_eq!(action.path.as_deref(), Some("a.ts"));
        assert_eq!(action.mutation_class, Some(MutationClass::StructuralRefactor));
        assert!(action.patch.is_none());
    }
}
