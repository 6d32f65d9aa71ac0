//! Workspace-relative file paths
//!
//! Provides [`WorkspacePath`], the normalized form every governed path is
//! reduced to before scope matching, hashing or ledger recording: relative to
//! the workspace root, forward-slash separated, case preserved.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Normalized path relative to the workspace root
///
/// # Examples
/// - `./src\auth//login.ts` → `src/auth/login.ts`
/// - `/work/repo/src/main.rs` (root `/work/repo`) → `src/main.rs`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkspacePath(Vec<String>);

impl WorkspacePath {
    /// Normalize a relative path string
    ///
    /// Backslashes become `/`, empty and `.` segments are dropped.
    ///
    /// # Errors
    /// - `PathError::Empty` if nothing remains after normalization
    /// - `PathError::ParentTraversal` if any segment is `..`
    /// - `PathError::Absolute` for rooted input (use [`Self::within_root`])
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        let unified = raw.trim().replace('\\', "/");
        if unified.starts_with('/') || has_drive_prefix(&unified) {
            return Err(PathError::Absolute(raw.to_string()));
        }

        let mut segments = Vec::new();
        for seg in unified.split('/') {
            match seg {
                "" | "." => continue,
                ".." => return Err(PathError::ParentTraversal(raw.to_string())),
                other => segments.push(other.to_string()),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self(segments))
    }

    /// Normalize a path that may be absolute, relative to `root`
    ///
    /// # Errors
    /// Returns `PathError::OutsideWorkspace` for absolute paths not under `root`,
    /// plus everything [`Self::parse`] rejects.
    pub fn within_root(raw: &str, root: &Path) -> Result<Self, PathError> {
        let candidate = Path::new(raw);
        if !candidate.is_absolute() {
            return Self::parse(raw);
        }
        let relative = candidate
            .strip_prefix(root)
            .map_err(|_| PathError::OutsideWorkspace(raw.to_string()))?;
        Self::parse(&relative.to_string_lossy())
    }

    /// Path segments from root to leaf
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a successfully parsed path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Final segment
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Extension of the final segment, without the dot
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            None
        } else {
            Some(ext)
        }
    }

    /// Resolve against the workspace root on disk
    #[must_use]
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        self.0.iter().fold(root.to_path_buf(), |acc, seg| acc.join(seg))
    }

    /// Forward-slash joined form
    #[inline]
    #[must_use]
    pub fn as_slash_string(&self) -> String {
        self.0.join("/")
    }
}

fn has_drive_prefix(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl Display for WorkspacePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl FromStr for WorkspacePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for WorkspacePath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.as_slash_string())
    }
}

impl<'de> Deserialize<'de> for WorkspacePath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Errors related to workspace paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Nothing left after normalization
    #[error("path is empty")]
    Empty,

    /// Contains a `..` segment
    #[error("path '{0}' escapes its parent with '..'")]
    ParentTraversal(String),

    /// Rooted path passed where a relative one was expected
    #[error("path '{0}' is absolute")]
    Absolute(String),

    /// Absolute path outside the workspace root
    #[error("path '{0}' is outside the workspace")]
    OutsideWorkspace(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_separators() {
        let path = WorkspacePath::parse("./src\\auth//login.ts").unwrap();
        assert_eq!(path.segments(), &["src", "auth", "login.ts"]);
        assert_eq!(path.to_string(), "src/auth/login.ts");
    }

    #[test]
    fn parse_preserves_case() {
        let path = WorkspacePath::parse("Src/Main.RS").unwrap();
        assert_eq!(path.to_string(), "Src/Main.RS");
    }

    #[test]
    fn parse_rejects_traversal_and_empty() {
        assert!(matches!(
            WorkspacePath::parse("src/../secrets.env"),
            Err(PathError::ParentTraversal(_))
        ));
        assert!(matches!(WorkspacePath::parse("./"), Err(PathError::Empty)));
        assert!(matches!(WorkspacePath::parse("/etc/passwd"), Err(PathError::Absolute(_))));
        assert!(matches!(WorkspacePath::parse("C:/x"), Err(PathError::Absolute(_))));
    }

    #[test]
    fn within_root_strips_prefix() {
        let root = Path::new("/work/repo");
        let path = WorkspacePath::within_root("/work/repo/src/main.rs", root).unwrap();
        assert_eq!(path.to_string(), "src/main.rs");

        let relative = WorkspacePath::within_root("src/lib.rs", root).unwrap();
        assert_eq!(relative.to_string(), "src/lib.rs");
    }

    #[test]
    fn within_root_rejects_outside() {
        let root = Path::new("/work/repo");
        assert!(matches!(
            WorkspacePath::within_root("/work/other/a.rs", root),
            Err(PathError::OutsideWorkspace(_))
        ));
    }

    #[test]
    fn extension_and_file_name() {
        let path = WorkspacePath::parse("src/app.test.ts").unwrap();
        assert_eq!(path.file_name(), Some("app.test.ts"));
        assert_eq!(path.extension(), Some("ts"));

        let dotfile = WorkspacePath::parse(".env").unwrap();
        assert_eq!(dotfile.extension(), None);
    }

    #[test]
    fn to_fs_path_joins_root() {
        let path = WorkspacePath::parse("a/b.txt").unwrap();
        assert_eq!(path.to_fs_path(Path::new("/r")), PathBuf::from("/r/a/b.txt"));
    }

    #[test]
    fn serde_as_string() {
        let path = WorkspacePath::parse("a/b.txt").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a/b.txt\"");
        let back: WorkspacePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }
}
