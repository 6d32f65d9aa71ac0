//! Current revision lookup for trace records

use std::path::PathBuf;
use tokio::process::Command;

/// Source of the workspace's current revision id
#[async_trait::async_trait]
pub trait RevisionProvider: Send + Sync + std::fmt::Debug {
    /// Current revision, or `None` when unavailable
    async fn current_revision(&self) -> Option<String>;
}

/// `git rev-parse HEAD` in the workspace root
#[derive(Debug, Clone)]
pub struct GitRevision {
    root: PathBuf,
}

impl GitRevision {
    /// Query the repository containing `root`
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl RevisionProvider for GitRevision {
    async fn current_revision(&self) -> Option<String> {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(&self.root)
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                let rev = String::from_utf8_lossy(&out.stdout).trim().to_string();
                (!rev.is_empty()).then_some(rev)
            }
            Ok(out) => {
                tracing::debug!(status = %out.status, "git rev-parse failed");
                None
            }
            Err(e) => {
                tracing::debug!("git unavailable: {e}");
                None
            }
        }
    }
}

/// Never reports a revision
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRevision;

#[async_trait::async_trait]
impl RevisionProvider for NoRevision {
    async fn current_revision(&self) -> Option<String> {
        None
    }
}

/// Always reports the same revision
#[derive(Debug, Clone)]
pub struct FixedRevision(pub String);

#[async_trait::async_trait]
impl RevisionProvider for FixedRevision {
    async fn current_revision(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_providers() {
        assert_eq!(NoRevision.current_revision().await, None);
        assert_eq!(
            FixedRevision("abc".into()).current_revision().await.as_deref(),
            Some("abc")
        );
    }
}
