//! Pre-action gate and post-action recorder
//!
//! # Check order
//!
//! The pre-action check runs a fixed sequence; the first failing step decides:
//!
//! 1. Governance directory absent: allow (governance disabled)
//! 2. Read-only tool: allow
//! 3. No active intent: `intent_required`
//! 4. Active intent not declared: `intent_not_found`
//! 5. A target outside the intent's owned scope: `scope_violation`
//! 6. A target changed since the session observed it: `stale_file`
//! 7. Destructive tool under an approval-required intent, not approved:
//!    `user_rejected`
//!
//! On allow, each target's current content is snapshotted so the post-action
//! step can classify the change against what the gate saw.
//!
//! # Post-action
//!
//! After the host executes an allowed mutation, [`Gate::post_action`] hashes
//! the persisted content, classifies the change, appends a trace record,
//! updates the spatial map for behavioral changes, and refreshes the
//! session's observed hash. Failures here are logged and swallowed: the
//! action already happened.

use crate::action::{ActionKind, ActionRequest};
use crate::approval::{ApprovalPredicate, ApprovalRequest};
use crate::config::GovernanceConfig;
use crate::context::IntentContext;
use crate::decision::{Denial, GateDecision};
use crate::error::Result;
use crate::revision::{GitRevision, RevisionProvider};
use crate::session::{SessionId, SessionRegistry, Snapshot};
use coa_artifact::{ContentHash, WorkspacePath};
use coa_intent::{ApprovalList, Intent, IntentId, SpecStore};
use coa_trace::{
    FileTrace, HeuristicClassifier, LedgerReader, LedgerWriter, LineRange, MutationClass,
    MutationClassifier, SpatialMap, TraceRecord,
};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Governance gate for one workspace
pub struct Gate {
    root: PathBuf,
    config: GovernanceConfig,
    sessions: Arc<SessionRegistry>,
    classifier: Arc<dyn MutationClassifier>,
    approval: Option<Arc<dyn ApprovalPredicate>>,
    revision: Arc<dyn RevisionProvider>,
    spec: SpecStore,
    ledger: LedgerWriter,
    map: SpatialMap,
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate")
            .field("root", &self.root)
            .field("classifier", &self.classifier.name())
            .field("approval", &self.approval.is_some())
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}

impl Gate {
    /// Gate for `root` with the heuristic classifier, git revisions, a
    /// private session registry and no approval predicate
    ///
    /// A relative `root` is resolved against the current directory so
    /// absolute target paths inside the workspace normalize.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, config: GovernanceConfig) -> Self {
        let root = absolute_root(root.into());
        Self {
            spec: SpecStore::new(config.spec_path(&root)),
            ledger: LedgerWriter::new(config.ledger_path(&root)),
            map: SpatialMap::new(config.map_path(&root)),
            sessions: Arc::new(SessionRegistry::new()),
            classifier: Arc::new(HeuristicClassifier::new()),
            approval: None,
            revision: Arc::new(GitRevision::new(root.clone())),
            root,
            config,
        }
    }

    /// Gate for `root` using `governance.toml` when present
    ///
    /// # Errors
    /// Returns `GovernanceError` if the configuration file is unreadable or
    /// malformed
    pub fn from_workspace(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let config = GovernanceConfig::load(&root)?;
        Ok(Self::new(root, config))
    }

    /// Share a host-owned session registry
    #[inline]
    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<SessionRegistry>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Replace the mutation classifier
    #[inline]
    #[must_use]
    pub fn with_classifier(mut self, classifier: Arc<dyn MutationClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Install the approval predicate for destructive actions
    #[inline]
    #[must_use]
    pub fn with_approval(mut self, approval: Arc<dyn ApprovalPredicate>) -> Self {
        self.approval = Some(approval);
        self
    }

    /// Replace the revision provider
    #[inline]
    #[must_use]
    pub fn with_revision(mut self, revision: Arc<dyn RevisionProvider>) -> Self {
        self.revision = revision;
        self
    }

    /// Workspace root
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GovernanceConfig {
        &self.config
    }

    /// Session registry
    #[inline]
    #[must_use]
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// Specification store
    #[inline]
    #[must_use]
    pub fn spec(&self) -> &SpecStore {
        &self.spec
    }

    /// Reader over this gate's ledger
    #[must_use]
    pub fn ledger_reader(&self) -> LedgerReader {
        LedgerReader::new(self.ledger.path())
    }

    /// Is governance enabled (governance directory present)?
    pub async fn is_enabled(&self) -> bool {
        tokio::fs::try_exists(self.config.governance_dir(&self.root))
            .await
            .unwrap_or(false)
    }

    /// Select an intent for the session and return its context bundle
    ///
    /// # Errors
    /// Returns an `intent_not_found` denial if the id is not declared; the
    /// session's active intent is left unchanged.
    pub async fn select_intent(
        &self,
        session: &SessionId,
        id: &IntentId,
    ) -> std::result::Result<IntentContext, Denial> {
        let context = IntentContext::load(
            &self.spec,
            &self.ledger_reader(),
            id,
            self.config.context_history_limit,
        )
        .await
        .ok_or_else(|| Denial::intent_not_found(id))?;

        self.sessions.select(session, id.clone());
        Ok(context)
    }

    /// Decide whether `action` may run
    pub async fn pre_check(&self, session: &SessionId, action: &ActionRequest) -> GateDecision {
        let decision = self.evaluate(session, action).await;
        match &decision {
            GateDecision::Allow => {
                tracing::info!(session = %session, tool = %action.tool, "action allowed");
            }
            GateDecision::Deny(denial) => {
                tracing::info!(session = %session, tool = %action.tool, code = %denial.code, "action denied");
            }
        }
        decision
    }

    async fn evaluate(&self, session: &SessionId, action: &ActionRequest) -> GateDecision {
        if !self.is_enabled().await {
            return GateDecision::Allow;
        }

        let kind = self.config.action_kind(&action.tool);
        if !kind.is_mutating() {
            return GateDecision::Allow;
        }

        let Some(active) = self.sessions.active_intent(session) else {
            return Denial::intent_required().into();
        };

        let Some(intent) = self.spec.lookup(&active).await else {
            return Denial::intent_not_found(&active).into();
        };

        let targets = match self.scoped_targets(&intent, action) {
            Ok(targets) => targets,
            Err(denial) => return denial.into(),
        };

        let mut snapshots = Vec::with_capacity(targets.len());
        for path in targets {
            let snapshot = match self.read_current(&path).await {
                Some(bytes) => {
                    let current = ContentHash::compute_with(self.config.hash_algorithm, &bytes);
                    if let Some(observed) = self.sessions.observed_hash(session, &path) {
                        if observed != current {
                            return Denial::stale_file(&path.to_string()).into();
                        }
                    }
                    Snapshot::Content(String::from_utf8_lossy(&bytes).into_owned())
                }
                None => Snapshot::Missing,
            };
            snapshots.push((path, snapshot));
        }

        if kind == ActionKind::Destructive && !self.approve(session, &intent, action, &snapshots).await {
            return Denial::user_rejected(&intent.id, &action.tool).into();
        }

        for (path, snapshot) in snapshots {
            self.sessions.store_snapshot(session, path, snapshot);
        }
        GateDecision::Allow
    }

    /// Normalize every target and check it against the owned scope
    fn scoped_targets(
        &self,
        intent: &Intent,
        action: &ActionRequest,
    ) -> std::result::Result<Vec<WorkspacePath>, Denial> {
        action
            .target_paths()
            .into_iter()
            .map(|raw| match WorkspacePath::within_root(&raw, &self.root) {
                Ok(path) if intent.owned_scope.permits(&path) => Ok(path),
                Ok(path) => Err(Denial::scope_violation(&path.to_string(), &intent.id, &intent.owned_scope)),
                Err(e) => {
                    tracing::debug!(path = %raw, "target rejected: {e}");
                    Err(Denial::scope_violation(&raw, &intent.id, &intent.owned_scope))
                }
            })
            .collect()
    }

    async fn approve(
        &self,
        session: &SessionId,
        intent: &Intent,
        action: &ActionRequest,
        targets: &[(WorkspacePath, Snapshot)],
    ) -> bool {
        let approvals = ApprovalList::load(&self.config.approval_path(&self.root)).await;
        if !approvals.requires_approval(&intent.id) {
            return true;
        }

        let Some(predicate) = &self.approval else {
            let approved = self.config.fail_open_on_missing_approval;
            tracing::warn!(intent = %intent.id, approved, "no approval predicate installed");
            return approved;
        };

        let request = ApprovalRequest {
            session: session.clone(),
            intent: intent.id.clone(),
            tool: action.tool.clone(),
            targets: targets.iter().map(|(p, _)| p.to_string()).collect(),
            command: action.command.clone(),
        };
        tracing::info!("awaiting approval: {}", request.summary());

        let mut disposed = self.sessions.disposal(session);
        tokio::select! {
            approved = predicate.approve(&request) => approved,
            _ = disposed.wait_for(|d| *d) => {
                tracing::info!(session = %session, "session disposed while awaiting approval");
                false
            }
        }
    }

    /// Hash `path` as read by the session
    ///
    /// Call after a read-only action so a later write can be checked for
    /// staleness. Returns the recorded hash, or `None` if the path is invalid
    /// or unreadable.
    pub async fn observe_read(&self, session: &SessionId, path: &str) -> Option<ContentHash> {
        let path = WorkspacePath::within_root(path, &self.root).ok()?;
        let bytes = self.read_current(&path).await?;
        let hash = ContentHash::compute_with(self.config.hash_algorithm, &bytes);
        self.sessions.record_observed_hash(session, path, hash);
        Some(hash)
    }

    /// Record a successfully executed action
    ///
    /// Returns the appended record, or `None` when nothing was traced
    /// (governance disabled, read-only tool, or no file targets).
    pub async fn post_action(&self, session: &SessionId, action: &ActionRequest) -> Option<TraceRecord> {
        if !self.is_enabled().await || !self.config.action_kind(&action.tool).is_mutating() {
            return None;
        }

        let active = self.sessions.active_intent(session);
        let intent_name = match &active {
            Some(id) => self.spec.lookup(id).await.and_then(|i| i.name),
            None => None,
        };

        let mut record = TraceRecord::new()
            .with_session(session.as_str())
            .with_tool(action.tool.clone());
        let mut behavioral = Vec::new();

        for raw in action.target_paths() {
            let Ok(path) = WorkspacePath::within_root(&raw, &self.root) else {
                continue;
            };
            let current = self.read_current(&path).await;
            let persisted = current.as_deref().unwrap_or_default();
            let text = String::from_utf8_lossy(persisted);
            let next: &str = match &action.content {
                Some(content) if action.path.as_deref().map(str::trim) == Some(raw.as_str()) => content.as_str(),
                _ => text.as_ref(),
            };

            let snapshot = self.sessions.take_snapshot(session, &path);
            let previous = snapshot.as_ref().and_then(Snapshot::as_previous);
            let class = action
                .mutation_class
                .unwrap_or_else(|| self.classifier.classify_path(&path.to_string(), previous, next));

            let hash = ContentHash::compute_with(self.config.hash_algorithm, persisted);
            let range = LineRange::affected(previous, &text, hash);

            if current.is_some() {
                self.sessions.record_observed_hash(session, path.clone(), hash);
            } else {
                self.sessions.forget_observed(session, &path);
            }
            if class == MutationClass::BehavioralChange {
                behavioral.push(path.to_string());
            }
            record = record.with_file(FileTrace::new(path, range, class).with_intent(active.clone()));
        }

        if record.files.is_empty() {
            return None;
        }

        record = record.with_revision(self.revision.current_revision().await);
        if let Err(e) = self.ledger.append(&record).await {
            tracing::warn!(record = %record.id, "ledger append failed: {e}");
        }

        if let Some(intent) = &active {
            for path in &behavioral {
                if let Err(e) = self.map.record(intent, intent_name.as_deref(), path).await {
                    tracing::warn!(intent = %intent, path = %path, "spatial map update failed: {e}");
                }
            }
        }

        Some(record)
    }

    async fn read_current(&self, path: &WorkspacePath) -> Option<Vec<u8>> {
        let fs_path = path.to_fs_path(&self.root);
        match tokio::fs::read(&fs_path).await {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(path = %fs_path.display(), "target unreadable: {e}");
                None
            }
        }
    }
}

fn absolute_root(root: PathBuf) -> PathBuf {
    if root.is_absolute() {
        return root;
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(root),
        Err(e) => {
            tracing::warn!(root = %root.display(), "cannot resolve workspace root: {e}");
            root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::DenialCode;

    struct Workspace {
        dir: tempfile::TempDir,
    }

    impl Workspace {
        fn governed(spec: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let gov = dir.path().join(".orchestration");
            std::fs::create_dir_all(&gov).unwrap();
            std::fs::write(gov.join("active_intents.yaml"), spec).unwrap();
            Self { dir }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.dir.path().join(rel);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }

        fn gate(&self) -> Gate {
            Gate::new(self.dir.path(), GovernanceConfig::new())
                .with_revision(Arc::new(crate::revision::NoRevision))
        }
    }

    const SPEC: &str = "\
- id: INT-001
  name: JWT auth
  status: IN_PROGRESS
  owned_scope:
    - src/auth/**
";

    #[tokio::test]
    async fn ungoverned_workspace_allows_everything() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Gate::new(dir.path(), GovernanceConfig::new());
        let action = ActionRequest::new("write_to_file").with_path("anything.rs");
        assert!(gate.pre_check(&"s".into(), &action).await.is_allowed());
        assert!(gate.post_action(&"s".into(), &action).await.is_none());
    }

    #[tokio::test]
    async fn read_only_tools_pass_without_intent() {
        let ws = Workspace::governed(SPEC);
        let action = ActionRequest::new("read_file").with_path("src/billing/x.ts");
        assert!(ws.gate().pre_check(&"s".into(), &action).await.is_allowed());
    }

    #[tokio::test]
    async fn intent_required_precedes_scope() {
        let ws = Workspace::governed(SPEC);
        let action = ActionRequest::new("write_to_file").with_path("src/billing/x.ts");
        let decision = ws.gate().pre_check(&"s".into(), &action).await;
        assert_eq!(decision.code(), Some(DenialCode::IntentRequired));
    }

    #[tokio::test]
    async fn undeclared_intent_is_not_found() {
        let ws = Workspace::governed(SPEC);
        let gate = ws.gate();
        let session = SessionId::new("s");
        gate.sessions().select(&session, IntentId::new("INT-404"));

        let action = ActionRequest::new("write_to_file").with_path("src/auth/a.ts");
        let decision = gate.pre_check(&session, &action).await;
        assert_eq!(decision.code(), Some(DenialCode::IntentNotFound));
    }

    #[tokio::test]
    async fn traversal_is_a_scope_violation() {
        let ws = Workspace::governed(SPEC);
        let gate = ws.gate();
        let session = SessionId::new("s");
        gate.sessions().select(&session, IntentId::new("INT-001"));

        let action = ActionRequest::new("write_to_file").with_path("src/auth/../../etc/passwd");
        let decision = gate.pre_check(&session, &action).await;
        assert_eq!(decision.code(), Some(DenialCode::ScopeViolation));
    }

    #[tokio::test]
    async fn select_intent_returns_context() {
        let ws = Workspace::governed(SPEC);
        let gate = ws.gate();
        let session = SessionId::new("s");

        let denial = gate
            .select_intent(&session, &IntentId::new("INT-404"))
            .await
            .unwrap_err();
        assert_eq!(denial.code, DenialCode::IntentNotFound);
        assert_eq!(gate.sessions().active_intent(&session), None);

        let context = gate
            .select_intent(&session, &IntentId::new("INT-001"))
            .await
            .unwrap();
        assert_eq!(context.intent.display_name(), "JWT auth");
        assert_eq!(gate.sessions().active_intent(&session), Some(IntentId::new("INT-001")));
    }

    #[tokio::test]
    async fn observe_then_external_edit_is_stale() {
        let ws = Workspace::governed(SPEC);
        ws.write("src/auth/jwt.ts", "v1\n");
        let gate = ws.gate();
        let session = SessionId::new("s");
        gate.sessions().select(&session, IntentId::new("INT-001"));

        assert!(gate.observe_read(&session, "src/auth/jwt.ts").await.is_some());
        ws.write("src/auth/jwt.ts", "v2\n");

        let action = ActionRequest::new("write_to_file").with_path("src/auth/jwt.ts");
        let decision = gate.pre_check(&session, &action).await;
        assert_eq!(decision.code(), Some(DenialCode::StaleFile));
    }

    #[tokio::test]
    async fn post_action_refreshes_observed_hash() {
        let ws = Workspace::governed(SPEC);
        ws.write("src/auth/jwt.ts", "v1\n");
        let gate = ws.gate();
        let session = SessionId::new("s");
        gate.sessions().select(&session, IntentId::new("INT-001"));
        gate.observe_read(&session, "src/auth/jwt.ts").await;

        let action = ActionRequest::new("write_to_file").with_path("src/auth/jwt.ts");
        assert!(gate.pre_check(&session, &action).await.is_allowed());
        ws.write("src/auth/jwt.ts", "v2\n");
        let record = gate.post_action(&session, &action).await.unwrap();
        assert_eq!(record.files.len(), 1);

        // the agent's own write is not stale on the next check
        assert!(gate.pre_check(&session, &action).await.is_allowed());
    }

    #[tokio::test]
    async fn non_utf8_write_is_hashed_as_persisted() {
        let ws = Workspace::governed(SPEC);
        let gate = ws.gate();
        let session = SessionId::new("s");
        gate.sessions().select(&session, IntentId::new("INT-001"));

        let action = ActionRequest::new("write_to_file").with_path("src/auth/latin1.ts");
        assert!(gate.pre_check(&session, &action).await.is_allowed());

        let bytes = b"const s = \"caf\xe9\";\n";
        std::fs::create_dir_all(ws.dir.path().join("src/auth")).unwrap();
        std::fs::write(ws.dir.path().join("src/auth/latin1.ts"), bytes).unwrap();

        let record = gate.post_action(&session, &action).await.unwrap();
        let persisted = ContentHash::compute_with(gate.config().hash_algorithm, bytes);
        assert_eq!(record.files[0].ranges[0].content_hash, persisted);

        let path = WorkspacePath::parse("src/auth/latin1.ts").unwrap();
        assert_eq!(gate.sessions().observed_hash(&session, &path), Some(persisted));
        assert!(gate.pre_check(&session, &action).await.is_allowed());
    }

    #[test]
    fn relative_root_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let gate = Gate::new("./workspace", GovernanceConfig::new());
        assert!(gate.root().is_absolute());

        let target = cwd.join("workspace/src/lib.rs");
        let path = WorkspacePath::within_root(&target.to_string_lossy(), gate.root()).unwrap();
        assert_eq!(path.to_string(), "src/lib.rs");
    }
}
