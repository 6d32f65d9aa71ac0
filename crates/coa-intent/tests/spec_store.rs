//! Specification store against files on disk

use coa_intent::{ApprovalList, IntentId, IntentStatus, SpecError, SpecStore};

const SPEC: &str = "\
# Active intents
- id: \"INT-001\"
  name: JWT authentication   # trailing comment
  status: in-progress
  owned_scope:
    - 'src/auth/**'
  constraints:
    - Keep the public API stable
- id: INT-002
  owned_scope: [build/**, \"scripts/*.sh\"]
  acceptance_criteria:
    - build directory is empty
  garbage line without a colon
";

#[tokio::test]
async fn store_sees_edits_between_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("active_intents.yaml");
    let store = SpecStore::new(&path);

    assert!(matches!(store.try_load().await, Err(SpecError::NotFound(_))));
    assert!(store.load().await.is_empty());

    std::fs::write(&path, SPEC).unwrap();
    let spec = store.load().await;
    assert_eq!(spec.len(), 2);

    let auth = store.lookup(&IntentId::new("INT-001")).await.unwrap();
    assert_eq!(auth.name.as_deref(), Some("JWT authentication"));
    assert_eq!(auth.status, Some(IntentStatus::InProgress));
    assert_eq!(auth.owned_scope.patterns(), &["src/auth/**"]);
    assert_eq!(auth.constraints, vec!["Keep the public API stable"]);

    let build = spec.get(&IntentId::new("INT-002")).unwrap();
    assert_eq!(build.owned_scope.patterns(), &["build/**", "scripts/*.sh"]);
    assert_eq!(build.acceptance_criteria, vec!["build directory is empty"]);

    std::fs::write(&path, "- id: INT-003\n").unwrap();
    assert!(store.lookup(&IntentId::new("INT-001")).await.is_none());
    assert!(store.lookup(&IntentId::new("INT-003")).await.is_some());
}

#[tokio::test]
async fn approval_list_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("approval_required.txt");
    std::fs::write(&path, "INT-002\n# INT-001\n").unwrap();

    let list = ApprovalList::load(&path).await;
    assert!(list.requires_approval(&IntentId::new("INT-002")));
    assert!(!list.requires_approval(&IntentId::new("INT-001")));
}
