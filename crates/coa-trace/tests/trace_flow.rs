//! End-to-end: classify a change, append it, read it back, update the map

use coa_artifact::{ContentHash, WorkspacePath};
use coa_intent::IntentId;
use coa_trace::{
    FileTrace, HeuristicClassifier, LedgerReader, LedgerWriter, LineRange, MapUpdate,
    MutationClass, MutationClassifier, SpatialMap, TraceRecord,
};
use pretty_assertions::assert_eq;

const BEFORE: &str = "export function verify(token: string) {\n  return decode(token);\n}\n";
const AFTER: &str = "export function verify(token: string) {\n  return decode(token);\n}\n\nexport function refresh(token: string) {\n  const claims = verify(token);\n  return sign(claims);\n}\n";

#[tokio::test]
async fn behavioral_change_is_traced_and_mapped() {
    let dir = tempfile::tempdir().unwrap();
    let orchestration = dir.path().join(".orchestration");
    std::fs::create_dir_all(&orchestration).unwrap();

    let class = HeuristicClassifier::new().classify(Some(BEFORE), AFTER);
    assert_eq!(class, MutationClass::BehavioralChange);

    let intent = IntentId::new("INT-001");
    let range = LineRange::affected(Some(BEFORE), AFTER, ContentHash::compute(AFTER.as_bytes()));
    assert_eq!((range.start_line, range.end_line), (4, 8));

    let record = TraceRecord::new()
        .with_session("task-1")
        .with_tool("write_to_file")
        .with_revision(Some("deadbeef".to_string()))
        .with_file(
            FileTrace::new(WorkspacePath::parse("src/auth/jwt.ts").unwrap(), range, class)
                .with_intent(Some(intent.clone())),
        );

    let ledger = orchestration.join("agent_trace.jsonl");
    LedgerWriter::new(&ledger).append(&record).await.unwrap();

    let recent = LedgerReader::new(&ledger)
        .recent_for_intent(&intent, 5)
        .await
        .unwrap();
    assert_eq!(recent, vec![record]);

    let map = SpatialMap::new(orchestration.join("intent_map.md"));
    assert_eq!(
        map.record(&intent, Some("JWT"), "src/auth/jwt.ts").await.unwrap(),
        MapUpdate::Updated
    );
    assert_eq!(
        map.record(&intent, Some("JWT"), "src/auth/jwt.ts").await.unwrap(),
        MapUpdate::Unchanged
    );
    let text = std::fs::read_to_string(map.path()).unwrap();
    assert!(text.contains("| INT-001 | JWT | `src/auth/jwt.ts` |"));
}

#[tokio::test]
async fn concurrent_appends_keep_whole_lines() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = dir.path().join("agent_trace.jsonl");
    let writer = LedgerWriter::new(&ledger);

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let writer = writer.clone();
            tokio::spawn(async move {
                let content = format!("line {i}\n");
                let record = TraceRecord::new().with_file(
                    FileTrace::new(
                        WorkspacePath::parse(&format!("f{i}.rs")).unwrap(),
                        LineRange::affected(None, &content, ContentHash::compute(content.as_bytes())),
                        MutationClass::BehavioralChange,
                    )
                    .with_intent(Some(IntentId::new("INT-001"))),
                );
                writer.append(&record).await.unwrap();
            })
        })
        .collect();
    for t in tasks {
        t.await.unwrap();
    }

    let records = LedgerReader::new(&ledger).records().await.unwrap();
    assert_eq!(records.len(), 16);
}
