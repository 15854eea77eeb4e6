//! Behavioural tests for `MemoryStore`.

use exam_core::{
  audit::{AuditEntry, OperationKind},
  change::FieldChanges,
  record::{ExamRecord, ExamRow},
  store::ExamStore,
  subject::Subject,
};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::{Error, MemoryStore};

fn record(candidate_id: i64, year: i32) -> ExamRecord {
  let mut r = ExamRecord::new(candidate_id, year);
  r.scores.set(Subject::Math, Some(7.5));
  r.scores.set(Subject::Literature, Some(6.0));
  r.scores.set(Subject::ForeignLanguage, Some(8.2));
  r.province_code = Some(2);
  r
}

fn store() -> MemoryStore {
  MemoryStore::in_memory(vec![
    ExamRow::from(record(1000001, 2018)),
    ExamRow::from(record(1000001, 2019)),
  ])
}

fn changes(v: Value) -> FieldChanges { v.as_object().cloned().unwrap() }

async fn operations(s: &MemoryStore) -> Vec<OperationKind> {
  s.history().await.unwrap().into_iter().map(|e| e.operation).collect()
}

// ─── Loading ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_skips_incomplete_and_duplicate_rows() {
  let rows = vec![
    ExamRow::from(record(1, 2018)),
    ExamRow { candidate_id: Some(2), ..Default::default() },
    ExamRow::from(record(1, 2018)),
    ExamRow::from(record(1, 2019)),
  ];
  let s = MemoryStore::in_memory(rows);
  assert_eq!(s.len().await, 2);
  assert!(s.history().await.unwrap().is_empty());
}

// ─── Insert / read ───────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_then_read_returns_the_row() {
  let s = MemoryStore::in_memory(Vec::new());
  let r = record(2000001, 2019);
  s.insert(r.clone()).await.unwrap();

  let found = s.read_by_candidate(2000001).await.unwrap();
  assert_eq!(found, vec![r]);
  assert_eq!(operations(&s).await, [OperationKind::Create, OperationKind::Read]);

  let history = s.history().await.unwrap();
  assert_eq!(history[0].payload.as_ref().unwrap()["Toan"], 7.5);
  assert_eq!(history[1].subject_id, Some(2000001));
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
  let s = store();
  let err = s.insert(record(1000001, 2019)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(exam_core::Error::DuplicateKey { candidate_id: 1000001, year: 2019 })
  ));
  assert_eq!(s.len().await, 2);
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn read_returns_every_year_of_a_candidate() {
  let s = store();
  let found = s.find_by_candidate(1000001).await.unwrap();
  assert_eq!(found.len(), 2);
  assert_eq!(found[0].year, 2018);
  assert_eq!(found[1].year, 2019);
}

#[tokio::test]
async fn empty_read_is_not_found_only_at_the_boundary() {
  let s = store();
  assert!(s.find_by_candidate(42).await.unwrap().is_empty());
  let err = s.read_by_candidate(42).await.unwrap_err();
  assert!(matches!(err, Error::Core(exam_core::Error::CandidateNotFound(42))));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_exactly_one_row() {
  let s = store();
  let removed = s.delete(1000001, 2018).await.unwrap();
  assert_eq!(removed, record(1000001, 2018));
  assert_eq!(s.records().await.unwrap(), vec![record(1000001, 2019)]);

  let history = s.history().await.unwrap();
  assert_eq!(history[0].operation, OperationKind::Delete);
  assert_eq!(history[0].payload.as_ref().unwrap()["Year"], 2018);

  // The key is free again.
  s.insert(record(1000001, 2018)).await.unwrap();
}

#[tokio::test]
async fn delete_missing_row_leaves_store_unchanged() {
  let s = store();
  let err = s.delete(1000001, 2020).await.unwrap_err();
  assert!(matches!(err, Error::Core(exam_core::Error::NotFound { .. })));
  assert_eq!(s.len().await, 2);
  assert!(s.history().await.unwrap().is_empty());
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_one_score_keeps_everything_else() {
  let s = store();
  let before = record(1000001, 2019);
  let after = s
    .update(1000001, 2019, changes(json!({ "Toán": 9.25 })))
    .await
    .unwrap();

  let mut expected = before.clone();
  expected.scores.set(Subject::Math, Some(9.25));
  assert_eq!(after, expected);
  assert_eq!(s.records().await.unwrap()[0], record(1000001, 2018));

  let entry = &s.history().await.unwrap()[0];
  assert_eq!(entry.operation, OperationKind::Update);
  let payload = entry.payload.as_ref().unwrap();
  assert_eq!(payload["old"]["Toan"], 7.5);
  assert_eq!(payload["new"]["Toán"], 9.25);
  assert_eq!(payload["SBD"], 1000001);
}

#[tokio::test]
async fn failed_update_applies_nothing() {
  let s = store();
  let err = s
    .update(1000001, 2019, changes(json!({ "Hoa": 9, "Ly": "x", "Van": null })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(exam_core::Error::InvalidField { .. })));
  assert_eq!(s.records().await.unwrap()[1], record(1000001, 2019));
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_missing_row_is_not_found() {
  let s = store();
  let err = s
    .update(9, 2019, changes(json!({ "Toan": 1 })))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(exam_core::Error::NotFound { .. })));
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_out_of_range_leaves_log_alone() {
  let s = store();
  s.find_by_candidate(1000001).await.unwrap();
  let err = s.remove_history(1).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Core(exam_core::Error::IndexOutOfRange { index: 1, len: 1 })
  ));
  assert_eq!(s.history().await.unwrap().len(), 1);

  let removed = s.remove_history(0).await.unwrap();
  assert_eq!(removed.operation, OperationKind::Read);
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_then_list_is_empty() {
  let s = store();
  s.find_by_candidate(1000001).await.unwrap();
  s.delete(1000001, 2019).await.unwrap();
  s.clear_history().await.unwrap();
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_list_normalises_nan_markers() {
  let s = store();
  s.append_history(
    AuditEntry::now(OperationKind::Clean).with_payload(json!({ "Toan": "NaN", "rows": 3 })),
  )
  .await
  .unwrap();
  let entry = &s.history().await.unwrap()[0];
  assert!(entry.payload.as_ref().unwrap()["Toan"].is_null());
  assert_eq!(entry.payload.as_ref().unwrap()["rows"], 3);
}

// ─── Persistence ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn history_is_written_through_and_restored() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("operation_history.csv");

  let s = MemoryStore::open([ExamRow::from(record(1, 2018))], &path).await;
  s.find_by_candidate(1).await.unwrap();
  s.update(1, 2018, changes(json!({ "GDCD": "7.75" }))).await.unwrap();
  drop(s);

  let text = std::fs::read_to_string(&path).unwrap();
  assert!(text.starts_with("operation,time,subject_id,payload\n"));

  let reopened = MemoryStore::open(Vec::new(), &path).await;
  let history = reopened.history().await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].operation, OperationKind::Read);
  assert_eq!(history[1].payload.as_ref().unwrap()["new"]["GDCD"], "7.75");
}

#[tokio::test]
async fn clear_persists_header_only_snapshot() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("history.csv");
  let s = MemoryStore::open([ExamRow::from(record(1, 2018))], &path).await;
  s.find_by_candidate(1).await.unwrap();
  s.clear_history().await.unwrap();
  assert_eq!(
    std::fs::read_to_string(&path).unwrap(),
    "operation,time,subject_id,payload\n"
  );
}

#[tokio::test]
async fn corrupt_history_file_restores_empty() {
  let dir = TempDir::new().unwrap();
  let path = dir.path().join("history.csv");
  std::fs::write(&path, "not,a,history\n1,2,3\n").unwrap();
  let s = MemoryStore::open(Vec::new(), &path).await;
  assert!(s.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn snapshot_writes_table_and_logs_finish() {
  let dir = TempDir::new().unwrap();
  let out = dir.path().join("out").join("Updated_Data.csv");
  let s = store();

  let text = s.snapshot_to_storage(out.clone()).await.unwrap();
  assert_eq!(std::fs::read_to_string(&out).unwrap(), text);
  assert_eq!(text.lines().count(), 3);
  assert_eq!(s.len().await, 2);

  let entry = &s.history().await.unwrap()[0];
  assert_eq!(entry.operation, OperationKind::Finish);
  assert_eq!(entry.payload.as_ref().unwrap()["file"], out.display().to_string());
}

#[tokio::test]
async fn working_copy_is_written_without_a_log_entry() {
  let dir = TempDir::new().unwrap();
  let out = dir.path().join("Updated_Data.csv");
  let s = store();
  s.delete(1000001, 2018).await.unwrap();

  let text = s.write_table(&out).await.unwrap();
  assert_eq!(std::fs::read_to_string(&out).unwrap(), text);
  assert_eq!(text.lines().count(), 2);
  assert_eq!(operations(&s).await, [OperationKind::Delete]);
}
