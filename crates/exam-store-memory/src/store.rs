//! [`MemoryStore`], the in-memory implementation of [`ExamStore`].

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
  sync::Arc,
};

use serde_json::json;
use tokio::sync::Mutex;

use exam_core::{
  audit::{AuditEntry, OperationKind},
  change::{FieldChanges, apply_changes, unknown_fields},
  record::{CandidateId, ExamRecord, ExamRow, Year},
  store::ExamStore,
};
use exam_csv::records_to_csv;

use crate::{AuditLog, Result};

// ─── State ───────────────────────────────────────────────────────────────────

/// Table and log, guarded together.
#[derive(Debug)]
struct State {
  table: Vec<ExamRecord>,
  keys:  HashSet<(CandidateId, Year)>,
  log:   AuditLog,
}

impl State {
  fn position(&self, candidate_id: CandidateId, year: Year) -> Option<usize> {
    if !self.keys.contains(&(candidate_id, year)) {
      return None;
    }
    self.table.iter().position(|r| r.matches(candidate_id, year))
  }

  /// Append `entry` and write the log through. A write failure is reported
  /// but leaves the in-memory change in place.
  async fn commit(&mut self, entry: AuditEntry) {
    let op = entry.operation;
    self.log.append(entry);
    if let Err(e) = self.log.persist().await {
      tracing::error!("failed to persist history after {op}: {e}");
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// The exam record store.
///
/// Cloning is cheap; clones share the same table and log.
#[derive(Clone)]
pub struct MemoryStore {
  state: Arc<Mutex<State>>,
}

impl MemoryStore {
  /// Build a store from dataset rows and rehydrate the history at
  /// `history_path`.
  pub async fn open(
    rows: impl IntoIterator<Item = ExamRow>,
    history_path: impl Into<PathBuf>,
  ) -> Self {
    let log = AuditLog::restore(history_path).await;
    Self::with_log(rows, log)
  }

  /// A store whose history is never written to disk. Useful for testing.
  pub fn in_memory(rows: impl IntoIterator<Item = ExamRow>) -> Self {
    Self::with_log(rows, AuditLog::in_memory())
  }

  fn with_log(rows: impl IntoIterator<Item = ExamRow>, log: AuditLog) -> Self {
    let (table, keys) = load_table(rows);
    Self { state: Arc::new(Mutex::new(State { table, keys, log })) }
  }

  /// Number of records currently held.
  pub async fn len(&self) -> usize { self.state.lock().await.table.len() }

  pub async fn is_empty(&self) -> bool { self.len().await == 0 }

  /// Write the table to `path` without logging. Used to keep a working copy
  /// on disk between processes; [`ExamStore::snapshot_to_storage`] is the
  /// logged variant.
  pub async fn write_table(&self, path: &Path) -> Result<String> {
    let state = self.state.lock().await;
    write_records(&state.table, path).await
  }
}

async fn write_records(table: &[ExamRecord], path: &Path) -> Result<String> {
  let text = records_to_csv(table)?;
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent).await?;
  }
  tokio::fs::write(path, &text).await?;
  Ok(text)
}

/// Promote rows to records, dropping rows without an identity key and later
/// duplicates of a key already seen.
fn load_table(
  rows: impl IntoIterator<Item = ExamRow>,
) -> (Vec<ExamRecord>, HashSet<(CandidateId, Year)>) {
  let mut table = Vec::new();
  let mut keys = HashSet::new();
  let (mut incomplete, mut duplicate) = (0usize, 0usize);

  for row in rows {
    let Some(record) = row.into_record() else {
      incomplete += 1;
      continue;
    };
    if !keys.insert(record.key()) {
      duplicate += 1;
      continue;
    }
    table.push(record);
  }

  if incomplete > 0 {
    tracing::warn!("skipped {incomplete} rows without a candidate number or year");
  }
  if duplicate > 0 {
    tracing::warn!("skipped {duplicate} rows repeating an existing (candidate, year) key");
  }
  tracing::info!("store loaded with {} records", table.len());
  (table, keys)
}

// ─── ExamStore impl ──────────────────────────────────────────────────────────

impl ExamStore for MemoryStore {
  type Error = crate::Error;

  // ── Records ───────────────────────────────────────────────────────────────

  async fn insert(&self, record: ExamRecord) -> Result<()> {
    let mut state = self.state.lock().await;
    let (candidate_id, year) = record.key();
    if state.keys.contains(&(candidate_id, year)) {
      return Err(exam_core::Error::DuplicateKey { candidate_id, year }.into());
    }

    let payload = serde_json::to_value(&record)?;
    state.keys.insert((candidate_id, year));
    state.table.push(record);
    tracing::debug!(candidate_id, year, "inserted record");

    state
      .commit(
        AuditEntry::now(OperationKind::Create)
          .with_subject(candidate_id)
          .with_payload(payload),
      )
      .await;
    Ok(())
  }

  async fn find_by_candidate(&self, candidate_id: CandidateId) -> Result<Vec<ExamRecord>> {
    let mut state = self.state.lock().await;
    let found: Vec<ExamRecord> = state
      .table
      .iter()
      .filter(|r| r.candidate_id == candidate_id)
      .cloned()
      .collect();
    tracing::debug!(candidate_id, rows = found.len(), "read candidate");

    state
      .commit(AuditEntry::now(OperationKind::Read).with_subject(candidate_id))
      .await;
    Ok(found)
  }

  async fn delete(&self, candidate_id: CandidateId, year: Year) -> Result<ExamRecord> {
    let mut state = self.state.lock().await;
    let idx = state
      .position(candidate_id, year)
      .ok_or(exam_core::Error::NotFound { candidate_id, year })?;

    let removed = state.table.remove(idx);
    state.keys.remove(&(candidate_id, year));
    tracing::debug!(candidate_id, year, "deleted record");

    let payload = serde_json::to_value(&removed)?;
    state
      .commit(
        AuditEntry::now(OperationKind::Delete)
          .with_subject(candidate_id)
          .with_payload(payload),
      )
      .await;
    Ok(removed)
  }

  async fn update(
    &self,
    candidate_id: CandidateId,
    year: Year,
    changes: FieldChanges,
  ) -> Result<ExamRecord> {
    let mut state = self.state.lock().await;
    let idx = state
      .position(candidate_id, year)
      .ok_or(exam_core::Error::NotFound { candidate_id, year })?;

    let old = state.table[idx].clone();
    let updated = apply_changes(&old, &changes)?;
    let ignored = unknown_fields(&changes);
    if !ignored.is_empty() {
      tracing::debug!(?ignored, "ignoring unknown update fields");
    }

    let payload = json!({
      "old":  serde_json::to_value(&old)?,
      "new":  changes,
      "SBD":  candidate_id,
      "Year": year,
    });
    state.table[idx] = updated.clone();
    tracing::debug!(candidate_id, year, "updated record");

    state
      .commit(
        AuditEntry::now(OperationKind::Update)
          .with_subject(candidate_id)
          .with_payload(payload),
      )
      .await;
    Ok(updated)
  }

  async fn records(&self) -> Result<Vec<ExamRecord>> {
    Ok(self.state.lock().await.table.clone())
  }

  async fn snapshot_to_storage(&self, path: PathBuf) -> Result<String> {
    let mut state = self.state.lock().await;
    let text = write_records(&state.table, &path).await?;
    tracing::info!("saved {} records to {}", state.table.len(), path.display());

    state
      .commit(
        AuditEntry::now(OperationKind::Finish)
          .with_payload(json!({ "file": path.display().to_string() })),
      )
      .await;
    Ok(text)
  }

  // ── History ───────────────────────────────────────────────────────────────

  async fn append_history(&self, entry: AuditEntry) -> Result<()> {
    self.state.lock().await.commit(entry).await;
    Ok(())
  }

  async fn history(&self) -> Result<Vec<AuditEntry>> {
    Ok(self.state.lock().await.log.list())
  }

  async fn remove_history(&self, index: usize) -> Result<AuditEntry> {
    let mut state = self.state.lock().await;
    let removed = state.log.remove_at(index)?;
    state.log.persist().await?;
    Ok(removed)
  }

  async fn clear_history(&self) -> Result<()> {
    let mut state = self.state.lock().await;
    state.log.clear();
    state.log.persist().await?;
    tracing::info!("history cleared");
    Ok(())
  }
}
