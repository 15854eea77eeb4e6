//! The `ExamStore` trait: record operations and the audit log they write to.
//!
//! `exam-store-memory` provides the one backend. Callers hold the store by
//! this trait so the log-per-mutation contract is stated in one place.

use std::{future::Future, path::PathBuf};

use crate::{
  Error,
  audit::AuditEntry,
  change::FieldChanges,
  record::{CandidateId, ExamRecord, Year},
};

/// Abstraction over the record store and its audit log.
///
/// Every mutating operation appends exactly one [`AuditEntry`]; the record
/// change and the log append happen under the same lock. A failure to persist
/// the log afterwards is reported through `tracing` and does not undo the
/// record change.
pub trait ExamStore: Send + Sync {
  type Error: std::error::Error + From<Error> + Send + Sync + 'static;

  // ── Records ───────────────────────────────────────────────────────────

  /// Append a new record. Fails with [`Error::DuplicateKey`] if
  /// `(candidate_id, year)` is already present. Logs `CREATE`.
  fn insert(
    &self,
    record: ExamRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All records of a candidate, any year, in table order. An empty result
  /// is not an error here. Logs `READ` with the candidate id.
  fn find_by_candidate(
    &self,
    candidate_id: CandidateId,
  ) -> impl Future<Output = Result<Vec<ExamRecord>, Self::Error>> + Send + '_;

  /// Like [`ExamStore::find_by_candidate`] but an empty result is
  /// [`Error::CandidateNotFound`].
  fn read_by_candidate(
    &self,
    candidate_id: CandidateId,
  ) -> impl Future<Output = Result<Vec<ExamRecord>, Self::Error>> + Send + '_
  {
    async move {
      let records = self.find_by_candidate(candidate_id).await?;
      if records.is_empty() {
        return Err(Error::CandidateNotFound(candidate_id).into());
      }
      Ok(records)
    }
  }

  /// Remove exactly the record keyed by `(candidate_id, year)` and return it.
  /// Logs `DELETE` with the pre-deletion snapshot.
  fn delete(
    &self,
    candidate_id: CandidateId,
    year: Year,
  ) -> impl Future<Output = Result<ExamRecord, Self::Error>> + Send + '_;

  /// Apply `changes` to the record keyed by `(candidate_id, year)` and return
  /// the updated record. All fields are validated before any is applied.
  /// Logs `UPDATE` with the old snapshot and the requested changes.
  fn update(
    &self,
    candidate_id: CandidateId,
    year: Year,
    changes: FieldChanges,
  ) -> impl Future<Output = Result<ExamRecord, Self::Error>> + Send + '_;

  /// A copy of the whole table, in table order. Not logged.
  fn records(
    &self,
  ) -> impl Future<Output = Result<Vec<ExamRecord>, Self::Error>> + Send + '_;

  /// Write the table to `path` as delimited text and return that text.
  /// Logs `FINISH`. The in-memory table is kept.
  fn snapshot_to_storage(
    &self,
    path: PathBuf,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + '_;

  // ── History ───────────────────────────────────────────────────────────

  /// Append an entry produced outside the record operations (e.g. `CLEAN`).
  fn append_history(
    &self,
    entry: AuditEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// All entries in insertion order, normalised for external consumers.
  fn history(
    &self,
  ) -> impl Future<Output = Result<Vec<AuditEntry>, Self::Error>> + Send + '_;

  /// Remove the entry at `index` and re-persist the log. Fails with
  /// [`Error::IndexOutOfRange`] without touching the log.
  fn remove_history(
    &self,
    index: usize,
  ) -> impl Future<Output = Result<AuditEntry, Self::Error>> + Send + '_;

  /// Empty the log and persist an empty snapshot.
  fn clear_history(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
