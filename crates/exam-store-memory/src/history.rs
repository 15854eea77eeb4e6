//! [`AuditLog`]: the append-only operation history.

use std::{io::ErrorKind, path::PathBuf};

use exam_core::audit::AuditEntry;
use exam_csv::{history_from_csv, history_to_csv};

use crate::Result;

/// Ordered list of audit entries, optionally backed by a snapshot file.
#[derive(Debug, Default)]
pub struct AuditLog {
  entries: Vec<AuditEntry>,
  path:    Option<PathBuf>,
}

impl AuditLog {
  /// A log that is never persisted.
  pub fn in_memory() -> Self { Self::default() }

  /// Rehydrate from the snapshot at `path`.
  ///
  /// Never fails: a missing file starts an empty log, an unreadable one is
  /// logged and replaced by an empty log, and malformed rows are skipped.
  pub async fn restore(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let entries = match tokio::fs::read_to_string(&path).await {
      Ok(text) => match history_from_csv(&text) {
        Ok(rows) => {
          let mut entries = Vec::with_capacity(rows.len());
          for (i, row) in rows.into_iter().enumerate() {
            match row {
              Ok(entry) => entries.push(entry),
              Err(e) => tracing::warn!("skipping history row {}: {e}", i + 1),
            }
          }
          tracing::info!("restored {} history entries from {}", entries.len(), path.display());
          entries
        }
        Err(e) => {
          tracing::warn!("history file {} is unreadable, starting empty: {e}", path.display());
          Vec::new()
        }
      },
      Err(e) if e.kind() == ErrorKind::NotFound => {
        tracing::info!("no history file at {}, starting empty", path.display());
        Vec::new()
      }
      Err(e) => {
        tracing::warn!("failed to read history file {}: {e}", path.display());
        Vec::new()
      }
    };
    Self { entries, path: Some(path) }
  }

  pub fn append(&mut self, entry: AuditEntry) { self.entries.push(entry); }

  /// Entries exactly as stored.
  pub fn entries(&self) -> &[AuditEntry] { &self.entries }

  /// Entries normalised for external consumers.
  pub fn list(&self) -> Vec<AuditEntry> {
    self.entries.iter().map(AuditEntry::normalized).collect()
  }

  /// Remove and return the entry at `index`; the log is untouched on error.
  pub fn remove_at(&mut self, index: usize) -> Result<AuditEntry, exam_core::Error> {
    if index >= self.entries.len() {
      return Err(exam_core::Error::IndexOutOfRange { index, len: self.entries.len() });
    }
    Ok(self.entries.remove(index))
  }

  pub fn clear(&mut self) { self.entries.clear(); }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Write the whole log to its snapshot file. A no-op for in-memory logs.
  pub async fn persist(&self) -> Result<()> {
    let Some(path) = &self.path else {
      return Ok(());
    };
    let text = history_to_csv(&self.entries)?;
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, text).await?;
    Ok(())
  }
}
