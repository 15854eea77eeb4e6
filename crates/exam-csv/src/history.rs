//! Audit log snapshot: one row per entry, columns
//! `operation, time, subject_id, payload`, payload as compact JSON.

use chrono::NaiveDateTime;
use exam_core::audit::{AuditEntry, HISTORY_COLUMNS, OperationKind, TIME_FORMAT};
use serde_json::Value;

use crate::{Error, Frame, Result, is_missing, write_csv};

/// Serialise `entries` in order. An empty log still gets the header row.
pub fn history_to_csv(entries: &[AuditEntry]) -> Result<String> {
  let mut rows = Vec::with_capacity(entries.len());
  for e in entries {
    let payload = match &e.payload {
      Some(v) => serde_json::to_string(v)?,
      None => String::new(),
    };
    rows.push([
      e.operation.as_str().to_owned(),
      e.time.format(TIME_FORMAT).to_string(),
      e.subject_id.map(|id| id.to_string()).unwrap_or_default(),
      payload,
    ]);
  }
  write_csv(HISTORY_COLUMNS, rows.into_iter())
}

/// Parse a log snapshot. Each row decodes independently: a malformed row
/// yields `Err(…)` in its position without aborting the rest.
///
/// Snapshots written with the older `sbd`/`data` column names are accepted.
pub fn history_from_csv(input: &str) -> Result<Vec<Result<AuditEntry>>> {
  let frame = Frame::parse(input.as_bytes())?;
  let op_col = frame.require_column("operation")?;
  let time_col = frame.require_column("time")?;
  let subject_col = frame.column("subject_id").or_else(|| frame.column("sbd"));
  let payload_col = frame.column("payload").or_else(|| frame.column("data"));

  Ok(
    (0..frame.len())
      .map(|row| -> Result<AuditEntry> {
        let op = frame.cell(row, op_col);
        let operation = OperationKind::parse(op).ok_or_else(|| Error::InvalidCell {
          row:    row + 1,
          column: "operation".into(),
          value:  op.to_owned(),
        })?;

        let t = frame.cell(row, time_col);
        let time = NaiveDateTime::parse_from_str(t.trim(), TIME_FORMAT).map_err(|_| {
          Error::InvalidCell {
            row:    row + 1,
            column: "time".into(),
            value:  t.to_owned(),
          }
        })?;

        let subject_id = match subject_col.map(|c| frame.cell(row, c)) {
          Some(cell) if !is_missing(cell) => Some(
            exam_core::change::as_integer(&Value::String(cell.to_owned())).ok_or_else(
              || Error::InvalidCell {
                row:    row + 1,
                column: "subject_id".into(),
                value:  cell.to_owned(),
              },
            )?,
          ),
          _ => None,
        };

        let payload = payload_col
          .map(|c| frame.cell(row, c))
          .filter(|cell| !is_missing(cell))
          .map(decode_payload);

        Ok(AuditEntry { operation, time, subject_id, payload })
      })
      .collect(),
  )
}

/// Decode a persisted payload. Text that looks like a JSON object or array is
/// parsed; anything else, or a failed parse, is kept as the raw string.
pub fn decode_payload(text: &str) -> Value {
  let trimmed = text.trim();
  if trimmed.starts_with('{') || trimmed.starts_with('[') {
    if let Ok(v) = serde_json::from_str(trimmed) {
      return v;
    }
  }
  Value::String(text.to_owned())
}
