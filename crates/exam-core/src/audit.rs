//! Audit log entries.
//!
//! Every store-affecting action appends one [`AuditEntry`]. Entries are kept
//! in insertion order, which is also chronological order.

use std::fmt;

use chrono::{Local, NaiveDateTime, Timelike as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::CandidateId;

/// Timestamp layout used in the persisted log and in API output.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed column schema of the persisted log.
pub const HISTORY_COLUMNS: [&str; 4] = ["operation", "time", "subject_id", "payload"];

// ─── OperationKind ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
  Create,
  Read,
  Delete,
  Update,
  Finish,
  Clean,
}

impl OperationKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Create => "CREATE",
      Self::Read => "READ",
      Self::Delete => "DELETE",
      Self::Update => "UPDATE",
      Self::Finish => "FINISH",
      Self::Clean => "CLEAN",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s.trim() {
      "CREATE" => Some(Self::Create),
      "READ" => Some(Self::Read),
      "DELETE" => Some(Self::Delete),
      "UPDATE" => Some(Self::Update),
      "FINISH" => Some(Self::Finish),
      "CLEAN" => Some(Self::Clean),
      _ => None,
    }
  }
}

impl fmt::Display for OperationKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

// ─── AuditEntry ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
  pub operation:  OperationKind,
  #[serde(with = "time_format")]
  pub time:       NaiveDateTime,
  /// Candidate the operation concerned, when it addressed a single one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub subject_id: Option<CandidateId>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payload:    Option<Value>,
}

impl AuditEntry {
  /// An entry stamped with the current local time, truncated to seconds.
  pub fn now(operation: OperationKind) -> Self {
    let time = Local::now().naive_local();
    Self {
      operation,
      time: time.with_nanosecond(0).unwrap_or(time),
      subject_id: None,
      payload: None,
    }
  }

  pub fn with_subject(mut self, id: CandidateId) -> Self {
    self.subject_id = Some(id);
    self
  }

  pub fn with_payload(mut self, payload: Value) -> Self {
    self.payload = Some(payload);
    self
  }

  /// A copy safe for external consumers: not-a-number markers anywhere inside
  /// the payload become `null`.
  pub fn normalized(&self) -> Self {
    Self {
      payload: self.payload.clone().map(normalize_missing),
      ..self.clone()
    }
  }
}

/// Replace textual not-a-number markers (as written by dataframe tooling) with
/// `null`, recursively.
pub fn normalize_missing(value: Value) -> Value {
  match value {
    Value::String(s) if is_nan_marker(&s) => Value::Null,
    Value::Array(items) => {
      Value::Array(items.into_iter().map(normalize_missing).collect())
    }
    Value::Object(map) => Value::Object(
      map
        .into_iter()
        .map(|(k, v)| (k, normalize_missing(v)))
        .collect(),
    ),
    other => other,
  }
}

fn is_nan_marker(s: &str) -> bool {
  matches!(s.trim(), "NaN" | "nan" | "NAN" | "<NA>")
}

mod time_format {
  use chrono::NaiveDateTime;
  use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

  use super::TIME_FORMAT;

  pub fn serialize<S: Serializer>(
    t: &NaiveDateTime,
    serializer: S,
  ) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&t.format(TIME_FORMAT))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    deserializer: D,
  ) -> Result<NaiveDateTime, D::Error> {
    let s = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&s, TIME_FORMAT).map_err(D::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn normalize_replaces_nested_nan_markers() {
    let v = json!({
      "old": { "Toan": "NaN", "Van": 7.5 },
      "new": { "Toan": "8" },
      "list": ["nan", 1]
    });
    let n = normalize_missing(v);
    assert!(n["old"]["Toan"].is_null());
    assert_eq!(n["old"]["Van"], 7.5);
    assert_eq!(n["new"]["Toan"], "8");
    assert!(n["list"][0].is_null());
  }

  #[test]
  fn entry_serialises_with_fixed_time_format() {
    let time =
      NaiveDateTime::parse_from_str("2024-06-01 08:30:00", TIME_FORMAT).unwrap();
    let entry = AuditEntry {
      operation: OperationKind::Read,
      time,
      subject_id: Some(2000001),
      payload: None,
    };
    let v = serde_json::to_value(&entry).unwrap();
    assert_eq!(v, json!({
      "operation": "READ",
      "time": "2024-06-01 08:30:00",
      "subject_id": 2000001
    }));
    let back: AuditEntry = serde_json::from_value(v).unwrap();
    assert_eq!(back, entry);
  }

  #[test]
  fn operation_kind_parses_its_own_output() {
    for k in [
      OperationKind::Create,
      OperationKind::Read,
      OperationKind::Delete,
      OperationKind::Update,
      OperationKind::Finish,
      OperationKind::Clean,
    ] {
      assert_eq!(OperationKind::parse(k.as_str()), Some(k));
    }
    assert_eq!(OperationKind::parse("PATCH"), None);
  }
}
