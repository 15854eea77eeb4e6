//! Field changes applied by `create`/`update`, and the coercion rules for
//! loosely-typed input values.
//!
//! Changes arrive as a JSON object keyed by field name (column name or display
//! label). [`apply_changes`] validates every field first and only then builds
//! the updated record, so a bad value never leaves a half-applied update.

use serde_json::{Map, Value};

use crate::{
  Error, Result,
  record::{CandidateId, ExamRecord, Year},
  subject::Subject,
};

/// Display text standing for "no score" in form input and read views.
pub const MISSING_MARKER: &str = "Không có";

/// Requested field changes, keyed by field name.
pub type FieldChanges = Map<String, Value>;

/// An addressable record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  CandidateId,
  Year,
  ProvinceCode,
  Score(Subject),
}

impl Field {
  /// Resolve a column name (`SBD`, `Toan`, ...) or display label
  /// (`Số Báo Danh`, `Toán`, ...).
  pub fn from_name(name: &str) -> Option<Self> {
    match name.trim() {
      "SBD" | "Số Báo Danh" => Some(Self::CandidateId),
      "Year" | "Năm" => Some(Self::Year),
      "MaTinh" => Some(Self::ProvinceCode),
      other => Subject::from_name(other).map(Self::Score),
    }
  }
}

/// Validate `changes` against `record` and return the updated copy.
///
/// Unknown field names are skipped. Identity fields may only restate the
/// current key.
pub fn apply_changes(record: &ExamRecord, changes: &FieldChanges) -> Result<ExamRecord> {
  let mut updated = record.clone();
  for (name, value) in changes {
    let Some(field) = Field::from_name(name) else {
      continue;
    };
    match field {
      Field::CandidateId => {
        let id = coerce_integer(name, value)?;
        if id != record.candidate_id {
          return Err(immutable(name));
        }
      }
      Field::Year => {
        let year = coerce_integer(name, value)?;
        if year != i64::from(record.year) {
          return Err(immutable(name));
        }
      }
      Field::ProvinceCode => {
        updated.province_code = coerce_province(name, value)?;
      }
      Field::Score(subject) => {
        updated.scores.set(subject, coerce_score(name, value)?);
      }
    }
  }
  Ok(updated)
}

/// Build a new record from an identity key plus field values.
pub fn new_record(
  candidate_id: CandidateId,
  year: Year,
  fields: &FieldChanges,
) -> Result<ExamRecord> {
  apply_changes(&ExamRecord::new(candidate_id, year), fields)
}

/// Names in `changes` that do not resolve to a [`Field`].
pub fn unknown_fields(changes: &FieldChanges) -> Vec<&str> {
  changes
    .keys()
    .filter(|k| Field::from_name(k).is_none())
    .map(String::as_str)
    .collect()
}

// ─── Coercion ────────────────────────────────────────────────────────────────

/// Numeric coercion for score fields. Null, empty text, the missing marker
/// and not-a-number all clear the score.
pub fn coerce_score(field: &str, value: &Value) -> Result<Option<f64>> {
  let parsed = match value {
    Value::Null => return Ok(None),
    Value::Number(n) => n.as_f64(),
    Value::String(s) => {
      let s = s.trim();
      if s.is_empty() || s == MISSING_MARKER {
        return Ok(None);
      }
      s.parse::<f64>().ok()
    }
    _ => None,
  };
  match parsed {
    Some(v) if v.is_nan() => Ok(None),
    Some(v) if v.is_finite() => Ok(Some(v)),
    _ => Err(invalid(field, format!("{value} is not a number"))),
  }
}

fn coerce_province(field: &str, value: &Value) -> Result<Option<u32>> {
  if is_blank(value) {
    return Ok(None);
  }
  let code = coerce_integer(field, value)?;
  u32::try_from(code)
    .map(Some)
    .map_err(|_| invalid(field, format!("{code} is not a province code")))
}

fn coerce_integer(field: &str, value: &Value) -> Result<i64> {
  if is_blank(value) {
    return Err(invalid(field, "identity fields cannot be cleared".into()));
  }
  as_integer(value).ok_or_else(|| invalid(field, format!("{value} is not an integer")))
}

/// Integers, integral floats (`"2.0"`, as dataframe exports write them), and
/// their textual forms.
pub fn as_integer(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
    Value::String(s) => {
      let s = s.trim();
      s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(integral))
    }
    _ => None,
  }
}

fn integral(f: f64) -> Option<i64> {
  (f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15).then_some(f as i64)
}

fn is_blank(value: &Value) -> bool {
  match value {
    Value::Null => true,
    Value::String(s) => s.trim().is_empty(),
    _ => false,
  }
}

fn invalid(field: &str, reason: String) -> Error {
  Error::InvalidField { field: field.to_owned(), reason }
}

fn immutable(field: &str) -> Error {
  invalid(field, "the identity key of a record cannot change".into())
}
