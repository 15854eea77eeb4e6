//! Exam records: the rows of the store and of the cleaned analytics table.
//!
//! Three shapes exist:
//!
//! - [`ExamRow`]: a row exactly as read from a dataset file, every field
//!   optional.
//! - [`ExamRecord`]: a row owned by the store, identity key always present.
//! - [`CleanedRecord`]: a row after cleaning, every score populated and the
//!   [`MISSING_SCORE`] sentinel standing in for absent ones.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer, ser::SerializeMap};

use crate::subject::{SUBJECT_COUNT, Subject};

pub type CandidateId = i64;
pub type Year = i32;

/// Years retained by the cleaner.
pub const ACCEPTED_YEARS: [Year; 2] = [2018, 2019];

/// Sentinel used by cleaned data for "no score". Distinct from `0.0`, which is
/// a real (low) score.
pub const MISSING_SCORE: f64 = -1.0;

// ─── Scores ──────────────────────────────────────────────────────────────────

/// One optional score per subject, indexed by [`Subject`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scores([Option<f64>; SUBJECT_COUNT]);

impl Scores {
  pub fn get(&self, subject: Subject) -> Option<f64> { self.0[subject.index()] }

  pub fn set(&mut self, subject: Subject, value: Option<f64>) {
    self.0[subject.index()] = value;
  }

  /// Builder-style [`Scores::set`].
  pub fn with(mut self, subject: Subject, value: f64) -> Self {
    self.set(subject, Some(value));
    self
  }

  pub fn iter(&self) -> impl Iterator<Item = (Subject, Option<f64>)> + '_ {
    Subject::ALL.into_iter().map(|s| (s, self.get(s)))
  }
}

/// Serialised as a flat `{column: score | null}` map so it can be flattened
/// into record payloads.
impl Serialize for Scores {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(SUBJECT_COUNT))?;
    for (subject, value) in self.iter() {
      map.serialize_entry(subject.column(), &value.filter(|v| v.is_finite()))?;
    }
    map.end()
  }
}

// ─── ExamRow ─────────────────────────────────────────────────────────────────

/// A dataset row before any validation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExamRow {
  pub candidate_id:  Option<CandidateId>,
  pub year:          Option<Year>,
  pub scores:        Scores,
  pub province_code: Option<u32>,
}

impl ExamRow {
  /// Promote to a store record; `None` if either identity field is missing.
  pub fn into_record(self) -> Option<ExamRecord> {
    Some(ExamRecord {
      candidate_id:  self.candidate_id?,
      year:          self.year?,
      scores:        self.scores,
      province_code: self.province_code,
    })
  }
}

impl From<ExamRecord> for ExamRow {
  fn from(r: ExamRecord) -> Self {
    ExamRow {
      candidate_id:  Some(r.candidate_id),
      year:          Some(r.year),
      scores:        r.scores,
      province_code: r.province_code,
    }
  }
}

// ─── ExamRecord ──────────────────────────────────────────────────────────────

/// A record owned by the store. `(candidate_id, year)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExamRecord {
  #[serde(rename = "SBD")]
  pub candidate_id:  CandidateId,
  #[serde(rename = "Year")]
  pub year:          Year,
  #[serde(flatten)]
  pub scores:        Scores,
  #[serde(rename = "MaTinh")]
  pub province_code: Option<u32>,
}

impl ExamRecord {
  /// A record with no scores and no province.
  pub fn new(candidate_id: CandidateId, year: Year) -> Self {
    Self {
      candidate_id,
      year,
      scores: Scores::default(),
      province_code: None,
    }
  }

  pub fn key(&self) -> (CandidateId, Year) { (self.candidate_id, self.year) }

  pub fn matches(&self, candidate_id: CandidateId, year: Year) -> bool {
    self.candidate_id == candidate_id && self.year == year
  }
}

// ─── CleanedRecord ───────────────────────────────────────────────────────────

/// A record after cleaning: joined with its province, every score populated.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
  pub candidate_id:  CandidateId,
  pub year:          Year,
  pub province_code: u32,
  /// Indexed by [`Subject::index`]; [`MISSING_SCORE`] marks absent scores.
  pub scores:        [f64; SUBJECT_COUNT],
  /// Reference attributes of the province; `None` when the code had no match.
  pub province:      Option<BTreeMap<String, String>>,
}

impl CleanedRecord {
  /// The stored value, sentinel included.
  pub fn score(&self, subject: Subject) -> f64 { self.scores[subject.index()] }

  /// The score if it is a real one, `None` for the sentinel.
  pub fn valid_score(&self, subject: Subject) -> Option<f64> {
    let v = self.score(subject);
    (v != MISSING_SCORE).then_some(v)
  }
}

impl Serialize for CleanedRecord {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let extra = self.province.as_ref().map_or(0, BTreeMap::len);
    let mut map = serializer.serialize_map(Some(3 + SUBJECT_COUNT + extra))?;
    map.serialize_entry("SBD", &self.candidate_id)?;
    map.serialize_entry("Year", &self.year)?;
    for subject in Subject::ALL {
      map.serialize_entry(subject.column(), &self.score(subject))?;
    }
    map.serialize_entry("MaTinh", &self.province_code)?;
    if let Some(attrs) = &self.province {
      for (k, v) in attrs {
        map.serialize_entry(k, v)?;
      }
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn row_without_year_is_not_a_record() {
    let row = ExamRow { candidate_id: Some(1), ..Default::default() };
    assert!(row.into_record().is_none());
  }

  #[test]
  fn record_serialises_flat() {
    let mut r = ExamRecord::new(2000001, 2019);
    r.scores.set(Subject::Math, Some(8.25));
    r.province_code = Some(2);
    let v = serde_json::to_value(&r).unwrap();
    assert_eq!(v["SBD"], 2000001);
    assert_eq!(v["Toan"], 8.25);
    assert!(v["Van"].is_null());
    assert_eq!(v["MaTinh"], 2);
  }

  #[test]
  fn sentinel_is_not_a_valid_score() {
    let mut scores = [MISSING_SCORE; SUBJECT_COUNT];
    scores[Subject::Math.index()] = 0.0;
    let r = CleanedRecord {
      candidate_id: 1,
      year: 2018,
      province_code: 2,
      scores,
      province: None,
    };
    assert_eq!(r.valid_score(Subject::Math), Some(0.0));
    assert_eq!(r.valid_score(Subject::Literature), None);
  }
}
