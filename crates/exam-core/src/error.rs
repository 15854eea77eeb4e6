//! Error types for `exam-core`.

use thiserror::Error;

use crate::record::{CandidateId, Year};

#[derive(Debug, Error)]
pub enum Error {
  #[error("candidate {candidate_id} already exists for year {year}")]
  DuplicateKey { candidate_id: CandidateId, year: Year },

  #[error("no record for candidate {candidate_id} in year {year}")]
  NotFound { candidate_id: CandidateId, year: Year },

  #[error("no records for candidate {0}")]
  CandidateNotFound(CandidateId),

  #[error("invalid value for field {field}: {reason}")]
  InvalidField { field: String, reason: String },

  #[error("history index {index} out of range (length {len})")]
  IndexOutOfRange { index: usize, len: usize },

  #[error("unknown subject: {0:?}")]
  UnknownSubject(String),

  #[error("province code {0} appears more than once in the reference table")]
  DuplicateProvince(u32),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
