//! Error types for `exam-analytics`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The raw or reference table could not be turned into cleaned records.
  #[error("cleaning failed: {0}")]
  Cleaning(#[from] exam_csv::Error),

  #[error("unknown subject group {0:?}; expected one of A, B, C, D")]
  UnknownGroup(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
