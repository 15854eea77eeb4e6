//! Error types for the exam-csv codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("missing column {0:?}")]
  MissingColumn(String),

  #[error("row {row}: invalid {column} value {value:?}")]
  InvalidCell { row: usize, column: String, value: String },

  #[error("csv output is not valid UTF-8")]
  Utf8(#[from] std::string::FromUtf8Error),

  #[error("core error: {0}")]
  Core(#[from] exam_core::Error),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
