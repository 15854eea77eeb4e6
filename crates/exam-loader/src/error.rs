//! Error type for `exam-loader`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Transport failure or a non-success status from the remote source.
  #[error("failed to fetch {url}: {reason}")]
  Fetch {
    url:    String,
    status: Option<u16>,
    reason: String,
  },

  /// The fetched or cached data is malformed or implausible.
  #[error("invalid data for {resource}: {reason}")]
  Validation { resource: String, reason: String },

  #[error("failed to build HTTP client: {0}")]
  Client(#[from] reqwest::Error),

  #[error("cache io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("codec error: {0}")]
  Codec(#[from] exam_csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
