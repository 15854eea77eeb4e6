//! Runtime configuration: an optional TOML file overlaid by `EXAMS_*`
//! environment variables.

use std::{path::PathBuf, time::Duration};

use anyhow::Context as _;
use serde::Deserialize;

const DEFAULT_DATASET_URL: &str = "https://andyanh.id.vn/index.php/s/p7XMy828G8NKiZp/download";
const DEFAULT_REFERENCE_URL: &str = "https://andyanh.id.vn/index.php/s/zbHTAjksBekNB4M/download";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub dataset_url:          String,
  pub reference_url:        String,
  pub cache_dir:            PathBuf,
  pub cache_ttl_hours:      u64,
  pub fetch_timeout_secs:   u64,
  pub max_provinces:        usize,
  pub history_path:         PathBuf,
  pub snapshot_path:        PathBuf,
  /// Start from `snapshot_path` instead of the remote dataset when it exists.
  /// Mutating commands keep that file current, so turning this off discards
  /// earlier changes in favour of the dataset.
  pub resume_from_snapshot: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      dataset_url:          DEFAULT_DATASET_URL.to_owned(),
      reference_url:        DEFAULT_REFERENCE_URL.to_owned(),
      cache_dir:            PathBuf::from(".cache"),
      cache_ttl_hours:      24,
      fetch_timeout_secs:   30,
      max_provinces:        100,
      history_path:         PathBuf::from("operation_history.csv"),
      snapshot_path:        PathBuf::from("Updated_Data.csv"),
      resume_from_snapshot: true,
    }
  }
}

impl AppConfig {
  /// Read `path` if it exists, then apply `EXAMS_*` overrides.
  pub fn load(path: PathBuf) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EXAMS"))
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise AppConfig")
  }

  pub fn cache_ttl(&self) -> Duration { Duration::from_secs(self.cache_ttl_hours * 60 * 60) }

  pub fn fetch_timeout(&self) -> Duration { Duration::from_secs(self.fetch_timeout_secs) }
}
