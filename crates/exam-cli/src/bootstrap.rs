//! Process start-up: load the table once, rehydrate the history.
//!
//! Each `examctl` invocation is its own process, so the table is carried
//! between invocations in `snapshot_path`: mutating commands rewrite it and
//! start-up prefers it over the remote dataset.

use std::path::Path;

use anyhow::Context as _;
use exam_core::{
  province::ReferenceTable,
  record::{CleanedRecord, ExamRow},
  store::ExamStore,
};
use exam_csv::{Frame, rows_from_frame};
use exam_loader::CacheLoader;
use exam_store_memory::MemoryStore;

use crate::config::AppConfig;

/// Cache key of the primary dataset.
const DATASET_KEY: &str = "raw_data";
/// Cache key of the province reference table.
const REFERENCE_KEY: &str = "province_data";

/// Everything a command needs.
pub struct App {
  pub config: AppConfig,
  pub loader: CacheLoader,
  pub store:  MemoryStore,
}

impl App {
  /// Build the store. A table that cannot be loaded leaves the store empty
  /// rather than aborting start-up; the history is restored either way.
  pub async fn open(config: AppConfig) -> anyhow::Result<Self> {
    let loader = CacheLoader::new(&config.cache_dir, config.cache_ttl(), config.fetch_timeout())
      .context("failed to build cache loader")?;

    let rows = match initial_rows(&config, &loader).await {
      Ok(rows) => rows,
      Err(e) => {
        tracing::warn!("dataset unavailable, starting with an empty store: {e:#}");
        Vec::new()
      }
    };
    let store = MemoryStore::open(rows, &config.history_path).await;
    Ok(Self { config, loader, store })
  }

  /// Rewrite the working copy at `snapshot_path` after a record change.
  pub async fn persist_table(&self) -> anyhow::Result<()> {
    let path = &self.config.snapshot_path;
    self
      .store
      .write_table(path)
      .await
      .with_context(|| format!("failed to write table to {}", path.display()))?;
    Ok(())
  }

  /// The current store contents cleaned against the province reference
  /// table, bounded by `max_provinces`.
  pub async fn cleaned(&self) -> anyhow::Result<(Vec<CleanedRecord>, ReferenceTable)> {
    let reference = self
      .loader
      .load_bounded(REFERENCE_KEY, &self.config.reference_url, self.config.max_provinces)
      .await
      .context("failed to load province reference table")?;
    let rows: Vec<ExamRow> = self.store.records().await?.into_iter().map(ExamRow::from).collect();
    Ok(exam_analytics::clean_against(&rows, &reference)?)
  }
}

async fn initial_rows(config: &AppConfig, loader: &CacheLoader) -> anyhow::Result<Vec<ExamRow>> {
  let frame = if config.resume_from_snapshot && config.snapshot_path.exists() {
    read_snapshot(&config.snapshot_path).await?
  } else {
    loader
      .load(DATASET_KEY, &config.dataset_url)
      .await
      .context("failed to load dataset")?
  };
  Ok(rows_from_frame(&frame)?)
}

async fn read_snapshot(path: &Path) -> anyhow::Result<Frame> {
  tracing::info!("resuming from snapshot {}", path.display());
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read snapshot {}", path.display()))?;
  Ok(Frame::parse(&bytes)?)
}
