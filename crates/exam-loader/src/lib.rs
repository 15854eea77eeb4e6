//! Remote CSV loading with a time-bounded on-disk cache.
//!
//! Every resource is identified by a key; its cached copy lives at
//! `<cache_dir>/<key>.csv`. A copy younger than the TTL is served without
//! touching the network. Anything older is refetched, and a failed refetch is
//! an error: stale data is never returned.

pub mod error;

use std::{
  path::{Path, PathBuf},
  time::{Duration, SystemTime},
};

use exam_csv::Frame;

pub use self::error::{Error, Result};

/// Default freshness window for cached copies.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default bound on a single remote request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches CSV resources over HTTP and keeps a copy of each on disk.
#[derive(Debug, Clone)]
pub struct CacheLoader {
  client:    reqwest::Client,
  cache_dir: PathBuf,
  ttl:       Duration,
}

impl CacheLoader {
  pub fn new(cache_dir: impl Into<PathBuf>, ttl: Duration, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, cache_dir: cache_dir.into(), ttl })
  }

  /// Where the copy of `key` is kept.
  pub fn cache_path(&self, key: &str) -> PathBuf { self.cache_dir.join(format!("{key}.csv")) }

  /// Load the resource `key`, serving the cached copy while it is fresh and
  /// fetching `url` otherwise.
  pub async fn load(&self, key: &str, url: &str) -> Result<Frame> {
    let path = self.cache_path(key);
    if let Some(frame) = self.read_fresh(&path).await? {
      tracing::info!("using cached {key} ({} rows) from {}", frame.len(), path.display());
      return Ok(frame);
    }

    tracing::info!("fetching {key} from {url}");
    let frame = self.fetch(key, url).await?;
    self.store(&path, &frame).await?;
    tracing::info!("cached {key} ({} rows) at {}", frame.len(), path.display());
    Ok(frame)
  }

  /// Like [`load`](Self::load), for a small lookup table that must hold
  /// fewer than `max_rows` rows. An oversized table is treated as corrupt:
  /// its cached copy is discarded so the next load refetches.
  pub async fn load_bounded(&self, key: &str, url: &str, max_rows: usize) -> Result<Frame> {
    let frame = self.load(key, url).await?;
    if frame.len() >= max_rows {
      let path = self.cache_path(key);
      tracing::warn!(
        "{key} has {} rows, expected fewer than {max_rows}; discarding {}",
        frame.len(),
        path.display()
      );
      discard(&path).await?;
      return Err(Error::Validation {
        resource: key.to_owned(),
        reason:   format!("{} rows, expected fewer than {max_rows}", frame.len()),
      });
    }
    Ok(frame)
  }

  /// The cached copy at `path` if it exists, is younger than the TTL and
  /// parses. An unparseable copy counts as stale.
  async fn read_fresh(&self, path: &Path) -> Result<Option<Frame>> {
    let modified = match tokio::fs::metadata(path).await {
      Ok(meta) => meta.modified()?,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
      Err(e) => return Err(e.into()),
    };
    // A timestamp in the future reads as age zero.
    let age = SystemTime::now().duration_since(modified).unwrap_or_default();
    if age >= self.ttl {
      tracing::debug!("cache {} is stale ({}s old)", path.display(), age.as_secs());
      return Ok(None);
    }

    let bytes = tokio::fs::read(path).await?;
    match Frame::parse(&bytes) {
      Ok(frame) => Ok(Some(frame)),
      Err(e) => {
        tracing::warn!("cache {} is unreadable, refetching: {e}", path.display());
        Ok(None)
      }
    }
  }

  async fn fetch(&self, key: &str, url: &str) -> Result<Frame> {
    let fetch_err = |status: Option<u16>, reason: String| Error::Fetch {
      url: url.to_owned(),
      status,
      reason,
    };

    let resp = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|e| fetch_err(None, e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
      let reason = status.canonical_reason().unwrap_or("unexpected status").to_owned();
      return Err(fetch_err(Some(status.as_u16()), reason));
    }

    let body = resp
      .bytes()
      .await
      .map_err(|e| fetch_err(Some(status.as_u16()), e.to_string()))?;

    let frame = Frame::parse(&body).map_err(|e| Error::Validation {
      resource: key.to_owned(),
      reason:   e.to_string(),
    })?;
    if frame.headers().iter().all(String::is_empty) {
      return Err(Error::Validation {
        resource: key.to_owned(),
        reason:   "response has no header row".into(),
      });
    }
    Ok(frame)
  }

  async fn store(&self, path: &Path, frame: &Frame) -> Result<()> {
    tokio::fs::create_dir_all(&self.cache_dir).await?;
    tokio::fs::write(path, frame.to_csv()?).await?;
    Ok(())
  }
}

async fn discard(path: &Path) -> Result<()> {
  match tokio::fs::remove_file(path).await {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}
