//! Error types for the loader pipeline.
//!
//! Loaders never wrap or rename each other's errors; the only translation
//! point is the transport boundary, where `reqwest` failures become
//! [`LoadError::Connectivity`]. Everything else passes through unchanged so
//! callers can match on the original failure kind.

use thiserror::Error;

/// Errors from the persistent store.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("failed to open store: {0}")]
  Open(String),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  /// Persisted data exists but cannot be interpreted.
  #[error("cached data is corrupt: {0}")]
  Corrupt(String),

  /// The store worker has shut down and can no longer accept commands.
  #[error("store worker is gone")]
  Closed,
}

/// Errors surfaced by loaders.
#[derive(Debug, Error)]
pub enum LoadError {
  /// The remote could not be reached. Produced only by the HTTP fetcher and
  /// recovered by the fallback composite when a secondary source exists.
  #[error("could not reach remote: {0}")]
  Connectivity(String),

  /// The transport call nominally succeeded but the payload is unusable:
  /// non-2xx status, empty body, or malformed content.
  #[error("invalid data from remote: {0}")]
  InvalidData(String),

  /// The requested attachment is not in the local store.
  #[error("not cached: {0}")]
  Missing(String),

  /// A store failure on the read path. Write-path store failures inside the
  /// caching decorator are logged and swallowed instead.
  #[error(transparent)]
  Store(#[from] StoreError),
}
