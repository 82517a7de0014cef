//! SQLite storage backend.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use url::Url;

use super::{CachedSnapshot, LocalItem, Store};
use crate::error::StoreError;

/// Schema for the snapshot and attachment tables.
const SCHEMA: &str = r#"
-- Single-row snapshot metadata
CREATE TABLE IF NOT EXISTS snapshot_meta (
    id INTEGER PRIMARY KEY CHECK (id = 0),
    cached_at TEXT NOT NULL
);

-- Snapshot items in order (serialized JSON)
CREATE TABLE IF NOT EXISTS snapshot_items (
    position INTEGER PRIMARY KEY,
    data BLOB NOT NULL
);

-- Per-locator attachment blobs, independent of the snapshot lifecycle
CREATE TABLE IF NOT EXISTS attachments (
    url_hash TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Durable storage backed by a SQLite database.
pub struct SqliteStore {
  conn: Connection,
}

impl SqliteStore {
  /// Open or create the database at the default location.
  pub fn open() -> Result<Self, StoreError> {
    Self::open_at(&Self::default_path()?)
  }

  /// Open or create the database at an explicit path.
  pub fn open_at(path: &Path) -> Result<Self, StoreError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)
      .map_err(|e| StoreError::Open(format!("{}: {}", path.display(), e)))?;
    conn.execute_batch(SCHEMA)?;

    Ok(Self { conn })
  }

  /// Default database path under the platform data directory.
  fn default_path() -> Result<PathBuf, StoreError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| StoreError::Open("could not determine data directory".to_string()))?;

    Ok(data_dir.join("feedcache").join("cache.db"))
  }
}

/// Stable, fixed-length key for an attachment locator.
fn attachment_key(url: &Url) -> String {
  let mut hasher = Sha256::new();
  hasher.update(url.as_str().as_bytes());
  hex::encode(hasher.finalize())
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, StoreError> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{}': {}", s, e)))
}

impl Store for SqliteStore {
  fn retrieve(&mut self) -> Result<Option<CachedSnapshot>, StoreError> {
    let cached_at: Option<String> = self
      .conn
      .query_row("SELECT cached_at FROM snapshot_meta WHERE id = 0", [], |row| {
        row.get(0)
      })
      .optional()?;

    let cached_at = match cached_at {
      Some(s) => s,
      None => return Ok(None),
    };
    let timestamp = parse_timestamp(&cached_at)?;

    let mut stmt = self
      .conn
      .prepare("SELECT data FROM snapshot_items ORDER BY position")?;
    let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

    let mut items = Vec::new();
    for row in rows {
      let data = row?;
      items.push(serde_json::from_slice::<LocalItem>(&data)?);
    }

    Ok(Some(CachedSnapshot { items, timestamp }))
  }

  fn insert(&mut self, items: Vec<LocalItem>, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
    let tx = self.conn.transaction()?;

    tx.execute("DELETE FROM snapshot_items", [])?;
    for (position, item) in items.iter().enumerate() {
      let data = serde_json::to_vec(item)?;
      tx.execute(
        "INSERT INTO snapshot_items (position, data) VALUES (?, ?)",
        params![position as i64, data],
      )?;
    }
    tx.execute(
      "INSERT OR REPLACE INTO snapshot_meta (id, cached_at) VALUES (0, ?)",
      params![timestamp.to_rfc3339()],
    )?;

    tx.commit()?;
    Ok(())
  }

  fn delete(&mut self) -> Result<(), StoreError> {
    let tx = self.conn.transaction()?;
    tx.execute("DELETE FROM snapshot_items", [])?;
    tx.execute("DELETE FROM snapshot_meta", [])?;
    tx.commit()?;
    Ok(())
  }

  fn retrieve_attachment(&mut self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    let data: Option<Vec<u8>> = self
      .conn
      .query_row(
        "SELECT data FROM attachments WHERE url_hash = ?",
        params![attachment_key(url)],
        |row| row.get(0),
      )
      .optional()?;

    Ok(data)
  }

  fn insert_attachment(&mut self, data: Vec<u8>, url: &Url) -> Result<(), StoreError> {
    self.conn.execute(
      "INSERT OR REPLACE INTO attachments (url_hash, url, data, cached_at)
       VALUES (?, ?, ?, datetime('now'))",
      params![attachment_key(url), url.as_str(), data],
    )?;

    Ok(())
  }
}
