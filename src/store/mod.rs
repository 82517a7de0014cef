//! Durable snapshot and attachment persistence.
//!
//! The [`Store`] trait is the narrow contract the pipeline needs from a
//! backend. Backends are never called directly by loaders: every instance is
//! wrapped in a [`StoreHandle`], which drives it from a single worker thread
//! so all operations on one store are serialized in submission order.

mod handle;
mod memory;
mod sqlite;

pub use handle::StoreHandle;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StoreError;
use crate::item::Item;

/// Persisted projection of [`Item`].
///
/// Lives only at the store boundary so the in-memory representation can
/// evolve independently of the on-disk schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalItem {
  pub id: String,
  pub title: Option<String>,
  pub summary: Option<String>,
  pub attachment_url: String,
}

impl From<&Item> for LocalItem {
  fn from(item: &Item) -> Self {
    Self {
      id: item.id.clone(),
      title: item.title.clone(),
      summary: item.summary.clone(),
      attachment_url: item.attachment_url.to_string(),
    }
  }
}

impl LocalItem {
  /// Convert back into the domain type. A locator that no longer parses
  /// means the persisted data is corrupt.
  pub fn into_item(self) -> Result<Item, StoreError> {
    let attachment_url = Url::parse(&self.attachment_url)
      .map_err(|e| StoreError::Corrupt(format!("bad attachment url '{}': {}", self.attachment_url, e)))?;

    Ok(Item {
      id: self.id,
      title: self.title,
      summary: self.summary,
      attachment_url,
    })
  }
}

/// A complete, timestamped copy of the cached feed.
///
/// A snapshot is wholly present or wholly absent; backends must never let a
/// reader observe a partial one.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSnapshot {
  pub items: Vec<LocalItem>,
  pub timestamp: DateTime<Utc>,
}

/// Storage backend contract.
///
/// Implementations take `&mut self` because they are driven from a single
/// worker (see [`StoreHandle`]) and may assume exclusive access. Attachments
/// are keyed per locator and deliberately independent of the snapshot
/// lifecycle: deleting the snapshot leaves attachments in place so they can
/// be reused across snapshot replacement.
pub trait Store: Send + 'static {
  /// `Ok(None)` when no snapshot exists; an error only for unreadable storage.
  fn retrieve(&mut self) -> Result<Option<CachedSnapshot>, StoreError>;

  /// Fully replaces any existing snapshot.
  fn insert(&mut self, items: Vec<LocalItem>, timestamp: DateTime<Utc>) -> Result<(), StoreError>;

  /// Removes any snapshot. Deleting an already-empty cache succeeds.
  fn delete(&mut self) -> Result<(), StoreError>;

  fn retrieve_attachment(&mut self, url: &Url) -> Result<Option<Vec<u8>>, StoreError>;

  fn insert_attachment(&mut self, data: Vec<u8>, url: &Url) -> Result<(), StoreError>;
}
