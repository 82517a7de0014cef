//! In-memory storage backend.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use url::Url;

use super::{CachedSnapshot, LocalItem, Store};
use crate::error::StoreError;

/// Backend that keeps everything in process memory.
///
/// Useful for tests and for callers that want the pipeline semantics without
/// durable persistence.
#[derive(Debug, Default)]
pub struct InMemoryStore {
  snapshot: Option<CachedSnapshot>,
  attachments: HashMap<String, Vec<u8>>,
}

impl InMemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl Store for InMemoryStore {
  fn retrieve(&mut self) -> Result<Option<CachedSnapshot>, StoreError> {
    Ok(self.snapshot.clone())
  }

  fn insert(&mut self, items: Vec<LocalItem>, timestamp: DateTime<Utc>) -> Result<(), StoreError> {
    self.snapshot = Some(CachedSnapshot { items, timestamp });
    Ok(())
  }

  fn delete(&mut self) -> Result<(), StoreError> {
    self.snapshot = None;
    Ok(())
  }

  fn retrieve_attachment(&mut self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    Ok(self.attachments.get(url.as_str()).cloned())
  }

  fn insert_attachment(&mut self, data: Vec<u8>, url: &Url) -> Result<(), StoreError> {
    self.attachments.insert(url.to_string(), data);
    Ok(())
  }
}
