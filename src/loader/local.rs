//! Loading and saving the locally cached snapshot.

use async_trait::async_trait;
use std::sync::Arc;

use super::{ItemCache, Loader};
use crate::error::LoadError;
use crate::item::Item;
use crate::policy::{CachePolicy, Clock};
use crate::store::{LocalItem, StoreHandle};

/// Reads the cached snapshot, applying the staleness policy, and owns the
/// save and invalidation paths.
pub struct LocalLoader {
  store: StoreHandle,
  policy: CachePolicy,
  clock: Arc<dyn Clock>,
}

impl LocalLoader {
  pub fn new(store: StoreHandle, policy: CachePolicy, clock: Arc<dyn Clock>) -> Self {
    Self {
      store,
      policy,
      clock,
    }
  }

  /// Current items from the cache.
  ///
  /// An absent snapshot and an expired one both yield an empty list, never an
  /// error. Expiry does not delete anything here; that is
  /// [`validate_cache`](Self::validate_cache)'s job. Store failures surface
  /// unchanged.
  pub async fn load(&self) -> Result<Vec<Item>, LoadError> {
    match self.store.retrieve().await? {
      None => Ok(Vec::new()),
      Some(snapshot) if self.policy.validate(snapshot.timestamp, self.clock.now()) => snapshot
        .items
        .into_iter()
        .map(|local| local.into_item().map_err(LoadError::from))
        .collect(),
      Some(_) => Ok(Vec::new()),
    }
  }

  /// Replace the cached snapshot with `items`, stamped with the current time.
  ///
  /// Delete-then-insert: if the delete fails the insert is skipped, so the
  /// cache is never left with a mismatched timestamp.
  pub async fn save(&self, items: &[Item]) -> Result<(), LoadError> {
    self.store.delete().await?;

    let local: Vec<LocalItem> = items.iter().map(LocalItem::from).collect();
    self.store.insert(local, self.clock.now()).await?;
    Ok(())
  }

  /// Drop the snapshot if it is unreadable or expired; keep it if valid.
  pub async fn validate_cache(&self) -> Result<(), LoadError> {
    match self.store.retrieve().await {
      Err(_) => Ok(self.store.delete().await?),
      Ok(Some(snapshot)) if !self.policy.validate(snapshot.timestamp, self.clock.now()) => {
        Ok(self.store.delete().await?)
      }
      Ok(_) => Ok(()),
    }
  }
}

#[async_trait]
impl Loader for LocalLoader {
  type Output = Vec<Item>;

  async fn load(&self) -> Result<Vec<Item>, LoadError> {
    LocalLoader::load(self).await
  }
}

#[async_trait]
impl ItemCache for LocalLoader {
  async fn save(&self, items: Vec<Item>) -> Result<(), LoadError> {
    LocalLoader::save(self, &items).await
  }
}
