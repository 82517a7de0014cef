//! Decorator that persists successful loads as a side effect.

use async_trait::async_trait;
use std::sync::Arc;

use super::{save_in_background, ItemCache, Loader};
use crate::error::LoadError;
use crate::item::Item;

/// Wraps a loader and, on success, writes the result into the cache without
/// blocking the caller or touching the returned value. Failures (of the load
/// or of the write) never gain or lose anything on the way through.
pub struct CachingLoader<L, C> {
  inner: L,
  cache: Arc<C>,
}

impl<L, C> CachingLoader<L, C>
where
  L: Loader<Output = Vec<Item>>,
  C: ItemCache + 'static,
{
  pub fn new(inner: L, cache: Arc<C>) -> Self {
    Self { inner, cache }
  }
}

#[async_trait]
impl<L, C> Loader for CachingLoader<L, C>
where
  L: Loader<Output = Vec<Item>>,
  C: ItemCache + 'static,
{
  type Output = Vec<Item>;

  async fn load(&self) -> Result<Vec<Item>, LoadError> {
    let items = self.inner.load().await?;
    save_in_background(Arc::clone(&self.cache), items.clone());
    Ok(items)
  }
}
