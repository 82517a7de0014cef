//! Incremental pagination over the composed feed pipeline.

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{save_in_background, CachingLoader, FallbackLoader, Fetcher, Loader, LocalLoader, RemoteLoader};
use crate::error::LoadError;
use crate::item::Item;

/// Future producing the next page.
pub type PageFuture = BoxFuture<'static, Result<Page, LoadError>>;

type LoadMoreFn = Arc<dyn Fn() -> PageFuture + Send + Sync>;

/// One page of the feed.
///
/// `items` is the cumulative list of everything loaded so far, in fetch
/// order. A page without a continuation is terminal: there is no `load_more`
/// to call on it, by construction.
pub struct Page {
  items: Vec<Item>,
  next: Option<LoadMoreFn>,
}

impl Page {
  fn new(items: Vec<Item>, next: Option<LoadMoreFn>) -> Self {
    Self { items, next }
  }

  pub fn items(&self) -> &[Item] {
    &self.items
  }

  pub fn into_items(self) -> Vec<Item> {
    self.items
  }

  pub fn has_more(&self) -> bool {
    self.next.is_some()
  }

  /// The next page, or `None` once the feed is exhausted.
  pub fn load_more(&self) -> Option<PageFuture> {
    self.next.as_ref().map(|next| next())
  }
}

impl fmt::Debug for Page {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Page")
      .field("items", &self.items.len())
      .field("has_more", &self.has_more())
      .finish()
  }
}

/// The standard composition: remote loading with a transparent cache write,
/// falling back to the local snapshot when the remote fails, plus
/// cursor-based pagination.
pub struct FeedPipeline<F: Fetcher> {
  remote: Arc<RemoteLoader<F>>,
  local: Arc<LocalLoader>,
}

// Manual Clone: `F` itself only lives behind an Arc
impl<F: Fetcher> Clone for FeedPipeline<F> {
  fn clone(&self) -> Self {
    Self {
      remote: Arc::clone(&self.remote),
      local: Arc::clone(&self.local),
    }
  }
}

impl<F: Fetcher + 'static> FeedPipeline<F> {
  pub fn new(remote: Arc<RemoteLoader<F>>, local: Arc<LocalLoader>) -> Self {
    Self { remote, local }
  }

  /// Load the first page.
  ///
  /// Remote first (cached as a side effect); the local snapshot answers when
  /// the remote fails. An empty result is a terminal page, not an error.
  pub async fn load(&self) -> Result<Page, LoadError> {
    let composed = FallbackLoader::new(
      CachingLoader::new(Arc::clone(&self.remote), Arc::clone(&self.local)),
      Arc::clone(&self.local),
    );

    let items = composed.load().await?;
    let more = !items.is_empty();
    Ok(self.assemble(items, more))
  }

  /// Fetch the increment after `running`'s last item and append it.
  async fn load_more(&self, running: Vec<Item>) -> Result<Page, LoadError> {
    let cursor = running.last().map(|item| item.id.clone());
    let increment = self.remote.load_after(cursor.as_deref()).await?;

    // Re-read the full snapshot so pages never miss items another path has
    // cached since; if the snapshot lags the detached write (or the cache is
    // cold), the in-memory running total wins.
    let cached = self.local.load().await.unwrap_or_else(|error| {
      debug!(%error, "snapshot re-read failed, using running total");
      Vec::new()
    });
    let mut combined = if cached.len() >= running.len() {
      cached
    } else {
      running
    };
    combined.extend(increment.iter().cloned());

    save_in_background(Arc::clone(&self.local), combined.clone());

    Ok(self.assemble(combined, !increment.is_empty()))
  }

  /// Build a page whose continuation is present iff the last increment was
  /// non-empty.
  fn assemble(&self, items: Vec<Item>, more: bool) -> Page {
    if !more {
      return Page::new(items, None);
    }

    let pipeline = self.clone();
    let running = items.clone();
    let next: LoadMoreFn = Arc::new(move || {
      let pipeline = pipeline.clone();
      let running = running.clone();
      Box::pin(async move { pipeline.load_more(running).await })
    });

    Page::new(items, Some(next))
  }
}
