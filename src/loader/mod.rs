//! The composable loader pipeline.
//!
//! Loaders share one small trait so decorators and composites stack freely:
//! a [`RemoteLoader`] wrapped in a [`CachingLoader`] falling back to a
//! [`LocalLoader`] reads exactly like the composition it is. The
//! [`FeedPipeline`] wires the standard arrangement and adds pagination;
//! [`Pager`] puts a poll-based guard in front of it for UI loops.

mod attachment;
mod caching;
mod fallback;
mod local;
mod pager;
mod paginated;
mod remote;

pub use attachment::{
  attachment_pipeline, AttachmentLoader, CachingAttachmentLoader, FallbackAttachmentLoader,
  LocalAttachmentLoader, RemoteAttachmentLoader,
};
pub use caching::CachingLoader;
pub use fallback::FallbackLoader;
pub use local::LocalLoader;
pub use pager::{Pager, PagerState};
pub use paginated::{FeedPipeline, Page, PageFuture};
pub use remote::{Fetcher, HttpFetcher, RemoteLoader};

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::LoadError;
use crate::item::Item;

/// A fallible asynchronous producer.
#[async_trait]
pub trait Loader: Send + Sync {
  type Output: Send;

  async fn load(&self) -> Result<Self::Output, LoadError>;
}

#[async_trait]
impl<L: Loader + ?Sized> Loader for Arc<L> {
  type Output = L::Output;

  async fn load(&self) -> Result<Self::Output, LoadError> {
    (**self).load().await
  }
}

/// Write side of the item cache, used as a fire-and-forget sink by the
/// caching decorator and the pagination path.
#[async_trait]
pub trait ItemCache: Send + Sync {
  /// Replace the cached snapshot with `items`.
  async fn save(&self, items: Vec<Item>) -> Result<(), LoadError>;
}

/// Persist `items` on a detached task. A failed write must never surface as
/// a load failure, so the result is only logged.
pub(crate) fn save_in_background<C>(cache: Arc<C>, items: Vec<Item>)
where
  C: ItemCache + 'static,
{
  tokio::spawn(async move {
    if let Err(error) = cache.save(items).await {
      tracing::warn!(%error, "background cache write failed");
    }
  });
}
