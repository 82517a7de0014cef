//! Offline-first loader pipeline for paginated item feeds.
//!
//! The crate fetches pages of items (and their binary attachments) from a
//! remote HTTP source, transparently caches them in a local store, and serves
//! the cached snapshot when the remote is unreachable. Everything is built
//! from small composable pieces:
//!
//! - [`store`]: durable snapshot/attachment persistence behind a
//!   serialized-FIFO async handle
//! - [`policy`]: the time-based staleness rule for cached snapshots
//! - [`loader`]: the loaders themselves: remote, local, caching decorator,
//!   fallback composite, pagination, and the polling [`loader::Pager`] guard
//! - [`task`]: cancellable handles for detached loads
//!
//! # Example
//!
//! ```ignore
//! let store = StoreHandle::new(SqliteStore::open()?);
//! let local = Arc::new(LocalLoader::new(
//!     store.clone(),
//!     CachePolicy::default(),
//!     Arc::new(SystemClock),
//! ));
//! let remote = Arc::new(RemoteLoader::new(
//!     Arc::new(HttpFetcher::new()),
//!     "https://example.com/feed".parse()?,
//! ));
//!
//! let pipeline = FeedPipeline::new(remote, local);
//! let mut page = pipeline.load().await?;
//! while let Some(next) = page.load_more() {
//!     page = next.await?;
//! }
//! ```

pub mod config;
pub mod error;
pub mod item;
pub mod loader;
pub mod policy;
pub mod store;
pub mod task;

pub use error::{LoadError, StoreError};
pub use item::Item;
pub use loader::{
  attachment_pipeline, AttachmentLoader, CachingLoader, FallbackLoader, FeedPipeline, Fetcher,
  HttpFetcher, ItemCache, Loader, LocalLoader, Page, Pager, PagerState, RemoteLoader,
};
pub use policy::{CachePolicy, Clock, SystemClock};
pub use store::{CachedSnapshot, InMemoryStore, LocalItem, SqliteStore, Store, StoreHandle};
pub use task::{spawn_load, LoadTask};
