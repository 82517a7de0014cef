//! Binary attachment loading.
//!
//! The same decorator/composite discipline as item loading, applied to
//! per-locator blobs: a local store loader, a remote loader, a caching
//! decorator, and a fallback composite. The usual arrangement is local first,
//! remote (with caching) as the fallback.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use super::Fetcher;
use crate::error::LoadError;
use crate::store::StoreHandle;

/// A fallible asynchronous producer of attachment bytes for a locator.
#[async_trait]
pub trait AttachmentLoader: Send + Sync {
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError>;
}

#[async_trait]
impl<L: AttachmentLoader + ?Sized> AttachmentLoader for Arc<L> {
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
    (**self).load_attachment(url).await
  }
}

/// Serves attachments from the local store. A miss is an error so that a
/// fallback composite can take over.
pub struct LocalAttachmentLoader {
  store: StoreHandle,
}

impl LocalAttachmentLoader {
  pub fn new(store: StoreHandle) -> Self {
    Self { store }
  }
}

#[async_trait]
impl AttachmentLoader for LocalAttachmentLoader {
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
    match self.store.retrieve_attachment(url).await? {
      Some(data) => Ok(data),
      None => Err(LoadError::Missing(url.to_string())),
    }
  }
}

/// Fetches attachments from the remote. Non-2xx status and empty 2xx bodies
/// are invalid data, matching the item wire contract.
pub struct RemoteAttachmentLoader<F: Fetcher> {
  fetcher: Arc<F>,
}

impl<F: Fetcher> RemoteAttachmentLoader<F> {
  pub fn new(fetcher: Arc<F>) -> Self {
    Self { fetcher }
  }
}

#[async_trait]
impl<F: Fetcher> AttachmentLoader for RemoteAttachmentLoader<F> {
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
    let (status, body) = self.fetcher.get(url).await?;

    if !(200..300).contains(&status) {
      return Err(LoadError::InvalidData(format!("unexpected status {}", status)));
    }
    if body.is_empty() {
      return Err(LoadError::InvalidData("empty attachment body".to_string()));
    }

    Ok(body)
  }
}

/// Decorator that persists successfully loaded attachments fire-and-forget.
pub struct CachingAttachmentLoader<L> {
  inner: L,
  store: StoreHandle,
}

impl<L: AttachmentLoader> CachingAttachmentLoader<L> {
  pub fn new(inner: L, store: StoreHandle) -> Self {
    Self { inner, store }
  }
}

#[async_trait]
impl<L: AttachmentLoader> AttachmentLoader for CachingAttachmentLoader<L> {
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
    let data = self.inner.load_attachment(url).await?;

    let store = self.store.clone();
    let url = url.clone();
    let copy = data.clone();
    tokio::spawn(async move {
      if let Err(error) = store.insert_attachment(copy, &url).await {
        warn!(%error, %url, "background attachment write failed");
      }
    });

    Ok(data)
  }
}

/// Composite: primary first, secondary only on primary failure.
pub struct FallbackAttachmentLoader<P, S> {
  primary: P,
  fallback: S,
}

impl<P, S> FallbackAttachmentLoader<P, S>
where
  P: AttachmentLoader,
  S: AttachmentLoader,
{
  pub fn new(primary: P, fallback: S) -> Self {
    Self { primary, fallback }
  }
}

#[async_trait]
impl<P, S> AttachmentLoader for FallbackAttachmentLoader<P, S>
where
  P: AttachmentLoader,
  S: AttachmentLoader,
{
  async fn load_attachment(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
    match self.primary.load_attachment(url).await {
      Ok(data) => Ok(data),
      Err(_) => self.fallback.load_attachment(url).await,
    }
  }
}

/// The standard attachment arrangement: local store first, remote with a
/// cache write when the store misses.
pub fn attachment_pipeline<F: Fetcher + 'static>(
  store: StoreHandle,
  fetcher: Arc<F>,
) -> impl AttachmentLoader {
  FallbackAttachmentLoader::new(
    LocalAttachmentLoader::new(store.clone()),
    CachingAttachmentLoader::new(RemoteAttachmentLoader::new(fetcher), store),
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::InMemoryStore;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Mutex;
  use std::time::Duration;

  #[derive(Default)]
  struct StubFetcher {
    response: Mutex<Option<(u16, Vec<u8>)>>,
    calls: AtomicUsize,
  }

  impl StubFetcher {
    fn responding(status: u16, body: &[u8]) -> Arc<Self> {
      Arc::new(Self {
        response: Mutex::new(Some((status, body.to_vec()))),
        calls: AtomicUsize::new(0),
      })
    }
  }

  #[async_trait]
  impl Fetcher for StubFetcher {
    async fn get(&self, _url: &Url) -> Result<(u16, Vec<u8>), LoadError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match self.response.lock().unwrap().clone() {
        Some(response) => Ok(response),
        None => Err(LoadError::Connectivity("down".to_string())),
      }
    }
  }

  fn url() -> Url {
    "https://example.com/a.png".parse().unwrap()
  }

  #[tokio::test]
  async fn test_local_miss_falls_back_to_remote_and_caches() {
    let store = StoreHandle::new(InMemoryStore::new());
    let fetcher = StubFetcher::responding(200, &[1, 2, 3]);
    let loader = attachment_pipeline(store.clone(), Arc::clone(&fetcher));

    let data = loader.load_attachment(&url()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(data, vec![1, 2, 3]);
    assert_eq!(store.retrieve_attachment(&url()).await.unwrap(), Some(vec![1, 2, 3]));
  }

  #[tokio::test]
  async fn test_local_hit_never_touches_the_remote() {
    let store = StoreHandle::new(InMemoryStore::new());
    store.insert_attachment(vec![9], &url()).await.unwrap();
    let fetcher = StubFetcher::responding(200, &[1]);
    let loader = attachment_pipeline(store, Arc::clone(&fetcher));

    let data = loader.load_attachment(&url()).await.unwrap();

    assert_eq!(data, vec![9]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_remote_non_2xx_is_invalid_data() {
    let store = StoreHandle::new(InMemoryStore::new());
    let fetcher = StubFetcher::responding(500, &[1]);
    let loader = attachment_pipeline(store, fetcher);

    let error = loader.load_attachment(&url()).await.unwrap_err();
    assert!(matches!(error, LoadError::InvalidData(_)));
  }

  #[tokio::test]
  async fn test_remote_empty_body_is_invalid_data() {
    let store = StoreHandle::new(InMemoryStore::new());
    let fetcher = StubFetcher::responding(200, &[]);
    let loader = attachment_pipeline(store, fetcher);

    let error = loader.load_attachment(&url()).await.unwrap_err();
    assert!(matches!(error, LoadError::InvalidData(_)));
  }
}
