//! Polling front-end that guards against overlapping page loads.
//!
//! The pipeline itself does not stop a caller from issuing a second
//! `load_more` while one is in flight; that guard belongs at the UI-adjacent
//! boundary, and this is it. `Pager` exposes an observable loading state and
//! turns `refresh`/`load_more` into no-ops while a load is pending.
//!
//! # Example
//!
//! ```ignore
//! let mut pager = Pager::new(pipeline);
//! pager.refresh();
//!
//! // In the event loop tick
//! if pager.poll() {
//!     // State changed, trigger a re-render
//! }
//!
//! // On scroll-to-bottom
//! pager.load_more(); // ignored while already loading
//! ```

use tokio::sync::mpsc;

use super::paginated::{FeedPipeline, Page, PageFuture};
use super::Fetcher;
use crate::error::LoadError;
use crate::item::Item;

/// The state of the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
  /// No load has been started yet
  Idle,
  /// A page load is in flight
  Loading,
  /// The last load completed
  Ready,
  /// The last load failed (or was dropped before it could report back)
  Failed,
}

/// Poll-based pagination driver over a [`FeedPipeline`].
pub struct Pager<F: Fetcher> {
  pipeline: FeedPipeline<F>,
  state: PagerState,
  page: Option<Page>,
  error: Option<LoadError>,
  receiver: Option<mpsc::UnboundedReceiver<Result<Page, LoadError>>>,
}

impl<F: Fetcher + 'static> Pager<F> {
  pub fn new(pipeline: FeedPipeline<F>) -> Self {
    Self {
      pipeline,
      state: PagerState::Idle,
      page: None,
      error: None,
      receiver: None,
    }
  }

  pub fn state(&self) -> PagerState {
    self.state
  }

  pub fn is_loading(&self) -> bool {
    self.state == PagerState::Loading
  }

  /// Everything loaded so far, in fetch order.
  pub fn items(&self) -> &[Item] {
    self.page.as_ref().map(Page::items).unwrap_or(&[])
  }

  /// Whether the feed has another page. False while nothing is loaded.
  pub fn has_more(&self) -> bool {
    self.page.as_ref().is_some_and(Page::has_more)
  }

  pub fn error(&self) -> Option<&LoadError> {
    self.error.as_ref()
  }

  /// Start loading the first page. No-op while a load is in flight.
  pub fn refresh(&mut self) {
    if self.is_loading() {
      return;
    }

    let pipeline = self.pipeline.clone();
    self.start(Box::pin(async move { pipeline.load().await }));
  }

  /// Request the next page. No-op while loading, before the first refresh,
  /// or once the feed is exhausted.
  pub fn load_more(&mut self) {
    if self.is_loading() {
      return;
    }
    let Some(future) = self.page.as_ref().and_then(Page::load_more) else {
      return;
    };

    self.start(future);
  }

  /// Poll for the result of a pending load.
  ///
  /// Returns `true` if the state changed. Call this from the event loop tick.
  pub fn poll(&mut self) -> bool {
    let receiver = match &mut self.receiver {
      Some(rx) => rx,
      None => return false,
    };

    match receiver.try_recv() {
      Ok(Ok(page)) => {
        self.page = Some(page);
        self.error = None;
        self.state = PagerState::Ready;
        self.receiver = None;
        true
      }
      Ok(Err(error)) => {
        self.error = Some(error);
        self.state = PagerState::Failed;
        self.receiver = None;
        true
      }
      Err(mpsc::error::TryRecvError::Empty) => false,
      Err(mpsc::error::TryRecvError::Disconnected) => {
        // Sender dropped without sending. The load is gone; mark it failed
        // without inventing a transport error for it.
        self.error = None;
        self.state = PagerState::Failed;
        self.receiver = None;
        true
      }
    }
  }

  fn start(&mut self, future: PageFuture) {
    let (tx, rx) = mpsc::unbounded_channel();
    self.receiver = Some(rx);
    self.state = PagerState::Loading;

    tokio::spawn(async move {
      let result = future.await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::loader::{LocalLoader, RemoteLoader};
  use crate::policy::{CachePolicy, SystemClock};
  use crate::store::{InMemoryStore, StoreHandle};
  use async_trait::async_trait;
  use std::collections::VecDeque;
  use std::sync::{Arc, Mutex};
  use std::time::Duration;
  use url::Url;

  /// Fetcher that replays scripted responses, optionally after a delay.
  #[derive(Default)]
  struct ScriptedFetcher {
    responses: Mutex<VecDeque<(u16, Vec<u8>)>>,
    delay: Option<Duration>,
  }

  impl ScriptedFetcher {
    fn page(self, ids: &[&str]) -> Self {
      let items: Vec<String> = ids
        .iter()
        .map(|id| {
          format!(
            r#"{{"id":"{id}","title":null,"summary":null,"attachment_url":"https://example.com/{id}.png"}}"#
          )
        })
        .collect();
      let body = format!(r#"{{"items":[{}]}}"#, items.join(","));
      self
        .responses
        .lock()
        .unwrap()
        .push_back((200, body.into_bytes()));
      self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
      self.delay = Some(delay);
      self
    }
  }

  #[async_trait]
  impl Fetcher for ScriptedFetcher {
    async fn get(&self, _url: &Url) -> Result<(u16, Vec<u8>), LoadError> {
      if let Some(delay) = self.delay {
        tokio::time::sleep(delay).await;
      }
      let response = self.responses.lock().unwrap().pop_front();
      response
        .map(Ok)
        .unwrap_or_else(|| Err(LoadError::Connectivity("exhausted".to_string())))
    }
  }

  fn pager(fetcher: ScriptedFetcher) -> Pager<ScriptedFetcher> {
    let store = StoreHandle::new(InMemoryStore::new());
    let local = Arc::new(LocalLoader::new(
      store,
      CachePolicy::default(),
      Arc::new(SystemClock),
    ));
    let remote = Arc::new(RemoteLoader::new(
      Arc::new(fetcher),
      "https://example.com/feed".parse().unwrap(),
    ));
    Pager::new(FeedPipeline::new(remote, local))
  }

  async fn poll_until_settled<F: Fetcher + 'static>(pager: &mut Pager<F>) {
    for _ in 0..100 {
      tokio::time::sleep(Duration::from_millis(5)).await;
      if pager.poll() {
        return;
      }
    }
    panic!("pager never settled");
  }

  #[tokio::test]
  async fn test_refresh_then_poll_yields_first_page() {
    let mut pager = pager(ScriptedFetcher::default().page(&["1", "2"]));

    assert_eq!(pager.state(), PagerState::Idle);
    pager.refresh();
    assert!(pager.is_loading());

    poll_until_settled(&mut pager).await;

    assert_eq!(pager.state(), PagerState::Ready);
    assert_eq!(pager.items().len(), 2);
    assert!(pager.has_more());
  }

  #[tokio::test]
  async fn test_refresh_while_loading_is_noop() {
    let fetcher = ScriptedFetcher::default()
      .page(&["1"])
      .with_delay(Duration::from_millis(100));
    let mut pager = pager(fetcher);

    pager.refresh();
    assert!(pager.is_loading());

    // Second refresh should be a no-op
    pager.refresh();
    assert!(pager.is_loading());

    poll_until_settled(&mut pager).await;
    assert_eq!(pager.items().len(), 1);
  }

  #[tokio::test]
  async fn test_load_more_while_loading_is_noop() {
    let fetcher = ScriptedFetcher::default()
      .page(&["1"])
      .page(&["2"])
      .with_delay(Duration::from_millis(50));
    let mut pager = pager(fetcher);

    pager.refresh();
    poll_until_settled(&mut pager).await;

    pager.load_more();
    assert!(pager.is_loading());
    pager.load_more(); // ignored
    poll_until_settled(&mut pager).await;

    assert_eq!(pager.items().len(), 2);
  }

  #[tokio::test]
  async fn test_dropped_load_fails_without_an_error_value() {
    let mut pager = pager(ScriptedFetcher::default());

    // A load whose task goes away before sending anything
    let (tx, rx) = mpsc::unbounded_channel::<Result<Page, LoadError>>();
    pager.receiver = Some(rx);
    pager.state = PagerState::Loading;
    drop(tx);

    assert!(pager.poll());
    assert_eq!(pager.state(), PagerState::Failed);
    assert!(pager.error().is_none());
  }

  #[tokio::test]
  async fn test_load_more_before_first_refresh_is_noop() {
    let mut pager = pager(ScriptedFetcher::default());

    pager.load_more();

    assert_eq!(pager.state(), PagerState::Idle);
    assert!(!pager.poll());
  }

  #[tokio::test]
  async fn test_load_more_on_exhausted_feed_is_noop() {
    let mut pager = pager(ScriptedFetcher::default().page(&[]));

    pager.refresh();
    poll_until_settled(&mut pager).await;
    assert!(!pager.has_more());

    pager.load_more();
    assert_eq!(pager.state(), PagerState::Ready);
  }
}
