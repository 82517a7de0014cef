//! Composite that retries a failed primary load through a secondary source.

use async_trait::async_trait;
use tracing::debug;

use super::Loader;
use crate::error::LoadError;

/// Runs `primary`; on failure, runs `fallback` and returns whatever it
/// produces. The primary is never retried and its error is discarded; only
/// the fallback's result (success or error) surfaces.
///
/// Cancellation forwards naturally: dropping the composed future while the
/// primary is in flight drops the primary and the fallback never starts;
/// dropping it during the fallback drops the fallback instead.
pub struct FallbackLoader<P, S> {
  primary: P,
  fallback: S,
}

impl<T, P, S> FallbackLoader<P, S>
where
  T: Send,
  P: Loader<Output = T>,
  S: Loader<Output = T>,
{
  pub fn new(primary: P, fallback: S) -> Self {
    Self { primary, fallback }
  }
}

#[async_trait]
impl<T, P, S> Loader for FallbackLoader<P, S>
where
  T: Send,
  P: Loader<Output = T>,
  S: Loader<Output = T>,
{
  type Output = T;

  async fn load(&self) -> Result<T, LoadError> {
    match self.primary.load().await {
      Ok(value) => Ok(value),
      Err(error) => {
        debug!(%error, "primary load failed, trying fallback");
        self.fallback.load().await
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  /// Loader spy that counts invocations.
  struct CountingLoader {
    calls: Arc<AtomicUsize>,
    result: Result<u32, ()>,
  }

  impl CountingLoader {
    fn new(result: Result<u32, ()>) -> (Self, Arc<AtomicUsize>) {
      let calls = Arc::new(AtomicUsize::new(0));
      (
        Self {
          calls: Arc::clone(&calls),
          result,
        },
        calls,
      )
    }
  }

  #[async_trait]
  impl Loader for CountingLoader {
    type Output = u32;

    async fn load(&self) -> Result<u32, LoadError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      self
        .result
        .map_err(|_| LoadError::Connectivity("down".to_string()))
    }
  }

  #[tokio::test]
  async fn test_primary_success_never_invokes_fallback() {
    let (primary, primary_calls) = CountingLoader::new(Ok(1));
    let (fallback, fallback_calls) = CountingLoader::new(Ok(2));
    let loader = FallbackLoader::new(primary, fallback);

    assert_eq!(loader.load().await.unwrap(), 1);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_primary_failure_invokes_fallback_exactly_once() {
    let (primary, primary_calls) = CountingLoader::new(Err(()));
    let (fallback, fallback_calls) = CountingLoader::new(Ok(2));
    let loader = FallbackLoader::new(primary, fallback);

    assert_eq!(loader.load().await.unwrap(), 2);
    assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
    assert_eq!(fallback_calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_both_failing_surfaces_only_the_fallback_error() {
    let (primary, _) = CountingLoader::new(Err(()));
    let (fallback, _) = CountingLoader::new(Err(()));
    let loader = FallbackLoader::new(primary, fallback);

    let error = loader.load().await.unwrap_err();
    assert!(matches!(error, LoadError::Connectivity(_)));
  }
}
