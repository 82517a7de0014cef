//! Cancellable handles for detached loads.

use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error::LoadError;

/// Handle for a load running on a detached task.
///
/// Dropping the handle does not cancel the load; only [`cancel`](Self::cancel)
/// does.
pub struct LoadTask {
  token: CancellationToken,
  revoke: Arc<dyn Fn() + Send + Sync>,
}

impl LoadTask {
  /// Cancel the load. Idempotent; calling it after natural completion is a
  /// no-op. Once it returns, the completion callback will never fire, and the
  /// underlying future (including any in-flight request it owns) is dropped.
  pub fn cancel(&self) {
    self.token.cancel();
    (self.revoke)();
  }

  pub fn is_cancelled(&self) -> bool {
    self.token.is_cancelled()
  }
}

/// Run `future` on a detached task, delivering its result to `on_complete`
/// unless the returned [`LoadTask`] is cancelled first.
///
/// Cancellation is not delivered as an error: a cancelled load simply never
/// completes its callback.
pub fn spawn_load<T, Fut, C>(future: Fut, on_complete: C) -> LoadTask
where
  T: Send + 'static,
  Fut: Future<Output = Result<T, LoadError>> + Send + 'static,
  C: FnOnce(Result<T, LoadError>) + Send + 'static,
{
  let token = CancellationToken::new();
  let guard = token.clone();

  // Delivery goes through a one-shot slot: the worker may only invoke a
  // callback it takes out of the slot, and cancel() empties the slot under
  // the same lock. Whichever side takes first wins, so a cancel() that has
  // returned can never be followed by a completion.
  let slot = Arc::new(Mutex::new(Some(on_complete)));
  let worker_slot = Arc::clone(&slot);

  tokio::spawn(async move {
    tokio::select! {
      biased;
      _ = guard.cancelled() => {}
      result = future => {
        let taken = worker_slot.lock().ok().and_then(|mut callback| callback.take());
        if let Some(on_complete) = taken {
          on_complete(result);
        }
      }
    }
  });

  LoadTask {
    token,
    revoke: Arc::new(move || {
      if let Ok(mut callback) = slot.lock() {
        callback.take();
      }
    }),
  }
}
