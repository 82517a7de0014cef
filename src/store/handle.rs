//! Serialized async front-end for a [`Store`].

use chrono::{DateTime, Utc};
use std::thread;
use tokio::sync::{mpsc, oneshot};
use url::Url;

use super::{CachedSnapshot, LocalItem, Store};
use crate::error::StoreError;

type Reply<T> = oneshot::Sender<Result<T, StoreError>>;

enum Command {
  Retrieve(Reply<Option<CachedSnapshot>>),
  Insert {
    items: Vec<LocalItem>,
    timestamp: DateTime<Utc>,
    reply: Reply<()>,
  },
  Delete(Reply<()>),
  RetrieveAttachment {
    url: Url,
    reply: Reply<Option<Vec<u8>>>,
  },
  InsertAttachment {
    data: Vec<u8>,
    url: Url,
    reply: Reply<()>,
  },
}

/// Async handle over a storage backend.
///
/// All operations issued through a handle (and its clones) funnel into a
/// single worker thread, so reads and writes against the same store execute
/// strictly in submission order. A concurrent delete-then-insert can never
/// interleave with another caller's operations.
///
/// Completion is delivered over a oneshot channel. If the caller dropped its
/// future in the meantime, the send simply fails and is ignored, so pending
/// store work never calls into state that is no longer there.
#[derive(Clone)]
pub struct StoreHandle {
  tx: mpsc::UnboundedSender<Command>,
}

impl StoreHandle {
  /// Take ownership of `store` and start its worker thread. The thread exits
  /// once every handle clone has been dropped.
  pub fn new<S: Store>(mut store: S) -> Self {
    let (tx, mut rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
      while let Some(command) = rx.blocking_recv() {
        match command {
          Command::Retrieve(reply) => {
            let _ = reply.send(store.retrieve());
          }
          Command::Insert {
            items,
            timestamp,
            reply,
          } => {
            let _ = reply.send(store.insert(items, timestamp));
          }
          Command::Delete(reply) => {
            let _ = reply.send(store.delete());
          }
          Command::RetrieveAttachment { url, reply } => {
            let _ = reply.send(store.retrieve_attachment(&url));
          }
          Command::InsertAttachment { data, url, reply } => {
            let _ = reply.send(store.insert_attachment(data, &url));
          }
        }
      }
    });

    Self { tx }
  }

  pub async fn retrieve(&self) -> Result<Option<CachedSnapshot>, StoreError> {
    let (reply, rx) = oneshot::channel();
    self.submit(Command::Retrieve(reply))?;
    rx.await.map_err(|_| StoreError::Closed)?
  }

  pub async fn insert(
    &self,
    items: Vec<LocalItem>,
    timestamp: DateTime<Utc>,
  ) -> Result<(), StoreError> {
    let (reply, rx) = oneshot::channel();
    self.submit(Command::Insert {
      items,
      timestamp,
      reply,
    })?;
    rx.await.map_err(|_| StoreError::Closed)?
  }

  pub async fn delete(&self) -> Result<(), StoreError> {
    let (reply, rx) = oneshot::channel();
    self.submit(Command::Delete(reply))?;
    rx.await.map_err(|_| StoreError::Closed)?
  }

  pub async fn retrieve_attachment(&self, url: &Url) -> Result<Option<Vec<u8>>, StoreError> {
    let (reply, rx) = oneshot::channel();
    self.submit(Command::RetrieveAttachment {
      url: url.clone(),
      reply,
    })?;
    rx.await.map_err(|_| StoreError::Closed)?
  }

  pub async fn insert_attachment(&self, data: Vec<u8>, url: &Url) -> Result<(), StoreError> {
    let (reply, rx) = oneshot::channel();
    self.submit(Command::InsertAttachment {
      data,
      url: url.clone(),
      reply,
    })?;
    rx.await.map_err(|_| StoreError::Closed)?
  }

  fn submit(&self, command: Command) -> Result<(), StoreError> {
    self.tx.send(command).map_err(|_| StoreError::Closed)
  }
}
