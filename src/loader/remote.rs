//! Remote feed loading over HTTP.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

use super::Loader;
use crate::error::LoadError;
use crate::item::Item;

/// Transport seam: fetch raw bytes from a locator.
///
/// This is the single point where transport failures become
/// [`LoadError::Connectivity`]. Everything above it deals in
/// `(status, bytes)` pairs.
#[async_trait]
pub trait Fetcher: Send + Sync {
  async fn get(&self, url: &Url) -> Result<(u16, Vec<u8>), LoadError>;
}

/// `reqwest`-backed fetcher.
#[derive(Clone, Default)]
pub struct HttpFetcher {
  client: reqwest::Client,
}

impl HttpFetcher {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Fetcher for HttpFetcher {
  async fn get(&self, url: &Url) -> Result<(u16, Vec<u8>), LoadError> {
    let response = self
      .client
      .get(url.clone())
      .send()
      .await
      .map_err(|e| LoadError::Connectivity(e.to_string()))?;

    let status = response.status().as_u16();
    let body = response
      .bytes()
      .await
      .map_err(|e| LoadError::Connectivity(e.to_string()))?;

    Ok((status, body.to_vec()))
  }
}

// ============================================================================
// Wire types
// ============================================================================

// Separate from the domain type so deserialization stays clean while the
// domain type stays focused on application needs.

#[derive(Debug, Deserialize)]
struct WirePage {
  items: Vec<WireItem>,
}

#[derive(Debug, Deserialize)]
struct WireItem {
  id: String,
  title: Option<String>,
  summary: Option<String>,
  attachment_url: String,
}

impl WireItem {
  fn into_item(self) -> Result<Item, LoadError> {
    let attachment_url = self
      .attachment_url
      .parse()
      .map_err(|e| LoadError::InvalidData(format!("bad attachment url: {}", e)))?;

    Ok(Item {
      id: self.id,
      title: self.title,
      summary: self.summary,
      attachment_url,
    })
  }
}

/// Map a transport response into items.
///
/// A non-2xx status, an empty 2xx body, or malformed JSON is invalid data,
/// never a silent success.
fn map_page(status: u16, body: &[u8]) -> Result<Vec<Item>, LoadError> {
  if !(200..300).contains(&status) {
    return Err(LoadError::InvalidData(format!("unexpected status {}", status)));
  }
  if body.is_empty() {
    return Err(LoadError::InvalidData("empty response body".to_string()));
  }

  let page: WirePage =
    serde_json::from_slice(body).map_err(|e| LoadError::InvalidData(e.to_string()))?;

  page.items.into_iter().map(WireItem::into_item).collect()
}

/// Loads item pages from a remote endpoint.
///
/// Pagination uses an `after_id` cursor: each increment contains strictly the
/// items after the given id, and an empty increment signals exhaustion.
pub struct RemoteLoader<F: Fetcher> {
  fetcher: Arc<F>,
  endpoint: Url,
  page_size: Option<u32>,
}

impl<F: Fetcher> RemoteLoader<F> {
  pub fn new(fetcher: Arc<F>, endpoint: Url) -> Self {
    Self {
      fetcher,
      endpoint,
      page_size: None,
    }
  }

  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.page_size = Some(page_size);
    self
  }

  fn page_url(&self, after: Option<&str>) -> Url {
    let mut url = self.endpoint.clone();
    if self.page_size.is_none() && after.is_none() {
      return url;
    }
    {
      let mut query = url.query_pairs_mut();
      if let Some(limit) = self.page_size {
        query.append_pair("limit", &limit.to_string());
      }
      if let Some(id) = after {
        query.append_pair("after_id", id);
      }
    }
    url
  }

  /// Fetch the increment strictly after `after` (or the first page for `None`).
  pub async fn load_after(&self, after: Option<&str>) -> Result<Vec<Item>, LoadError> {
    let url = self.page_url(after);
    let (status, body) = self.fetcher.get(&url).await?;
    map_page(status, &body)
  }
}

#[async_trait]
impl<F: Fetcher> Loader for RemoteLoader<F> {
  type Output = Vec<Item>;

  async fn load(&self) -> Result<Vec<Item>, LoadError> {
    self.load_after(None).await
  }
}
