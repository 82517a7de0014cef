//! Domain item type.

use url::Url;

/// A single feed item.
///
/// Identity is `id`; equality is structural. Items are immutable once
/// constructed and cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
  pub id: String,
  pub title: Option<String>,
  pub summary: Option<String>,
  /// Locator for the item's binary attachment.
  pub attachment_url: Url,
}

impl Item {
  pub fn new(id: impl Into<String>, attachment_url: Url) -> Self {
    Self {
      id: id.into(),
      title: None,
      summary: None,
      attachment_url,
    }
  }

  pub fn with_title(mut self, title: impl Into<String>) -> Self {
    self.title = Some(title.into());
    self
  }

  pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
    self.summary = Some(summary.into());
    self
  }
}
