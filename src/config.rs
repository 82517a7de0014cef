//! Configuration for the CLI and embedding applications.

use chrono::Duration;
use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::policy::CachePolicy;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub remote: RemoteConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
  /// Feed endpoint URL
  pub url: String,
  /// Items per page (`limit` query parameter); server default when unset
  pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Database path (defaults to the platform data directory)
  pub path: Option<PathBuf>,
  /// Staleness window for the cached snapshot
  #[serde(default = "default_max_age_days")]
  pub max_age_days: i64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      path: None,
      max_age_days: default_max_age_days(),
    }
  }
}

fn default_max_age_days() -> i64 {
  7
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./feedcache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/feedcache/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/feedcache/config.yaml"
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("feedcache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("feedcache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// The staleness policy this configuration describes.
  pub fn policy(&self) -> CachePolicy {
    CachePolicy::new(Duration::days(self.cache.max_age_days))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_minimal_config_applies_defaults() {
    let config: Config =
      serde_yaml::from_str("remote:\n  url: https://example.com/feed\n").unwrap();

    assert_eq!(config.remote.url, "https://example.com/feed");
    assert_eq!(config.remote.page_size, None);
    assert_eq!(config.cache.max_age_days, 7);
    assert_eq!(config.cache.path, None);
  }

  #[test]
  fn test_parse_full_config() {
    let yaml = r#"
remote:
  url: https://example.com/feed
  page_size: 25
cache:
  path: /tmp/feed.db
  max_age_days: 2
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(config.remote.page_size, Some(25));
    assert_eq!(config.cache.max_age_days, 2);
    assert_eq!(config.cache.path, Some(PathBuf::from("/tmp/feed.db")));
  }
}
