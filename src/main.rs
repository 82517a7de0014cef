use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use feedcache::config::Config;
use feedcache::{
  FeedPipeline, HttpFetcher, LocalLoader, Page, RemoteLoader, SqliteStore, StoreHandle,
  SystemClock,
};

#[derive(Parser, Debug)]
#[command(name = "feedcache")]
#[command(about = "Offline-first feed fetcher with a local cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/feedcache/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Fetch the feed through the full pipeline, walking up to N pages
  Fetch {
    #[arg(long, default_value_t = 1)]
    pages: u32,
  },
  /// Print the valid local snapshot without touching the network
  Show,
  /// Drop the cached snapshot if it has expired or cannot be read
  Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .init();

  let args = Args::parse();
  let config = Config::load(args.config.as_deref())?;

  let store = match &config.cache.path {
    Some(path) => SqliteStore::open_at(path)?,
    None => SqliteStore::open()?,
  };
  let local = Arc::new(LocalLoader::new(
    StoreHandle::new(store),
    config.policy(),
    Arc::new(SystemClock),
  ));

  match args.command {
    Command::Fetch { pages } => {
      let endpoint = config
        .remote
        .url
        .parse()
        .map_err(|e| eyre!("Invalid remote url '{}': {}", config.remote.url, e))?;
      let mut remote = RemoteLoader::new(Arc::new(HttpFetcher::new()), endpoint);
      if let Some(page_size) = config.remote.page_size {
        remote = remote.with_page_size(page_size);
      }

      let pipeline = FeedPipeline::new(Arc::new(remote), local);
      let mut page = pipeline.load().await?;
      print_page(&page);

      for _ in 1..pages {
        let Some(next) = page.load_more() else { break };
        page = next.await?;
        print_page(&page);
      }
    }
    Command::Show => {
      for item in local.load().await? {
        print_item(&item);
      }
    }
    Command::Validate => {
      local.validate_cache().await?;
      println!("cache validated");
    }
  }

  Ok(())
}

fn print_page(page: &Page) {
  println!(
    "-- {} item(s){}",
    page.items().len(),
    if page.has_more() { ", more available" } else { "" }
  );
  for item in page.items() {
    print_item(item);
  }
}

fn print_item(item: &feedcache::Item) {
  println!(
    "{}  {}",
    item.id,
    item.title.as_deref().unwrap_or("(untitled)")
  );
}
