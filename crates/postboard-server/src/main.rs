//! postboard-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, and serves the REST, GraphQL and websocket endpoints over HTTP.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use postboard_server::{
  AppState, ServerConfig,
  config::expand_tilde,
  notify::{ChangeNotifier, DEFAULT_CAPACITY},
};
use postboard_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Postboard feed and chat server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  cfg.images_dir = expand_tilde(&cfg.images_dir);

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let address = cfg.address();
  let state = AppState::new(store, cfg, ChangeNotifier::new(DEFAULT_CAPACITY));
  state
    .images
    .init()
    .await
    .with_context(|| format!("failed to create {:?}", state.images.dir()))?;

  let app = postboard_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for shutdown signal");
  }
  tracing::info!("shutting down");
}
