//! daypick server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP. Every key can
//! be overridden with a `DAYPICK_*` environment variable, e.g.
//!
//! ```text
//! DAYPICK_SPOTIFY_CLIENT_SECRET=… daypick --config /etc/daypick.toml
//! ```

mod config;
mod spotify;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use daypick_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::{
  config::{ServerConfig, expand_tilde},
  spotify::SpotifyResolver,
};

#[derive(Parser)]
#[command(author, version, about = "Daily music pick server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let resolver =
    SpotifyResolver::new(&server_cfg).context("failed to build track resolver")?;

  let app = daypick_api::api_router(Arc::new(store), Arc::new(resolver))
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
