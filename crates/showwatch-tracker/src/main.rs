//! showwatch tracker binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SHOWWATCH_*` environment variables, opens the SQLite store, starts the
//! scrape and notification loops, and serves the JSON API until Ctrl-C.
//!
//! Nested keys use a double underscore, e.g.
//! `SHOWWATCH_TELEGRAM__BOT_TOKEN=...`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use showwatch_core::{matcher::Matcher, similarity::PartialRatio, user::Channel};
use showwatch_store_sqlite::SqliteStore;
use showwatch_tracker::{
  AppState, Orchestrator, TrackerConfig,
  acquisition::{AcquisitionSession, webdriver::WebDriverFactory},
  notify::{Notifier, brevo::BrevoTransport, telegram::TelegramTransport},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Showwatch showtime tracker")]
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SHOWWATCH")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let cfg: TrackerConfig = settings
    .try_deserialize()
    .context("failed to deserialise TrackerConfig")?;

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  // Browser session.
  let factory = WebDriverFactory::new(
    &cfg.webdriver_url,
    &cfg.user_agent,
    cfg.session.page_load_timeout(),
  )
  .context("failed to build webdriver client")?;
  let session = AcquisitionSession::new(Arc::new(factory), cfg.session.clone(), &cfg.site_base_url);

  // Delivery channels. A channel without configuration keeps its messages
  // pending.
  let mut notifier = Notifier::new(store.clone(), &cfg.notify);
  if let Some(email) = cfg.email.clone() {
    let transport = BrevoTransport::new(email).context("failed to build email transport")?;
    notifier = notifier.with_transport(Channel::Email, Arc::new(transport));
  }
  if let Some(telegram) = cfg.telegram.clone() {
    let transport =
      TelegramTransport::new(telegram).context("failed to build telegram transport")?;
    notifier = notifier.with_transport(Channel::Telegram, Arc::new(transport));
  }
  let channels: Vec<&str> = notifier.channels().map(Channel::as_str).collect();
  if channels.is_empty() {
    tracing::warn!("no delivery channels configured; notifications will queue");
  } else {
    tracing::info!(?channels, "delivery channels ready");
  }

  let matcher = Matcher::new(Arc::new(PartialRatio), cfg.match_threshold);
  let orchestrator = Arc::new(Orchestrator::new(store.clone(), session, matcher, notifier, &cfg));

  let cancel = CancellationToken::new();
  let loops = orchestrator.spawn(&cancel);

  let app = showwatch_tracker::router(AppState { store, orchestrator: orchestrator.clone() });
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let shutdown = cancel.clone();
  let served = axum::serve(listener, app)
    .with_graceful_shutdown(async move {
      tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::info!("shutdown requested"),
        _ = shutdown.cancelled() => {}
      }
    })
    .await;

  orchestrator.shutdown(&cancel, loops).await;
  served.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
