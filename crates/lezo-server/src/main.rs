//! `lezo`: the civil registry server and its maintenance commands.
//!
//! Reads `lezo.toml` (or the path given with `--config`) layered under
//! `LEZO_*` environment variables, opens the SQLite store, then either
//! serves the HTTP API or runs a one-off import or kin query.
//!
//! ```text
//! lezo serve
//! lezo import voters-2025.json --mode create
//! lezo kin 0b6f5e0e-8a0e-4c6b-9f63-6f1f4d0f2a11
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use lezo_core::kinship::{self, SiblingPolicy};
use lezo_import::{Batch, ImportMode, import_batch};
use lezo_server::ServerConfig;
use lezo_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(author, version, about = "Lezo civil registry")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "lezo.toml", global = true)]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the JSON API over HTTP.
  Serve,

  /// Import a voter-list batch (JSON: sheet name → rows) and print the report.
  Import {
    /// The batch file.
    file: PathBuf,

    #[arg(long, default_value_t = ImportMode::Create)]
    mode: ImportMode,
  },

  /// Print the inferred uncles, aunts, nephews and nieces of a citizen.
  Kin {
    citizen_id: Uuid,

    /// Follow only `brother` edges when looking for siblings.
    #[arg(long)]
    brothers_only: bool,
  },
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
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let config = ServerConfig::load(&cli.config).context("failed to read configuration")?;

  let store_path = config.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Serve => serve(store, &config).await,
    Command::Import { file, mode } => import(&store, &file, mode).await,
    Command::Kin { citizen_id, brothers_only } => kin(&store, citizen_id, brothers_only).await,
  }
}

async fn serve(store: SqliteStore, config: &ServerConfig) -> anyhow::Result<()> {
  let app = lezo_server::app(Arc::new(store), config);
  let address = config.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

async fn import(store: &SqliteStore, file: &Path, mode: ImportMode) -> anyhow::Result<()> {
  let json = tokio::fs::read_to_string(file)
    .await
    .with_context(|| format!("failed to read {file:?}"))?;
  let batch = Batch::from_json(&json).context("failed to parse batch")?;

  let report = import_batch(store, batch, mode).await.context("batch rejected")?;
  println!("{}", serde_json::to_string_pretty(&report)?);
  Ok(())
}

async fn kin(store: &SqliteStore, citizen_id: Uuid, brothers_only: bool) -> anyhow::Result<()> {
  let policy = if brothers_only { SiblingPolicy::BrotherOnly } else { SiblingPolicy::AnySibling };
  let kin = kinship::infer_with(store, citizen_id, policy)
    .await
    .context("kinship inference failed")?;
  println!("{}", serde_json::to_string_pretty(&kin)?);
  Ok(())
}
