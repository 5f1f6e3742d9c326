//! comport server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the extractor API over HTTP. The remaining
//! subcommands manage extractors out-of-band.
//!
//! # Registering an extractor
//!
//! ```text
//! echo 's3cret' | comport add-extractor --department-id 1 --username dept1
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use comport_core::{
  checkpoint,
  extractor::{Checkpoint, NewExtractor},
  ingest,
  store::ExtractorStore,
};
use comport_server::{ServerConfig, auth};
use comport_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "comport incident ingestion server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the extractor API (the default).
  Serve,

  /// Print the argon2 hash for a password entered on stdin and exit.
  HashPassword,

  /// Register an extractor; the password is read from stdin.
  AddExtractor {
    #[arg(long)]
    department_id: i64,
    #[arg(long)]
    username:      String,
    /// Start a historical backfill from this month (requires --next-year).
    #[arg(long, requires = "next_year")]
    next_month:    Option<u32>,
    #[arg(long, requires = "next_month")]
    next_year:     Option<i32>,
  },

  /// Ask an extractor to resume a backfill from the given month.
  SetCheckpoint {
    #[arg(long)]
    username: String,
    #[arg(long)]
    month:    u32,
    #[arg(long)]
    year:     i32,
  },

  /// Cancel a pending backfill.
  ClearCheckpoint {
    #[arg(long)]
    username: String,
  },
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

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => {
      let (server_cfg, store) = open_store(&cli.config).await?;
      serve(store, &server_cfg).await
    }
    Command::HashPassword => {
      let password = read_password()?;
      println!("{}", hash(&password)?);
      Ok(())
    }
    Command::AddExtractor { department_id, username, next_month, next_year } => {
      let checkpoint = match (next_month, next_year) {
        (Some(month), Some(year)) => Some(Checkpoint::new(month, year)?),
        _ => None,
      };
      let password = read_password()?;
      let input = NewExtractor {
        checkpoint,
        ..NewExtractor::new(department_id, username, hash(&password)?)
      };
      let (_, store) = open_store(&cli.config).await?;
      let extractor = store
        .add_extractor(input)
        .await
        .context("failed to add extractor")?;
      println!("{}", extractor.extractor_id);
      Ok(())
    }
    Command::SetCheckpoint { username, month, year } => {
      let checkpoint = Checkpoint::new(month, year)?;
      let (_, store) = open_store(&cli.config).await?;
      let mut extractor = ingest::resolve_extractor(&store, &username).await?;
      checkpoint::set_checkpoint(&store, &mut extractor, checkpoint).await?;
      tracing::info!(%username, month, year, "checkpoint set");
      Ok(())
    }
    Command::ClearCheckpoint { username } => {
      let (_, store) = open_store(&cli.config).await?;
      let mut extractor = ingest::resolve_extractor(&store, &username).await?;
      checkpoint::clear_checkpoint(&store, &mut extractor).await?;
      tracing::info!(%username, "checkpoint cleared");
      Ok(())
    }
  }
}

/// Load configuration and open the store it points at.
async fn open_store(config: &Path) -> anyhow::Result<(ServerConfig, SqliteStore)> {
  let server_cfg = ServerConfig::load(config)
    .with_context(|| format!("failed to load configuration from {config:?}"))?;

  let store_path = server_cfg.resolved_store_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  Ok((server_cfg, store))
}

async fn serve(store: SqliteStore, server_cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = comport_server::router(Arc::new(store));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn hash(password: &str) -> anyhow::Result<String> {
  auth::hash_password(password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))
}

/// Read a password from stdin. The prompt goes to stderr so stdout stays
/// pipeable.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
