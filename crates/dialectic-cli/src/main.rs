//! `dialectic`: maintenance commands for a Dialectic debate store.
//!
//! Reads `dialectic.toml` (or the path given with `--config`) layered under
//! `DIALECTIC_*` environment variables, then runs one sub-command against the
//! configured SQLite store.
//!
//! # Usage
//!
//! ```text
//! dialectic status
//! dialectic migrate
//! dialectic import backup.json --threshold 0.9
//! dialectic export backup.json
//! dialectic --config ~/.config/dialectic/dialectic.toml cleanup
//! ```

mod commands;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use settings::Settings;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dialectic", author, version, about = "Dialectic debate store maintenance")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "dialectic.toml")]
  config: PathBuf,

  /// Store file to use instead of `store_path` from the configuration.
  #[arg(long, global = true, value_name = "FILE")]
  store: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Show the schema version and record counts without changing anything.
  Status,
  /// Bring the store up to the current schema.
  Migrate,
  /// Merge a snapshot file into the store.
  Import {
    file:      PathBuf,
    /// Near-duplicate threshold in (0, 1]; overrides the configuration.
    #[arg(long)]
    threshold: Option<f64>,
    /// Print the report as JSON.
    #[arg(long)]
    json:      bool,
  },
  /// Write every record of the store to a snapshot file.
  Export { file: PathBuf },
  /// Delete questions whose topic or claim no longer exists.
  Cleanup,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;
  let store_path = cli.store.unwrap_or(settings.store_path);

  match cli.command {
    Command::Status => commands::status(&store_path).await,
    Command::Migrate => commands::migrate(&store_path).await,
    Command::Import { file, threshold, json } => {
      let threshold = threshold.unwrap_or(settings.similarity_threshold);
      let report = commands::import(&store_path, &file, threshold).await?;
      commands::print_report(&report, json)
    }
    Command::Export { file } => commands::export(&store_path, &file).await,
    Command::Cleanup => commands::cleanup(&store_path).await,
  }
}
