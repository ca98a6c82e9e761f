//! Runtime settings, read from `dialectic.toml` and `DIALECTIC_*` variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use dialectic_core::similarity::DEFAULT_THRESHOLD;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  /// SQLite file holding the store. A leading `~/` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Near-duplicate threshold for imports.
  #[serde(default = "default_threshold")]
  pub similarity_threshold: f64,
}

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/dialectic/dialectic.db") }

fn default_threshold() -> f64 { DEFAULT_THRESHOLD }

impl Settings {
  /// Layer the environment over the file at `path`, which may be absent.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("DIALECTIC").try_parsing(true))
      .build()
      .with_context(|| format!("failed to read config file {}", path.display()))?;

    let mut settings: Settings = settings
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }
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
