//! Error types for the snapshot codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("snapshot has no formatVersion")]
  MissingVersion,

  #[error("unsupported snapshot format version {found:?} (supported: {supported:?})")]
  UnsupportedVersion {
    found:     String,
    supported: &'static str,
  },

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
