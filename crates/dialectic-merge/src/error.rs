//! Error types for `dialectic-merge`.
//!
//! Only whole-operation failures are errors. A record that cannot be merged
//! is reported in [`crate::MergeReport`] instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("snapshot rejected: {0}")]
  Snapshot(#[from] dialectic_snapshot::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("similarity threshold {0} is outside (0, 1]")]
  InvalidThreshold(f64),

  #[error("an import is already running")]
  ImportInProgress,

  #[error("an export is already running")]
  ExportInProgress,

  #[error("merge task aborted: {0}")]
  TaskAborted(#[from] tokio::task::JoinError),
}

impl Error {
  pub(crate) fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
