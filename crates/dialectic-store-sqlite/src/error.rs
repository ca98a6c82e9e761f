//! Error types for `dialectic-store-sqlite`.

use dialectic_core::EntityKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] dialectic_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error(transparent)]
  Migration(#[from] MigrationError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("{kind} not found: {id}")]
  NotFound { kind: EntityKind, id: uuid::Uuid },

  #[error("reference to unknown fallacy {0}")]
  UnknownFallacy(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failure of a schema migration run. Always fatal: the store must not be
/// used until it reaches the expected version.
#[derive(Debug, Error)]
pub enum MigrationError {
  #[error("store schema version {found} is newer than the newest known version {supported}")]
  TooNew { found: u32, supported: u32 },

  #[error("no migration leads to schema version {0}")]
  UnknownTarget(u32),

  #[error("migration to version {version} ({description}) failed and was rolled back: {reason}")]
  StepFailed {
    version:     u32,
    description: &'static str,
    #[source]
    reason:      StepError,
  },

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
}

/// Why a single migration step failed.
#[derive(Debug, Error)]
pub enum StepError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unexpected row in {table}: {detail}")]
  UnexpectedRow { table: &'static str, detail: String },

  #[error("foreign key violation: {table} row {rowid} references missing {parent}")]
  ForeignKey {
    table:  String,
    rowid:  i64,
    parent: String,
  },
}
