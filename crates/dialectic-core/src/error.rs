//! Error types for `dialectic-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{entity}.{field} must not be blank")]
  Blank {
    entity: &'static str,
    field:  &'static str,
  },

  #[error("source reliability must be within [0.0, 1.0], got {0}")]
  ReliabilityOutOfRange(f64),

  #[error("unknown {field} label: {value:?}")]
  UnknownLabel { field: &'static str, value: String },

  #[error("similarity threshold must be within (0.0, 1.0], got {0}")]
  InvalidThreshold(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
