//! SQLite backend for the Dialectic debate store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Opening a store runs the schema
//! migrations in [`migrate`] first.

mod encode;
mod record;
mod schema;
mod store;

pub mod error;
pub mod migrate;

pub use error::{Error, MigrationError, Result, StepError};
pub use migrate::CURRENT_VERSION;
pub use store::SqliteStore;
