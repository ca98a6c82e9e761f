//! Storage traits.
//!
//! Backends (e.g. `dialectic-store-sqlite`) implement [`Repository`] for
//! every entity type and [`DebateStore`] for the cross-cutting operations.
//! Higher layers (`dialectic-merge`, the CLI) depend on these traits, not on a
//! concrete backend.
//!
//! All methods return `Send` futures so the traits can be used from a
//! multi-threaded tokio runtime and from spawned tasks.

use std::{
  future::Future,
  sync::{Arc, atomic::AtomicBool},
};

use uuid::Uuid;

use crate::{
  entity::Entity,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, TargetRef, Topic},
};

/// The error type shared by every repository of a backend.
pub trait StoreBackend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;
}

/// CRUD for one entity type.
///
/// Writes canonicalise the record first ([`Entity::refresh`]), so derived
/// fields such as fingerprints are persisted with the content they derive
/// from.
pub trait Repository<E: Entity>: StoreBackend {
  /// Create a record from a draft. The store assigns the id and timestamps.
  fn create(
    &self,
    draft: E::Draft,
  ) -> impl Future<Output = Result<E, <Self as StoreBackend>::Error>> + Send + '_;

  /// Retrieve a record by id. Returns `None` if not found.
  fn get(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<E>, <Self as StoreBackend>::Error>> + Send + '_;

  /// All records, in insertion order.
  fn list(&self) -> impl Future<Output = Result<Vec<E>, <Self as StoreBackend>::Error>> + Send + '_;

  /// Records whose text matches `query`.
  fn search(
    &self,
    query: String,
  ) -> impl Future<Output = Result<Vec<E>, <Self as StoreBackend>::Error>> + Send + '_;

  /// Replace the content of an existing record.
  ///
  /// `created_at` is kept from the stored row; `updated_at` becomes
  /// `max(now, stored updated_at)` so it never moves backwards.
  fn update(
    &self,
    entity: E,
  ) -> impl Future<Output = Result<E, <Self as StoreBackend>::Error>> + Send + '_;

  /// Delete a record and everything that cascades from it, atomically.
  /// Returns `false` if there was nothing to delete.
  fn delete(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, <Self as StoreBackend>::Error>> + Send + '_;

  /// The oldest record with this fingerprint. Always `None` for kinds
  /// without fingerprints.
  fn find_by_fingerprint(
    &self,
    fingerprint: String,
  ) -> impl Future<Output = Result<Option<E>, <Self as StoreBackend>::Error>> + Send + '_;

  /// Insert or overwrite a record exactly as given, timestamps included.
  /// Used by import, where the incoming `updated_at` must survive.
  fn put(
    &self,
    entity: E,
  ) -> impl Future<Output = Result<E, <Self as StoreBackend>::Error>> + Send + '_;
}

/// Busy flags for whole-store operations. Every handle onto one store must
/// return the same flags, so clones share them.
#[derive(Debug, Clone, Default)]
pub struct MergeLocks {
  pub importing: Arc<AtomicBool>,
  pub exporting: Arc<AtomicBool>,
}

/// A complete debate store: every repository plus store-wide operations.
pub trait DebateStore:
  Repository<Topic>
  + Repository<Claim>
  + Repository<Rebuttal>
  + Repository<Evidence>
  + Repository<Source>
  + Repository<Question>
  + Repository<Tag>
  + Repository<Fallacy>
{
  /// The import/export flags shared by every handle onto this store.
  fn merge_locks(&self) -> &MergeLocks;

  /// The schema version the store is at.
  fn schema_version(
    &self,
  ) -> impl Future<Output = Result<u32, <Self as StoreBackend>::Error>> + Send + '_;

  /// Delete questions whose target is neither a topic nor a claim.
  /// Returns the number deleted.
  fn cleanup_orphan_questions(
    &self,
  ) -> impl Future<Output = Result<usize, <Self as StoreBackend>::Error>> + Send + '_;

  /// Resolve a question's bare `target_id` into a typed reference.
  fn resolve_target(
    &self,
    target_id: Uuid,
  ) -> impl Future<Output = Result<Option<TargetRef>, <Self as StoreBackend>::Error>> + Send + '_;
}
