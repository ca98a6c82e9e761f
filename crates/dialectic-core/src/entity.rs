//! The [`Entity`] trait shared by every record type in the store.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use uuid::Uuid;

use crate::Result;

/// Discriminates the eight record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
  Topic,
  Claim,
  Rebuttal,
  Evidence,
  Source,
  Question,
  Tag,
  Fallacy,
}

impl EntityKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Topic => "topic",
      Self::Claim => "claim",
      Self::Rebuttal => "rebuttal",
      Self::Evidence => "evidence",
      Self::Source => "source",
      Self::Question => "question",
      Self::Tag => "tag",
      Self::Fallacy => "fallacy",
    }
  }
}

impl fmt::Display for EntityKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A persisted record with a stable id and lifetime timestamps.
///
/// Implementors own their canonicalisation: [`Entity::refresh`] recomputes
/// derived fields (fingerprints, de-duplicated reference sets) and must be
/// called before every write so that stored derived data is always a function
/// of stored content.
pub trait Entity:
  Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
  const KIND: EntityKind;

  /// Caller-supplied fields for [`crate::store::Repository::create`].
  type Draft: Send + 'static;

  /// Build a new record from a draft. Validates and refreshes.
  fn from_draft(id: Uuid, draft: Self::Draft, now: DateTime<Utc>) -> Result<Self>;

  fn id(&self) -> Uuid;
  fn created_at(&self) -> DateTime<Utc>;
  fn updated_at(&self) -> DateTime<Utc>;
  fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>);

  /// Reject blank required text and out-of-range values.
  fn validate(&self) -> Result<()>;

  /// Recompute derived fields from content.
  fn refresh(&mut self) {}

  /// Duplicate-detection key, for kinds that carry one.
  fn fingerprint(&self) -> Option<&str> { None }

  /// Text compared when scanning for near-duplicates, for kinds that take
  /// part in fuzzy matching.
  fn match_text(&self) -> Option<&str> { None }
}
