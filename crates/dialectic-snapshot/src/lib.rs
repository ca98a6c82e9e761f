//! Snapshot codec for Dialectic.
//!
//! A snapshot is a self-describing JSON document holding every entity of a
//! store, used for backup and for merging data between stores. Pure
//! synchronous; no database dependencies.
//!
//! Decoding is two-level. The envelope (format version, export time, entity
//! arrays) is checked strictly and rejected as a whole if the version is not
//! [`FORMAT_VERSION`]. Individual entities stay as [`RawItem`]s until the
//! caller decodes them one by one, so a single malformed record cannot fail
//! the document.
//!
//! # Quick start
//!
//! ```no_run
//! use dialectic_snapshot::{Entities, Snapshot, decode, encode};
//!
//! let bytes = encode(&Snapshot::new(Entities::default())).unwrap();
//! let raw = decode(&bytes).unwrap();
//! assert_eq!(raw.entities.len(), 0);
//! ```

mod decode;
mod encode;
pub mod error;

use chrono::{DateTime, Utc};
use dialectic_core::{
  EntityKind,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, Topic},
};
pub use error::{Error, Result};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// The only format version this codec reads and writes.
pub const FORMAT_VERSION: &str = "1.0";

// ─── Typed snapshot (export side) ────────────────────────────────────────────

/// A complete, typed snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
  pub format_version: String,
  pub exported_at:    DateTime<Utc>,
  pub entities:       Entities,
}

impl Snapshot {
  /// Wrap `entities` with the current format version and time.
  pub fn new(entities: Entities) -> Self {
    Self {
      format_version: FORMAT_VERSION.to_owned(),
      exported_at: Utc::now(),
      entities,
    }
  }
}

/// Every entity of a store, grouped by kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Entities {
  pub topics:    Vec<Topic>,
  pub claims:    Vec<Claim>,
  pub rebuttals: Vec<Rebuttal>,
  pub evidences: Vec<Evidence>,
  pub questions: Vec<Question>,
  pub sources:   Vec<Source>,
  pub tags:      Vec<Tag>,
  /// User-created fallacies only; catalog entries are seeded by every store.
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub fallacies: Vec<Fallacy>,
}

impl Entities {
  pub fn len(&self) -> usize {
    self.topics.len()
      + self.claims.len()
      + self.rebuttals.len()
      + self.evidences.len()
      + self.questions.len()
      + self.sources.len()
      + self.tags.len()
      + self.fallacies.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

// ─── Raw snapshot (import side) ──────────────────────────────────────────────

/// A version-checked snapshot whose entities are not yet decoded.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnapshot {
  pub format_version: String,
  /// `None` when absent or not an RFC 3339 timestamp; the field is
  /// informational and never fails a document.
  #[serde(default, deserialize_with = "lenient_timestamp")]
  pub exported_at:    Option<DateTime<Utc>>,
  #[serde(default)]
  pub entities:       RawEntities,
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = Option::<serde_json::Value>::deserialize(deserializer)?;
  Ok(
    value
      .as_ref()
      .and_then(serde_json::Value::as_str)
      .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
      .map(|at| at.with_timezone(&Utc)),
  )
}

/// Undecoded entity arrays. Missing arrays are empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawEntities {
  pub topics:    Vec<RawItem>,
  pub claims:    Vec<RawItem>,
  pub rebuttals: Vec<RawItem>,
  pub evidences: Vec<RawItem>,
  pub questions: Vec<RawItem>,
  pub sources:   Vec<RawItem>,
  pub tags:      Vec<RawItem>,
  pub fallacies: Vec<RawItem>,
}

impl RawEntities {
  /// Move the items of one kind out, leaving that array empty.
  pub fn take(&mut self, kind: EntityKind) -> Vec<RawItem> {
    let items = match kind {
      EntityKind::Topic => &mut self.topics,
      EntityKind::Claim => &mut self.claims,
      EntityKind::Rebuttal => &mut self.rebuttals,
      EntityKind::Evidence => &mut self.evidences,
      EntityKind::Question => &mut self.questions,
      EntityKind::Source => &mut self.sources,
      EntityKind::Tag => &mut self.tags,
      EntityKind::Fallacy => &mut self.fallacies,
    };
    std::mem::take(items)
  }

  pub fn len(&self) -> usize {
    self.topics.len()
      + self.claims.len()
      + self.rebuttals.len()
      + self.evidences.len()
      + self.questions.len()
      + self.sources.len()
      + self.tags.len()
      + self.fallacies.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// One undecoded entity.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct RawItem(serde_json::Value);

impl RawItem {
  /// The item's `id` field as written, for keying error messages.
  pub fn id(&self) -> Option<&str> { self.0.get("id").and_then(|v| v.as_str()) }

  /// Decode into a typed entity.
  pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
    Ok(serde_json::from_value(self.0)?)
  }
}

impl From<serde_json::Value> for RawItem {
  fn from(value: serde_json::Value) -> Self { Self(value) }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Serialise `snapshot` as pretty-printed JSON.
pub fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> { encode::encode(snapshot) }

/// Parse a snapshot document, rejecting unsupported format versions before
/// anything else is interpreted.
pub fn decode(bytes: &[u8]) -> Result<RawSnapshot> { decode::decode(bytes) }
