//! The outcome of an import.

use std::fmt;

use dialectic_core::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-outcome counts plus the details a person needs to follow up.
///
/// `total` always equals `created + updated + duplicates + near_duplicates +
/// errors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeReport {
  pub total:           usize,
  pub created:         usize,
  pub updated:         usize,
  pub duplicates:      usize,
  pub near_duplicates: usize,
  pub errors:          usize,
  pub error_messages:  Vec<ItemError>,
  /// Records held back for review because they closely resemble existing
  /// ones. Never written.
  pub candidates:      Vec<NearDuplicate>,
}

impl MergeReport {
  pub(crate) fn record(&mut self, outcome: Outcome) {
    self.total += 1;
    match outcome {
      Outcome::Created => self.created += 1,
      Outcome::Updated => self.updated += 1,
      Outcome::Duplicate => self.duplicates += 1,
      Outcome::NearDuplicate(candidate) => {
        self.near_duplicates += 1;
        self.candidates.push(candidate);
      }
      Outcome::Failed(error) => {
        self.errors += 1;
        self.error_messages.push(error);
      }
    }
  }
}

impl fmt::Display for MergeReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} records: {} created, {} updated, {} duplicates, {} near-duplicates, {} errors",
      self.total, self.created, self.updated, self.duplicates, self.near_duplicates, self.errors
    )
  }
}

/// How one incoming record was handled.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Outcome {
  Created,
  Updated,
  Duplicate,
  NearDuplicate(NearDuplicate),
  Failed(ItemError),
}

/// A record that could not be merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
  pub kind:    EntityKind,
  /// The id as written in the snapshot, when there was one.
  pub id:      Option<String>,
  pub message: String,
}

impl fmt::Display for ItemError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}: {}", self.kind, self.id.as_deref().unwrap_or("<no id>"), self.message)
  }
}

/// An incoming record that scored at or above the similarity threshold
/// against an existing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearDuplicate {
  pub kind:        EntityKind,
  pub incoming_id: Uuid,
  pub existing_id: Uuid,
  pub score:       f64,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn total_tracks_every_outcome() {
    let mut report = MergeReport::default();
    report.record(Outcome::Created);
    report.record(Outcome::Updated);
    report.record(Outcome::Duplicate);
    report.record(Outcome::NearDuplicate(NearDuplicate {
      kind:        EntityKind::Claim,
      incoming_id: Uuid::nil(),
      existing_id: Uuid::nil(),
      score:       0.93,
    }));
    report.record(Outcome::Failed(ItemError {
      kind:    EntityKind::Tag,
      id:      None,
      message: "bad".into(),
    }));

    assert_eq!(report.total, 5);
    assert_eq!(
      report.total,
      report.created + report.updated + report.duplicates + report.near_duplicates + report.errors
    );
    assert_eq!(report.error_messages[0].to_string(), "tag <no id>: bad");
  }

  #[test]
  fn serializes_camel_case() {
    let json = serde_json::to_value(MergeReport::default()).unwrap();
    assert!(json.get("nearDuplicates").is_some());
    assert!(json.get("errorMessages").is_some());
  }
}
