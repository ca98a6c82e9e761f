//! Built-in fallacy catalog and the name → id lookup cache.
//!
//! Catalog ids are UUID v5 over the normalised fallacy name, so every store
//! seeds identical ids and snapshots can reference catalog entries across
//! installs without shipping them.

use std::{
  collections::HashMap,
  sync::{Mutex, PoisonError},
};

use uuid::Uuid;

use crate::text::normalize;

/// Namespace for fallacy ids derived from names.
const FALLACY_NAMESPACE: Uuid = Uuid::from_u128(0x6c1f_54b2_8d0e_4a57_9b3c_2f71_d4e0_a915);

/// A static catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
  pub name:        &'static str,
  pub description: &'static str,
  pub example:     &'static str,
  pub category:    &'static str,
}

pub const ENTRIES: &[CatalogEntry] = &[
  CatalogEntry {
    name:        "Ad Hominem",
    description: "Attacking the person making the argument instead of the argument itself.",
    example:     "You can't trust his climate data, he's never even finished college.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Straw Man",
    description: "Misrepresenting an argument to make it easier to attack.",
    example:     "You want safer roads? So you want to ban all cars.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Red Herring",
    description: "Introducing an irrelevant point to divert attention from the issue.",
    example:     "Why worry about pollution when there are so many unemployed people?",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Tu Quoque",
    description: "Deflecting criticism by accusing the critic of the same fault.",
    example:     "You say I should stop smoking, but you smoke too.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Appeal to Authority",
    description: "Treating a claim as true because an authority figure endorses it.",
    example:     "A famous actor says this diet works, so it must.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Appeal to Emotion",
    description: "Manipulating feelings in place of offering a valid argument.",
    example:     "Think of the children! We must pass this law.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "Bandwagon",
    description: "Arguing that something is true or good because many people believe it.",
    example:     "Everyone is buying this stock, so it is a sound investment.",
    category:    "relevance",
  },
  CatalogEntry {
    name:        "False Dilemma",
    description: "Presenting two options as the only possibilities when more exist.",
    example:     "Either you support this war or you hate your country.",
    category:    "presumption",
  },
  CatalogEntry {
    name:        "Slippery Slope",
    description: "Claiming a small first step will inevitably lead to extreme consequences.",
    example:     "If we allow same-day refunds, soon nobody will pay for anything.",
    category:    "presumption",
  },
  CatalogEntry {
    name:        "Circular Reasoning",
    description: "Using the conclusion as one of the premises.",
    example:     "The book is true because the book says it is true.",
    category:    "presumption",
  },
  CatalogEntry {
    name:        "Hasty Generalization",
    description: "Drawing a broad conclusion from a small or unrepresentative sample.",
    example:     "Two of my neighbours were rude, so people in this city are rude.",
    category:    "induction",
  },
  CatalogEntry {
    name:        "Post Hoc",
    description: "Assuming that because one event followed another, it was caused by it.",
    example:     "I wore my lucky socks and we won, so the socks caused the win.",
    category:    "causal",
  },
];

/// Memoised name → id derivation for fallacies.
///
/// An explicit object rather than global state: the store owns one for its
/// lifetime and hands it to the migration engine, so lifetime and
/// invalidation are visible at the call sites.
#[derive(Debug, Default)]
pub struct FallacyCatalog {
  ids: Mutex<HashMap<String, Uuid>>,
}

impl FallacyCatalog {
  pub fn new() -> Self { Self::default() }

  /// Lookup key for a fallacy name.
  pub fn key(name: &str) -> String { normalize(name) }

  /// Deterministic id for `name`. Names differing only by case, accents or
  /// punctuation share an id.
  pub fn id_for(&self, name: &str) -> Uuid {
    let key = Self::key(name);
    let mut ids = self.ids.lock().unwrap_or_else(PoisonError::into_inner);
    *ids
      .entry(key)
      .or_insert_with_key(|k| Uuid::new_v5(&FALLACY_NAMESPACE, k.as_bytes()))
  }

  /// The built-in entry matching `name`, if any.
  pub fn entry(&self, name: &str) -> Option<&'static CatalogEntry> {
    let key = Self::key(name);
    ENTRIES.iter().find(|e| Self::key(e.name) == key)
  }

  pub fn entries(&self) -> &'static [CatalogEntry] { ENTRIES }

  /// Number of memoised names.
  pub fn cached(&self) -> usize {
    self.ids.lock().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Drop every memoised id.
  pub fn clear(&self) {
    self.ids.lock().unwrap_or_else(PoisonError::into_inner).clear();
  }
}
