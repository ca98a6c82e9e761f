//! Record types of the debate knowledge base.
//!
//! Every record serialises with camelCase field names; this is also the
//! snapshot wire shape. Reference sets (`tags`, `topic_ids`, `fallacy_ids`)
//! are ordered and de-duplicated on [`Entity::refresh`].

use std::{collections::HashSet, hash::Hash};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  entity::{Entity, EntityKind},
  fingerprint::{composite, fingerprint},
  labels::{EvidenceType, Posture, Quality, QuestionKind, Stance, Strength},
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn require(entity: &'static str, field: &'static str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::Blank { entity, field });
  }
  Ok(())
}

fn dedup_in_order<T: Eq + Hash + Clone>(items: &mut Vec<T>) {
  let mut seen = HashSet::with_capacity(items.len());
  items.retain(|item| seen.insert(item.clone()));
}

macro_rules! timestamps {
  () => {
    fn id(&self) -> Uuid { self.id }

    fn created_at(&self) -> DateTime<Utc> { self.created_at }

    fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
      self.created_at = created_at;
      self.updated_at = updated_at;
    }
  };
}

// ─── Topic ───────────────────────────────────────────────────────────────────

/// A debate subject that groups claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
  pub id:          Uuid,
  pub title:       String,
  #[serde(default)]
  pub summary:     String,
  #[serde(default)]
  pub posture:     Posture,
  /// Tag labels, in display order.
  #[serde(default)]
  pub tags:        Vec<String>,
  #[serde(default)]
  pub fingerprint: Option<String>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Topic {
  pub fn fingerprint_of(title: &str) -> String { fingerprint(title) }
}

/// Input to `Repository::<Topic>::create`.
#[derive(Debug, Clone, Default)]
pub struct NewTopic {
  pub title:   String,
  pub summary: String,
  pub posture: Posture,
  pub tags:    Vec<String>,
}

impl NewTopic {
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }
}

impl Entity for Topic {
  const KIND: EntityKind = EntityKind::Topic;
  type Draft = NewTopic;

  fn from_draft(id: Uuid, draft: NewTopic, now: DateTime<Utc>) -> Result<Self> {
    let mut topic = Self {
      id,
      title: draft.title,
      summary: draft.summary,
      posture: draft.posture,
      tags: draft.tags,
      fingerprint: None,
      created_at: now,
      updated_at: now,
    };
    topic.refresh();
    topic.validate()?;
    Ok(topic)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("topic", "title", &self.title) }

  fn refresh(&mut self) {
    for tag in &mut self.tags {
      *tag = tag.trim().to_owned();
    }
    self.tags.retain(|t| !t.is_empty());
    dedup_in_order(&mut self.tags);
    self.fingerprint = Some(Self::fingerprint_of(&self.title));
  }

  fn fingerprint(&self) -> Option<&str> { self.fingerprint.as_deref() }

  fn match_text(&self) -> Option<&str> { Some(&self.title) }
}

// ─── Claim ───────────────────────────────────────────────────────────────────

/// An assertion made within one or more topics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
  pub id:          Uuid,
  pub text:        String,
  #[serde(default)]
  pub stance:      Stance,
  #[serde(default)]
  pub strength:    Strength,
  #[serde(default)]
  pub topic_ids:   Vec<Uuid>,
  #[serde(default)]
  pub fallacy_ids: Vec<Uuid>,
  /// Derived from `text`; recomputed on every write.
  #[serde(default)]
  pub fingerprint: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Claim {
  pub fn fingerprint_of(text: &str) -> String { fingerprint(text) }
}

#[derive(Debug, Clone, Default)]
pub struct NewClaim {
  pub text:        String,
  pub stance:      Stance,
  pub strength:    Strength,
  pub topic_ids:   Vec<Uuid>,
  pub fallacy_ids: Vec<Uuid>,
}

impl NewClaim {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), ..Self::default() }
  }
}

impl Entity for Claim {
  const KIND: EntityKind = EntityKind::Claim;
  type Draft = NewClaim;

  fn from_draft(id: Uuid, draft: NewClaim, now: DateTime<Utc>) -> Result<Self> {
    let mut claim = Self {
      id,
      text: draft.text,
      stance: draft.stance,
      strength: draft.strength,
      topic_ids: draft.topic_ids,
      fallacy_ids: draft.fallacy_ids,
      fingerprint: String::new(),
      created_at: now,
      updated_at: now,
    };
    claim.refresh();
    claim.validate()?;
    Ok(claim)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("claim", "text", &self.text) }

  fn refresh(&mut self) {
    dedup_in_order(&mut self.topic_ids);
    dedup_in_order(&mut self.fallacy_ids);
    self.fingerprint = Self::fingerprint_of(&self.text);
  }

  fn fingerprint(&self) -> Option<&str> { Some(&self.fingerprint) }

  fn match_text(&self) -> Option<&str> { Some(&self.text) }
}

// ─── Rebuttal ────────────────────────────────────────────────────────────────

/// A response to a claim. Deleted with its claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rebuttal {
  pub id:          Uuid,
  pub claim_id:    Uuid,
  pub text:        String,
  #[serde(default)]
  pub fallacy_ids: Vec<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRebuttal {
  pub claim_id:    Uuid,
  pub text:        String,
  pub fallacy_ids: Vec<Uuid>,
}

impl NewRebuttal {
  pub fn new(claim_id: Uuid, text: impl Into<String>) -> Self {
    Self { claim_id, text: text.into(), fallacy_ids: Vec::new() }
  }
}

impl Entity for Rebuttal {
  const KIND: EntityKind = EntityKind::Rebuttal;
  type Draft = NewRebuttal;

  fn from_draft(id: Uuid, draft: NewRebuttal, now: DateTime<Utc>) -> Result<Self> {
    let mut rebuttal = Self {
      id,
      claim_id: draft.claim_id,
      text: draft.text,
      fallacy_ids: draft.fallacy_ids,
      created_at: now,
      updated_at: now,
    };
    rebuttal.refresh();
    rebuttal.validate()?;
    Ok(rebuttal)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("rebuttal", "text", &self.text) }

  fn refresh(&mut self) { dedup_in_order(&mut self.fallacy_ids); }
}

// ─── Evidence ────────────────────────────────────────────────────────────────

/// Support for a claim, optionally attributed to a source.
///
/// Deleted with its claim; `source_id` is cleared when the source goes away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
  pub id:         Uuid,
  pub claim_id:   Uuid,
  pub content:    String,
  #[serde(rename = "type", default)]
  pub kind:       EvidenceType,
  #[serde(default)]
  pub quality:    Quality,
  #[serde(default)]
  pub source_id:  Option<Uuid>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEvidence {
  pub claim_id:  Uuid,
  pub content:   String,
  pub kind:      EvidenceType,
  pub quality:   Quality,
  pub source_id: Option<Uuid>,
}

impl NewEvidence {
  pub fn new(claim_id: Uuid, content: impl Into<String>) -> Self {
    Self {
      claim_id,
      content: content.into(),
      kind: EvidenceType::default(),
      quality: Quality::default(),
      source_id: None,
    }
  }
}

impl Entity for Evidence {
  const KIND: EntityKind = EntityKind::Evidence;
  type Draft = NewEvidence;

  fn from_draft(id: Uuid, draft: NewEvidence, now: DateTime<Utc>) -> Result<Self> {
    let evidence = Self {
      id,
      claim_id: draft.claim_id,
      content: draft.content,
      kind: draft.kind,
      quality: draft.quality,
      source_id: draft.source_id,
      created_at: now,
      updated_at: now,
    };
    evidence.validate()?;
    Ok(evidence)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("evidence", "content", &self.content) }
}

// ─── Source ──────────────────────────────────────────────────────────────────

/// A bibliographic reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
  pub id:          Uuid,
  pub title:       String,
  pub citation:    Option<String>,
  pub url:         Option<String>,
  pub publisher:   Option<String>,
  /// Free-form publication date as written in the reference.
  pub date:        Option<String>,
  pub notes:       Option<String>,
  /// Author-assessed reliability in `[0.0, 1.0]`.
  pub reliability: Option<f64>,
  #[serde(default)]
  pub fingerprint: String,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Source {
  /// Composite fingerprint: the title, plus url, publisher and date when
  /// they are filled in.
  pub fn fingerprint_of(
    title: &str,
    url: Option<&str>,
    publisher: Option<&str>,
    date: Option<&str>,
  ) -> String {
    let optional = [url, publisher, date]
      .into_iter()
      .flatten()
      .filter(|s| !s.trim().is_empty());
    composite(std::iter::once(title).chain(optional))
  }
}

#[derive(Debug, Clone, Default)]
pub struct NewSource {
  pub title:       String,
  pub citation:    Option<String>,
  pub url:         Option<String>,
  pub publisher:   Option<String>,
  pub date:        Option<String>,
  pub notes:       Option<String>,
  pub reliability: Option<f64>,
}

impl NewSource {
  pub fn new(title: impl Into<String>) -> Self {
    Self { title: title.into(), ..Self::default() }
  }
}

impl Entity for Source {
  const KIND: EntityKind = EntityKind::Source;
  type Draft = NewSource;

  fn from_draft(id: Uuid, draft: NewSource, now: DateTime<Utc>) -> Result<Self> {
    let mut source = Self {
      id,
      title: draft.title,
      citation: draft.citation,
      url: draft.url,
      publisher: draft.publisher,
      date: draft.date,
      notes: draft.notes,
      reliability: draft.reliability,
      fingerprint: String::new(),
      created_at: now,
      updated_at: now,
    };
    source.refresh();
    source.validate()?;
    Ok(source)
  }

  timestamps!();

  fn validate(&self) -> Result<()> {
    require("source", "title", &self.title)?;
    if let Some(r) = self.reliability
      && !(0.0..=1.0).contains(&r)
    {
      return Err(Error::ReliabilityOutOfRange(r));
    }
    Ok(())
  }

  fn refresh(&mut self) {
    self.fingerprint = Self::fingerprint_of(
      &self.title,
      self.url.as_deref(),
      self.publisher.as_deref(),
      self.date.as_deref(),
    );
  }

  fn fingerprint(&self) -> Option<&str> { Some(&self.fingerprint) }

  fn match_text(&self) -> Option<&str> { Some(&self.title) }
}

// ─── Question ────────────────────────────────────────────────────────────────

/// What a question is about. Persisted as a bare id; the store resolves the
/// kind by lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum TargetRef {
  Topic(Uuid),
  Claim(Uuid),
}

impl TargetRef {
  pub fn id(self) -> Uuid {
    match self {
      Self::Topic(id) | Self::Claim(id) => id,
    }
  }
}

/// A prompt for further thought about a topic or claim.
///
/// `target_id` is not backed by a foreign key; questions whose target
/// disappears are removed by `DebateStore::cleanup_orphan_questions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
  pub id:         Uuid,
  pub target_id:  Uuid,
  pub text:       String,
  #[serde(default)]
  pub kind:       QuestionKind,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub target: TargetRef,
  pub text:   String,
  pub kind:   QuestionKind,
}

impl NewQuestion {
  pub fn new(target: TargetRef, text: impl Into<String>) -> Self {
    Self { target, text: text.into(), kind: QuestionKind::default() }
  }
}

impl Entity for Question {
  const KIND: EntityKind = EntityKind::Question;
  type Draft = NewQuestion;

  fn from_draft(id: Uuid, draft: NewQuestion, now: DateTime<Utc>) -> Result<Self> {
    let question = Self {
      id,
      target_id: draft.target.id(),
      text: draft.text,
      kind: draft.kind,
      created_at: now,
      updated_at: now,
    };
    question.validate()?;
    Ok(question)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("question", "text", &self.text) }
}

// ─── Tag ─────────────────────────────────────────────────────────────────────

/// A label topics can carry. Labels are unique, ignoring ASCII case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
  pub id:         Uuid,
  pub label:      String,
  pub color:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTag {
  pub label: String,
  pub color: Option<String>,
}

impl NewTag {
  pub fn new(label: impl Into<String>) -> Self {
    Self { label: label.into(), color: None }
  }
}

impl Entity for Tag {
  const KIND: EntityKind = EntityKind::Tag;
  type Draft = NewTag;

  fn from_draft(id: Uuid, draft: NewTag, now: DateTime<Utc>) -> Result<Self> {
    let mut tag = Self {
      id,
      label: draft.label,
      color: draft.color,
      created_at: now,
      updated_at: now,
    };
    tag.refresh();
    tag.validate()?;
    Ok(tag)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("tag", "label", &self.label) }

  fn refresh(&mut self) { self.label = self.label.trim().to_owned(); }
}

// ─── Fallacy ─────────────────────────────────────────────────────────────────

/// A reasoning error. Catalog entries are seeded by the schema; users may add
/// their own (`is_custom`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fallacy {
  pub id:          Uuid,
  pub name:        String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub example:     String,
  #[serde(default)]
  pub category:    String,
  #[serde(default)]
  pub is_custom:   bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewFallacy {
  pub name:        String,
  pub description: String,
  pub example:     String,
  pub category:    String,
}

impl NewFallacy {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Self::default() }
  }
}

impl Entity for Fallacy {
  const KIND: EntityKind = EntityKind::Fallacy;
  type Draft = NewFallacy;

  /// Fallacies created through the repository are always custom.
  fn from_draft(id: Uuid, draft: NewFallacy, now: DateTime<Utc>) -> Result<Self> {
    let fallacy = Self {
      id,
      name: draft.name,
      description: draft.description,
      example: draft.example,
      category: draft.category,
      is_custom: true,
      created_at: now,
      updated_at: now,
    };
    fallacy.validate()?;
    Ok(fallacy)
  }

  timestamps!();

  fn validate(&self) -> Result<()> { require("fallacy", "name", &self.name) }
}
