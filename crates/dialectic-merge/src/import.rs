//! Classification and writing of incoming records.

use dialectic_core::{
  Entity, EntityKind,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, Topic},
  similarity::similarity,
  store::{DebateStore, Repository},
};
use dialectic_snapshot::{RawItem, RawSnapshot};
use uuid::Uuid;

use crate::{
  Error, Result,
  report::{ItemError, MergeReport, NearDuplicate, Outcome},
};

/// Merge every record of `snapshot`, kind by kind, in dependency order.
pub(crate) async fn run<S: DebateStore>(
  store: &S,
  snapshot: RawSnapshot,
  threshold: f64,
) -> Result<MergeReport> {
  let mut entities = snapshot.entities;
  let mut report = MergeReport::default();
  tracing::info!(
    records = entities.len(),
    exported_at = ?snapshot.exported_at,
    threshold,
    "importing snapshot"
  );

  merge_kind::<Fallacy, S>(store, entities.take(EntityKind::Fallacy), threshold, &mut report).await?;
  merge_kind::<Tag, S>(store, entities.take(EntityKind::Tag), threshold, &mut report).await?;
  merge_kind::<Source, S>(store, entities.take(EntityKind::Source), threshold, &mut report).await?;
  merge_kind::<Topic, S>(store, entities.take(EntityKind::Topic), threshold, &mut report).await?;
  merge_kind::<Claim, S>(store, entities.take(EntityKind::Claim), threshold, &mut report).await?;
  merge_kind::<Rebuttal, S>(store, entities.take(EntityKind::Rebuttal), threshold, &mut report)
    .await?;
  merge_kind::<Evidence, S>(store, entities.take(EntityKind::Evidence), threshold, &mut report)
    .await?;
  merge_kind::<Question, S>(store, entities.take(EntityKind::Question), threshold, &mut report)
    .await?;

  tracing::info!(
    total = report.total,
    created = report.created,
    updated = report.updated,
    duplicates = report.duplicates,
    near_duplicates = report.near_duplicates,
    errors = report.errors,
    "import finished"
  );
  Ok(report)
}

/// Existing `(id, match text)` pairs of one kind, loaded on first use and
/// extended with every record this import creates.
struct MatchPool {
  loaded:  bool,
  entries: Vec<(Uuid, String)>,
}

impl MatchPool {
  fn new() -> Self { Self { loaded: false, entries: Vec::new() } }

  async fn load<E, S>(&mut self, store: &S) -> Result<()>
  where
    E: Entity,
    S: Repository<E>,
  {
    if !self.loaded {
      let existing = store.list().await.map_err(Error::store)?;
      self.entries = existing
        .iter()
        .filter_map(|e| e.match_text().map(|t| (e.id(), t.to_owned())))
        .collect();
      self.loaded = true;
    }
    Ok(())
  }

  /// The most similar entry, ties going to the earliest.
  fn best(&self, text: &str) -> Option<(Uuid, f64)> {
    self
      .entries
      .iter()
      .map(|(id, other)| (*id, similarity(text, other)))
      .fold(None, |best, (id, score)| match best {
        Some((_, top)) if top >= score => best,
        _ => Some((id, score)),
      })
  }
}

async fn merge_kind<E, S>(
  store: &S,
  items: Vec<RawItem>,
  threshold: f64,
  report: &mut MergeReport,
) -> Result<()>
where
  E: Entity,
  S: Repository<E>,
{
  if items.is_empty() {
    return Ok(());
  }

  let mut pool = MatchPool::new();
  for item in items {
    let raw_id = item.id().map(str::to_owned);
    let outcome = match classify::<E, S>(store, item, threshold, &mut pool).await {
      Ok(outcome) => outcome,
      Err(Failure::Store(err)) => return Err(err),
      Err(Failure::Item(message)) => {
        let error = ItemError { kind: E::KIND, id: raw_id, message };
        tracing::warn!(%error, "record not imported");
        Outcome::Failed(error)
      }
    };
    tracing::debug!(kind = %E::KIND, ?outcome, "classified record");
    report.record(outcome);
  }
  Ok(())
}

/// Why a record was not classified.
enum Failure {
  /// This record is bad; carry on with the next.
  Item(String),
  /// The store cannot serve reads; stop the import.
  Store(Error),
}

fn item_failure(err: impl std::fmt::Display) -> Failure { Failure::Item(err.to_string()) }

/// Decide what to do with one incoming record and do it.
///
/// Precedence: same id (newer wins), then same fingerprint, then a similar
/// match text, otherwise a new record.
async fn classify<E, S>(
  store: &S,
  item: RawItem,
  threshold: f64,
  pool: &mut MatchPool,
) -> Result<Outcome, Failure>
where
  E: Entity,
  S: Repository<E>,
{
  let mut incoming: E = item.decode().map_err(item_failure)?;
  incoming.refresh();
  incoming.validate().map_err(item_failure)?;

  if let Some(existing) = store.get(incoming.id()).await.map_err(item_failure)? {
    if incoming.updated_at() > existing.updated_at() {
      store.put(incoming).await.map_err(item_failure)?;
      return Ok(Outcome::Updated);
    }
    return Ok(Outcome::Duplicate);
  }

  if let Some(fingerprint) = incoming.fingerprint()
    && store
      .find_by_fingerprint(fingerprint.to_owned())
      .await
      .map_err(item_failure)?
      .is_some()
  {
    return Ok(Outcome::Duplicate);
  }

  let match_text = incoming.match_text().map(str::to_owned);
  if let Some(text) = &match_text {
    pool.load::<E, S>(store).await.map_err(Failure::Store)?;
    if let Some((existing_id, score)) = pool.best(text)
      && score >= threshold
    {
      return Ok(Outcome::NearDuplicate(NearDuplicate {
        kind: E::KIND,
        incoming_id: incoming.id(),
        existing_id,
        score,
      }));
    }
  }

  let written = store.put(incoming).await.map_err(item_failure)?;
  if let Some(text) = match_text {
    pool.entries.push((written.id(), text));
  }
  Ok(Outcome::Created)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn best_match_prefers_highest_then_earliest() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let pool = MatchPool {
      loaded:  true,
      entries: vec![
        (a, "nuclear power is safe".into()),
        (b, "wind power is cheap".into()),
        (c, "wind power is cheap".into()),
      ],
    };
    let (id, score) = pool.best("Wind power is cheap!").unwrap();
    assert_eq!(id, b);
    assert_eq!(score, 1.0);
    assert!(MatchPool::new().best("anything").is_none());
  }
}
