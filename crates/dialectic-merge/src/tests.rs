//! Import/export tests against an in-memory `SqliteStore`.

use chrono::{DateTime, Utc};
use dialectic_core::{
  EntityKind,
  model::{
    Claim, Evidence, Fallacy, NewClaim, NewEvidence, NewFallacy, NewQuestion, NewRebuttal,
    NewSource, NewTag, NewTopic, Question, Rebuttal, Source, Tag, TargetRef, Topic,
  },
  store::{DebateStore, Repository},
};
use dialectic_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{Error, Flight, MergeEngine};

const THRESHOLD: f64 = 0.90;

async fn engine() -> MergeEngine<SqliteStore> {
  MergeEngine::new(SqliteStore::open_in_memory().await.expect("in-memory store"))
}

fn document(entities: Value) -> Vec<u8> {
  serde_json::to_vec(&json!({
    "formatVersion": "1.0",
    "exportedAt": "2024-06-01T12:00:00Z",
    "entities": entities,
  }))
  .unwrap()
}

fn claim_json(id: Uuid, text: &str, updated_at: &str) -> Value {
  json!({
    "id": id,
    "text": text,
    "stance": "pro",
    "strength": "medium",
    "createdAt": "2024-01-01T00:00:00Z",
    "updatedAt": updated_at,
  })
}

fn ts(s: &str) -> DateTime<Utc> { DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc) }

async fn claims(engine: &MergeEngine<SqliteStore>) -> Vec<Claim> {
  Repository::<Claim>::list(engine.store()).await.unwrap()
}

// ─── Classification ──────────────────────────────────────────────────────────

#[tokio::test]
async fn reimporting_the_same_snapshot_creates_nothing() {
  let engine = engine().await;
  let bytes = document(json!({
    "topics": [{
      "id": Uuid::new_v4(),
      "title": "Universal basic income",
      "summary": "Should every adult receive an unconditional payment?",
      "posture": "neutral_critical",
      "createdAt": "2024-05-01T10:00:00Z",
      "updatedAt": "2024-05-01T10:00:00Z",
    }]
  }));

  let first = engine.import(bytes.clone(), THRESHOLD).await.unwrap();
  assert_eq!((first.total, first.created, first.duplicates), (1, 1, 0));

  let second = engine.import(bytes, THRESHOLD).await.unwrap();
  assert_eq!((second.total, second.created, second.duplicates), (1, 0, 1));
  assert_eq!(Repository::<Topic>::list(engine.store()).await.unwrap().len(), 1);
}

#[tokio::test]
async fn only_a_strictly_newer_record_overwrites() {
  let engine = engine().await;
  let id = Uuid::new_v4();
  let seed = document(json!({ "claims": [claim_json(id, "Original", "2024-02-01T00:00:00Z")] }));
  engine.import(seed, THRESHOLD).await.unwrap();

  let newer = document(json!({ "claims": [claim_json(id, "Revised", "2024-03-01T00:00:00Z")] }));
  let report = engine.import(newer, THRESHOLD).await.unwrap();
  assert_eq!(report.updated, 1);
  let stored = Repository::<Claim>::get(engine.store(), id).await.unwrap().unwrap();
  assert_eq!(stored.text, "Revised");
  assert_eq!(stored.updated_at, ts("2024-03-01T00:00:00Z"));
  assert_eq!(stored.fingerprint, Claim::fingerprint_of("revised"));

  for (text, at) in [("Older", "2024-01-15T00:00:00Z"), ("Same time", "2024-03-01T00:00:00Z")] {
    let stale = document(json!({ "claims": [claim_json(id, text, at)] }));
    let report = engine.import(stale, THRESHOLD).await.unwrap();
    assert_eq!((report.updated, report.duplicates), (0, 1), "{text}");
  }
  let stored = Repository::<Claim>::get(engine.store(), id).await.unwrap().unwrap();
  assert_eq!(stored.text, "Revised");
}

#[tokio::test]
async fn equal_fingerprint_is_a_duplicate() {
  let engine = engine().await;
  let seed = document(json!({
    "claims": [claim_json(Uuid::new_v4(), "Café culture is dying", "2024-01-01T00:00:00Z")]
  }));
  engine.import(seed, THRESHOLD).await.unwrap();

  let incoming = document(json!({
    "claims": [claim_json(Uuid::new_v4(), "cafe culture is DYING!!", "2024-09-01T00:00:00Z")]
  }));
  let report = engine.import(incoming, THRESHOLD).await.unwrap();
  assert_eq!((report.duplicates, report.created), (1, 0));
  assert_eq!(claims(&engine).await.len(), 1);
}

#[tokio::test]
async fn incoming_fingerprints_are_not_trusted() {
  let engine = engine().await;
  let id = Uuid::new_v4();
  let mut item = claim_json(id, "Tariffs protect jobs", "2024-01-01T00:00:00Z");
  item["fingerprint"] = json!("0000000000000000");
  engine.import(document(json!({ "claims": [item] })), THRESHOLD).await.unwrap();

  let stored = Repository::<Claim>::get(engine.store(), id).await.unwrap().unwrap();
  assert_eq!(stored.fingerprint, Claim::fingerprint_of("Tariffs protect jobs"));
}

#[tokio::test]
async fn similar_records_are_held_for_review() {
  let engine = engine().await;
  let existing = Uuid::new_v4();
  let seed = document(json!({
    "claims": [claim_json(existing, "Universal basic income reduces poverty.", "2024-01-01T00:00:00Z")]
  }));
  engine.import(seed, THRESHOLD).await.unwrap();

  let incoming = Uuid::new_v4();
  let bytes = document(json!({
    "claims": [claim_json(incoming, "Universal basic incomes reduce poverty", "2024-01-02T00:00:00Z")]
  }));
  let report = engine.import(bytes.clone(), THRESHOLD).await.unwrap();
  assert_eq!((report.near_duplicates, report.created), (1, 0));
  let candidate = &report.candidates[0];
  assert_eq!(candidate.kind, EntityKind::Claim);
  assert_eq!((candidate.incoming_id, candidate.existing_id), (incoming, existing));
  assert!(candidate.score >= THRESHOLD && candidate.score < 1.0);
  assert_eq!(claims(&engine).await.len(), 1);

  // A stricter threshold lets it through.
  let report = engine.import(bytes, 0.95).await.unwrap();
  assert_eq!((report.near_duplicates, report.created), (0, 1));
}

#[tokio::test]
async fn records_created_earlier_in_the_batch_are_matched() {
  let engine = engine().await;
  let first = Uuid::new_v4();
  let report = engine
    .import(
      document(json!({
        "claims": [
          claim_json(first, "Minimum wage increases reduce employment", "2024-01-01T00:00:00Z"),
          claim_json(Uuid::new_v4(), "Minimum wage increase reduces employment", "2024-01-01T00:00:00Z"),
        ]
      })),
      THRESHOLD,
    )
    .await
    .unwrap();
  assert_eq!((report.created, report.near_duplicates), (1, 1));
  assert_eq!(report.candidates[0].existing_id, first);
}

#[tokio::test]
async fn one_malformed_record_does_not_stop_the_batch() {
  let engine = engine().await;
  let texts = [
    "Nuclear power is the safest energy source",
    "Rent control reduces housing supply",
    "Social media harms teenage mental health",
    "Remote work increases productivity",
    "",
    "Standardized tests predict college success",
    "Carbon taxes cut emissions efficiently",
    "Universal healthcare lowers total costs",
    "Free trade benefits developing economies",
    "Space exploration is worth the expense",
  ];
  let items: Vec<Value> = texts
    .iter()
    .enumerate()
    .map(|(i, text)| {
      if i == 4 {
        json!({ "id": "not-a-uuid", "text": 42 })
      } else {
        claim_json(Uuid::new_v4(), text, "2024-01-01T00:00:00Z")
      }
    })
    .collect();

  let report = engine.import(document(json!({ "claims": items })), THRESHOLD).await.unwrap();
  assert_eq!(report.total, 10);
  assert_eq!(report.created, 9);
  assert_eq!(report.errors, 1);
  assert_eq!(report.error_messages[0].kind, EntityKind::Claim);
  assert_eq!(report.error_messages[0].id.as_deref(), Some("not-a-uuid"));
  assert_eq!(claims(&engine).await.len(), 9);
}

#[tokio::test]
async fn broken_references_are_item_errors() {
  let engine = engine().await;
  let report = engine
    .import(
      document(json!({
        "rebuttals": [{
          "id": Uuid::new_v4(),
          "claimId": Uuid::new_v4(),
          "text": "Nobody said that",
          "createdAt": "2024-01-01T00:00:00Z",
          "updatedAt": "2024-01-01T00:00:00Z",
        }],
        "tags": [
          { "id": Uuid::new_v4(), "label": "Economics", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z" },
          { "id": Uuid::new_v4(), "label": "ECONOMICS", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z" },
        ],
      })),
      THRESHOLD,
    )
    .await
    .unwrap();

  assert_eq!(report.total, 3);
  assert_eq!(report.created, 1);
  assert_eq!(report.errors, 2);
  let kinds: Vec<_> = report.error_messages.iter().map(|e| e.kind).collect();
  assert_eq!(kinds, vec![EntityKind::Tag, EntityKind::Rebuttal]);
}

// ─── Whole-import failures ───────────────────────────────────────────────────

#[tokio::test]
async fn unsupported_version_is_rejected_before_any_write() {
  let engine = engine().await;
  let bytes = serde_json::to_vec(&json!({
    "formatVersion": "2.0",
    "entities": { "claims": [claim_json(Uuid::new_v4(), "Anything", "2024-01-01T00:00:00Z")] }
  }))
  .unwrap();

  let err = engine.import(bytes, THRESHOLD).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Snapshot(dialectic_snapshot::Error::UnsupportedVersion { .. })
  ));
  assert!(claims(&engine).await.is_empty());
  assert!(!engine.is_importing());
}

#[tokio::test]
async fn threshold_must_be_a_ratio() {
  let engine = engine().await;
  for bad in [0.0, -0.5, 1.01, f64::NAN] {
    let err = engine.import(document(json!({})), bad).await.unwrap_err();
    assert!(matches!(err, Error::InvalidThreshold(_)), "{bad}");
  }
  // Outside the recommended range is allowed.
  assert!(engine.import(document(json!({})), 0.5).await.is_ok());
}

#[tokio::test]
async fn one_import_and_one_export_at_a_time() {
  let engine = engine().await;
  let other = engine.clone();

  let held = Flight::acquire(&engine.store().merge_locks().importing).unwrap();
  assert!(other.is_importing());
  let err = other.import(document(json!({})), THRESHOLD).await.unwrap_err();
  assert!(matches!(err, Error::ImportInProgress));
  // Exports are guarded separately.
  assert!(other.export().await.is_ok());
  drop(held);
  assert!(other.import(document(json!({})), THRESHOLD).await.is_ok());

  let held = Flight::acquire(&engine.store().merge_locks().exporting).unwrap();
  assert!(matches!(other.export().await, Err(Error::ExportInProgress)));
  drop(held);
  assert!(other.export_bytes().await.is_ok());
  assert!(!engine.is_exporting());
}

#[tokio::test]
async fn engines_over_one_store_share_the_guard() {
  let store = SqliteStore::open_in_memory().await.unwrap();
  let first = MergeEngine::new(store.clone());
  let second = MergeEngine::new(store.clone());

  let held = Flight::acquire(&first.store().merge_locks().importing).unwrap();
  assert!(second.is_importing());
  let err = second.import(document(json!({})), THRESHOLD).await.unwrap_err();
  assert!(matches!(err, Error::ImportInProgress));
  drop(held);

  let held = Flight::acquire(&store.merge_locks().exporting).unwrap();
  assert!(matches!(first.export().await, Err(Error::ExportInProgress)));
  assert!(matches!(second.export().await, Err(Error::ExportInProgress)));
  drop(held);
  assert!(second.import(document(json!({})), THRESHOLD).await.is_ok());
}

#[tokio::test]
async fn unreadable_export_time_does_not_fail_the_import() {
  let engine = engine().await;
  let bytes = serde_json::to_vec(&json!({
    "formatVersion": "1.0",
    "exportedAt": "last tuesday",
    "entities": { "claims": [claim_json(Uuid::new_v4(), "Tariffs protect jobs", "2024-01-01T00:00:00Z")] }
  }))
  .unwrap();

  let report = engine.import(bytes, THRESHOLD).await.unwrap();
  assert_eq!((report.total, report.created), (1, 1));
}

// ─── Export ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_round_trips_into_an_empty_store() {
  let source = engine().await;
  let s = source.store();

  let tag = Repository::<Tag>::create(s, NewTag::new("economics")).await.unwrap();
  let mut draft = NewTopic::new("Universal basic income");
  draft.tags = vec![tag.label.clone()];
  let topic = Repository::<Topic>::create(s, draft).await.unwrap();
  let custom = Repository::<Fallacy>::create(s, NewFallacy::new("Moving the goalposts"))
    .await
    .unwrap();

  let mut draft = NewClaim::new("UBI reduces poverty");
  draft.topic_ids = vec![topic.id];
  draft.fallacy_ids = vec![s.catalog().id_for("Bandwagon")];
  let claim = Repository::<Claim>::create(s, draft).await.unwrap();

  let mut draft = NewRebuttal::new(claim.id, "The pilots were small");
  draft.fallacy_ids = vec![custom.id];
  Repository::<Rebuttal>::create(s, draft).await.unwrap();

  let mut draft = NewSource::new("Kela final report");
  draft.url = Some("https://kela.fi".into());
  draft.reliability = Some(0.8);
  let src = Repository::<Source>::create(s, draft).await.unwrap();
  let mut draft = NewEvidence::new(claim.id, "Employment effects were small");
  draft.source_id = Some(src.id);
  Repository::<Evidence>::create(s, draft).await.unwrap();

  Repository::<Question>::create(s, NewQuestion::new(TargetRef::Topic(topic.id), "Who pays?"))
    .await
    .unwrap();

  let bytes = source.export_bytes().await.unwrap();
  let json: Value = serde_json::from_slice(&bytes).unwrap();
  assert_eq!(json["formatVersion"], "1.0");
  assert_eq!(json["entities"]["fallacies"].as_array().unwrap().len(), 1);

  let target = engine().await;
  let report = target.import(bytes, THRESHOLD).await.unwrap();
  assert_eq!(report.total, 8);
  assert_eq!(report.created, 8, "{:?}", report.error_messages);

  let t = target.store();
  assert_eq!(
    Repository::<Topic>::list(t).await.unwrap(),
    Repository::<Topic>::list(s).await.unwrap()
  );
  assert_eq!(claims(&target).await, claims(&source).await);
  assert_eq!(
    Repository::<Rebuttal>::list(t).await.unwrap(),
    Repository::<Rebuttal>::list(s).await.unwrap()
  );
  assert_eq!(
    Repository::<Evidence>::list(t).await.unwrap(),
    Repository::<Evidence>::list(s).await.unwrap()
  );
  assert_eq!(
    Repository::<Source>::list(t).await.unwrap(),
    Repository::<Source>::list(s).await.unwrap()
  );
  assert_eq!(
    Repository::<Question>::list(t).await.unwrap(),
    Repository::<Question>::list(s).await.unwrap()
  );
  assert_eq!(
    Repository::<Fallacy>::get(t, custom.id).await.unwrap(),
    Some(custom)
  );

  // Exporting again and re-importing is a no-op.
  let again = target.import(source.export_bytes().await.unwrap(), THRESHOLD).await.unwrap();
  assert_eq!(again.duplicates, again.total);
}
