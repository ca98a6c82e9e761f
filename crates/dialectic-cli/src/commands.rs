//! Sub-command implementations.

use std::path::Path;

use anyhow::{Context as _, Result};
use dialectic_core::{
  EntityKind,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, Topic},
  store::{DebateStore, Repository},
};
use dialectic_merge::{MergeEngine, MergeReport};
use dialectic_store_sqlite::{CURRENT_VERSION, SqliteStore};

async fn open(store_path: &Path) -> Result<SqliteStore> {
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  SqliteStore::open(store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))
}

async fn inspect(store_path: &Path) -> Result<Option<u32>> {
  if !store_path.exists() {
    return Ok(None);
  }
  let version = SqliteStore::inspect(store_path)
    .await
    .with_context(|| format!("failed to read schema version of {store_path:?}"))?;
  Ok(Some(version))
}

// ─── status ──────────────────────────────────────────────────────────────────

pub async fn status(store_path: &Path) -> Result<()> {
  let Some(version) = inspect(store_path).await? else {
    println!("no store at {}", store_path.display());
    return Ok(());
  };
  println!("store:   {}", store_path.display());
  println!("schema:  version {version} (this build: {CURRENT_VERSION})");

  if version > CURRENT_VERSION {
    println!("the store was written by a newer version of dialectic");
    return Ok(());
  }
  if version < CURRENT_VERSION {
    println!("run `dialectic migrate` to upgrade before use");
    return Ok(());
  }

  let store = open(store_path).await?;
  let custom = Repository::<Fallacy>::list(&store)
    .await?
    .into_iter()
    .filter(|f| f.is_custom)
    .count();
  let counts = [
    (EntityKind::Topic, Repository::<Topic>::list(&store).await?.len()),
    (EntityKind::Claim, Repository::<Claim>::list(&store).await?.len()),
    (EntityKind::Rebuttal, Repository::<Rebuttal>::list(&store).await?.len()),
    (EntityKind::Evidence, Repository::<Evidence>::list(&store).await?.len()),
    (EntityKind::Source, Repository::<Source>::list(&store).await?.len()),
    (EntityKind::Question, Repository::<Question>::list(&store).await?.len()),
    (EntityKind::Tag, Repository::<Tag>::list(&store).await?.len()),
    (EntityKind::Fallacy, custom),
  ];
  for (kind, count) in counts {
    println!("  {:<10} {count}", kind.as_str());
  }
  Ok(())
}

// ─── migrate ─────────────────────────────────────────────────────────────────

pub async fn migrate(store_path: &Path) -> Result<()> {
  let before = inspect(store_path).await?;
  let store = open(store_path).await?;
  let after = store.schema_version().await?;

  match before {
    None => println!("created store at version {after}"),
    Some(version) if version == after => println!("already at version {after}"),
    Some(version) => println!("migrated from version {version} to {after}"),
  }
  Ok(())
}

// ─── import / export ─────────────────────────────────────────────────────────

pub async fn import(store_path: &Path, file: &Path, threshold: f64) -> Result<MergeReport> {
  let bytes = tokio::fs::read(file)
    .await
    .with_context(|| format!("failed to read {}", file.display()))?;
  let engine = MergeEngine::new(open(store_path).await?);
  engine
    .import(bytes, threshold)
    .await
    .with_context(|| format!("failed to import {}", file.display()))
}

pub fn print_report(report: &MergeReport, json: bool) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(report)?);
    return Ok(());
  }
  println!("{report}");
  for candidate in &report.candidates {
    println!(
      "  similar {} {} ~ {} ({:.3})",
      candidate.kind, candidate.incoming_id, candidate.existing_id, candidate.score
    );
  }
  for error in &report.error_messages {
    println!("  error   {error}");
  }
  Ok(())
}

pub async fn export(store_path: &Path, file: &Path) -> Result<()> {
  let engine = MergeEngine::new(open(store_path).await?);
  let bytes = engine.export_bytes().await.context("failed to export store")?;
  tokio::fs::write(file, &bytes)
    .await
    .with_context(|| format!("failed to write {}", file.display()))?;
  tracing::info!(file = %file.display(), bytes = bytes.len(), "snapshot written");
  Ok(())
}

// ─── cleanup ─────────────────────────────────────────────────────────────────

pub async fn cleanup(store_path: &Path) -> Result<()> {
  let store = open(store_path).await?;
  let removed = store.cleanup_orphan_questions().await?;
  println!("removed {removed} orphaned question(s)");
  Ok(())
}

#[cfg(test)]
mod tests {
  use dialectic_core::model::NewTopic;

  use super::*;

  #[tokio::test]
  async fn export_then_import_into_a_fresh_store() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("nested/first.db");
    let second = dir.path().join("second.db");
    let snapshot = dir.path().join("snapshot.json");

    migrate(&first).await.unwrap();
    let store = open(&first).await.unwrap();
    Repository::<Topic>::create(&store, NewTopic::new("Universal basic income"))
      .await
      .unwrap();
    drop(store);

    export(&first, &snapshot).await.unwrap();
    let report = import(&second, &snapshot, 0.9).await.unwrap();
    assert_eq!((report.total, report.created), (1, 1));

    let again = import(&second, &snapshot, 0.9).await.unwrap();
    assert_eq!(again.duplicates, 1);
  }

  #[tokio::test]
  async fn status_does_not_create_a_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.db");
    status(&path).await.unwrap();
    assert!(!path.exists());
  }

  #[tokio::test]
  async fn import_of_a_missing_file_fails_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let err = import(&dir.path().join("kb.db"), &dir.path().join("nope.json"), 0.9)
      .await
      .unwrap_err();
    assert!(err.to_string().contains("nope.json"));
  }
}
