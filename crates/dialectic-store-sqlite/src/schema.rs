//! The schema, step by step.
//!
//! Version 1 is the original flat layout. Every later step is written against
//! the layout the previous step left behind and must never be edited once
//! released; fix forward with a new step instead.

use std::str::FromStr;

use dialectic_core::{
  labels::{EvidenceType, Posture, Quality, QuestionKind, Stance, Strength},
  model::{Claim, Source, Topic},
};
use rusqlite::{Row, Transaction, params, params_from_iter, types::Value};
use uuid::Uuid;

use crate::{error::StepError, migrate::StepContext};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn has_column(tx: &Transaction<'_>, table: &str, column: &str) -> rusqlite::Result<bool> {
  tx.query_row(
    "SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2",
    params![table, column],
    |row| row.get::<_, i64>(0),
  )
  .map(|n| n > 0)
}

/// `ALTER TABLE .. ADD COLUMN`, skipped when the column already exists.
fn add_column(
  tx: &Transaction<'_>,
  table: &str,
  column: &str,
  definition: &str,
) -> rusqlite::Result<()> {
  if !has_column(tx, table, column)? {
    tx.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {definition}"))?;
  }
  Ok(())
}

/// Read the first `n` columns of `row` as dynamically typed values.
fn row_values(row: &Row<'_>, n: usize) -> rusqlite::Result<Vec<Value>> {
  (0..n).map(|i| row.get::<_, Value>(i)).collect()
}

/// Replace `table` with a new definition, streaming every row through
/// `transform` in rowid order so relative row order is kept.
///
/// `create` must create `{table}_new`; `select` reads the old table (without
/// an `ORDER BY`); `insert` writes one row of `{table}_new`.
fn rebuild_table<F>(
  tx: &Transaction<'_>,
  table: &str,
  create: &str,
  select: &str,
  insert: &str,
  mut transform: F,
) -> Result<usize, StepError>
where
  F: FnMut(&Row<'_>) -> Result<Vec<Value>, StepError>,
{
  tx.execute_batch(create)?;

  let mut copied = 0;
  {
    let mut read = tx.prepare(&format!("{select} ORDER BY rowid"))?;
    let mut write = tx.prepare(insert)?;
    let mut rows = read.query([])?;
    while let Some(row) = rows.next()? {
      write.execute(params_from_iter(transform(row)?))?;
      copied += 1;
    }
  }

  tx.execute_batch(&format!(
    "DROP TABLE {table};
     ALTER TABLE {table}_new RENAME TO {table};"
  ))?;
  tracing::debug!(table, rows = copied, "rebuilt table");
  Ok(copied)
}

/// Compute one value per row, then write it back by rowid.
fn recompute<F>(
  tx: &Transaction<'_>,
  select: &str,
  update: &str,
  mut derive: F,
) -> Result<usize, StepError>
where
  F: FnMut(&Row<'_>) -> rusqlite::Result<String>,
{
  let updates: Vec<(i64, String)> = {
    let mut stmt = tx.prepare(select)?;
    stmt
      .query_map([], |row| Ok((row.get(0)?, derive(row)?)))?
      .collect::<rusqlite::Result<_>>()?
  };

  let mut stmt = tx.prepare(update)?;
  for (rowid, value) in &updates {
    stmt.execute(params![value, rowid])?;
  }
  Ok(updates.len())
}

/// Give every row without timestamps its own instant, in rowid order.
fn backfill_timestamps(
  tx: &Transaction<'_>,
  table: &str,
  ctx: &mut StepContext<'_>,
) -> Result<usize, StepError> {
  let rowids: Vec<i64> = {
    let mut stmt =
      tx.prepare(&format!("SELECT rowid FROM {table} WHERE created_at = '' ORDER BY rowid"))?;
    stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<_>>()?
  };

  let mut stmt = tx.prepare(&format!(
    "UPDATE {table} SET created_at = ?1, updated_at = ?1 WHERE rowid = ?2"
  ))?;
  for rowid in &rowids {
    stmt.execute(params![ctx.clock.tick_encoded(), rowid])?;
  }
  Ok(rowids.len())
}

/// Insert the fallacy `name` unless a row with its derived id exists.
/// Unknown names become custom fallacies.
fn ensure_fallacy(
  tx: &Transaction<'_>,
  ctx: &mut StepContext<'_>,
  name: &str,
) -> Result<Uuid, StepError> {
  let id = ctx.catalog.id_for(name);
  let (name, description, example, category, is_custom) = match ctx.catalog.entry(name) {
    Some(e) => (e.name, e.description, e.example, e.category, false),
    None => (name, "", "", "custom", true),
  };
  let now = ctx.clock.tick_encoded();
  tx.execute(
    "INSERT OR IGNORE INTO fallacies
       (id, name, description, example, category, is_custom, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
    params![id.hyphenated().to_string(), name, description, example, category, is_custom, now],
  )?;
  Ok(id)
}

// ─── v1 ──────────────────────────────────────────────────────────────────────

const V1_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS topics (
    id      TEXT PRIMARY KEY,
    title   TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    posture TEXT NOT NULL DEFAULT 'critical',
    tags    TEXT NOT NULL DEFAULT '[]'      -- JSON array of tag labels
);

CREATE TABLE IF NOT EXISTS claims (
    id       TEXT PRIMARY KEY,
    topic_id TEXT REFERENCES topics(id) ON DELETE SET NULL,
    text     TEXT NOT NULL,
    stance   TEXT NOT NULL DEFAULT 'neutral',
    strength TEXT NOT NULL DEFAULT 'medium'
);

CREATE TABLE IF NOT EXISTS rebuttals (
    id          TEXT PRIMARY KEY,
    claim_id    TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
    text        TEXT NOT NULL,
    fallacy_tag TEXT                        -- free-text fallacy name
);

CREATE TABLE IF NOT EXISTS sources (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    citation    TEXT,
    url         TEXT,
    publisher   TEXT,
    date        TEXT,
    notes       TEXT,
    reliability REAL CHECK (reliability IS NULL OR reliability BETWEEN 0.0 AND 1.0)
);

CREATE TABLE IF NOT EXISTS evidence (
    id        TEXT PRIMARY KEY,
    claim_id  TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
    content   TEXT NOT NULL,
    \"type\"    TEXT NOT NULL DEFAULT 'example',
    quality   TEXT NOT NULL DEFAULT 'medium',
    source_id TEXT REFERENCES sources(id) ON DELETE SET NULL
);

-- target_id names a topic or a claim; no foreign key.
CREATE TABLE IF NOT EXISTS questions (
    id        TEXT PRIMARY KEY,
    target_id TEXT NOT NULL,
    text      TEXT NOT NULL,
    kind      TEXT NOT NULL DEFAULT 'socratic'
);

CREATE TABLE IF NOT EXISTS tags (
    id    TEXT PRIMARY KEY,
    label TEXT NOT NULL,
    color TEXT
);
";

pub(crate) fn v1_base_tables(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  tx.execute_batch(V1_SCHEMA)?;
  Ok(())
}

// ─── v2 ──────────────────────────────────────────────────────────────────────

pub(crate) const TIMESTAMPED: &[&str] =
  &["topics", "claims", "rebuttals", "evidence", "sources", "questions", "tags"];

pub(crate) fn v2_timestamps(tx: &Transaction<'_>, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
  for table in TIMESTAMPED {
    add_column(tx, table, "created_at", "TEXT NOT NULL DEFAULT ''")?;
    add_column(tx, table, "updated_at", "TEXT NOT NULL DEFAULT ''")?;
    let rows = backfill_timestamps(tx, table, ctx)?;
    if rows > 0 {
      tracing::info!(table, rows, "backfilled timestamps");
    }
  }
  Ok(())
}

// ─── v3 ──────────────────────────────────────────────────────────────────────

pub(crate) fn v3_claim_topics(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  tx.execute_batch(
    "CREATE TABLE claim_topics (
         claim_id TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
         topic_id TEXT NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
         position INTEGER NOT NULL DEFAULT 0,
         PRIMARY KEY (claim_id, topic_id)
     );

     INSERT INTO claim_topics (claim_id, topic_id, position)
     SELECT id, topic_id, 0 FROM claims WHERE topic_id IS NOT NULL;",
  )?;

  rebuild_table(
    tx,
    "claims",
    "CREATE TABLE claims_new (
         id         TEXT PRIMARY KEY,
         text       TEXT NOT NULL,
         stance     TEXT NOT NULL DEFAULT 'neutral',
         strength   TEXT NOT NULL DEFAULT 'medium',
         created_at TEXT NOT NULL DEFAULT '',
         updated_at TEXT NOT NULL DEFAULT ''
     );",
    "SELECT id, text, stance, strength, created_at, updated_at FROM claims",
    "INSERT INTO claims_new (id, text, stance, strength, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    |row| Ok(row_values(row, 6)?),
  )?;
  Ok(())
}

// ─── v4 ──────────────────────────────────────────────────────────────────────

pub(crate) fn v4_fingerprints(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  add_column(tx, "claims", "fingerprint", "TEXT NOT NULL DEFAULT ''")?;
  add_column(tx, "topics", "fingerprint", "TEXT")?;
  add_column(tx, "sources", "fingerprint", "TEXT NOT NULL DEFAULT ''")?;

  let claims = recompute(
    tx,
    "SELECT rowid, text FROM claims",
    "UPDATE claims SET fingerprint = ?1 WHERE rowid = ?2",
    |row| Ok(Claim::fingerprint_of(&row.get::<_, String>(1)?)),
  )?;
  let topics = recompute(
    tx,
    "SELECT rowid, title FROM topics",
    "UPDATE topics SET fingerprint = ?1 WHERE rowid = ?2",
    |row| Ok(Topic::fingerprint_of(&row.get::<_, String>(1)?)),
  )?;
  let sources = recompute(
    tx,
    "SELECT rowid, title, url, publisher, date FROM sources",
    "UPDATE sources SET fingerprint = ?1 WHERE rowid = ?2",
    |row| {
      let title: String = row.get(1)?;
      let url: Option<String> = row.get(2)?;
      let publisher: Option<String> = row.get(3)?;
      let date: Option<String> = row.get(4)?;
      Ok(Source::fingerprint_of(&title, url.as_deref(), publisher.as_deref(), date.as_deref()))
    },
  )?;

  tracing::info!(claims, topics, sources, "computed fingerprints");
  Ok(())
}

// ─── v5 ──────────────────────────────────────────────────────────────────────

pub(crate) fn v5_fallacies(tx: &Transaction<'_>, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
  tx.execute_batch(
    "CREATE TABLE fallacies (
         id          TEXT PRIMARY KEY,
         name        TEXT NOT NULL,
         description TEXT NOT NULL DEFAULT '',
         example     TEXT NOT NULL DEFAULT '',
         category    TEXT NOT NULL DEFAULT '',
         is_custom   INTEGER NOT NULL DEFAULT 0,
         created_at  TEXT NOT NULL,
         updated_at  TEXT NOT NULL
     );",
  )?;
  for entry in ctx.catalog.entries() {
    ensure_fallacy(tx, ctx, entry.name)?;
  }
  Ok(())
}

// ─── v6 ──────────────────────────────────────────────────────────────────────

pub(crate) fn v6_claim_fallacies(
  tx: &Transaction<'_>,
  _: &mut StepContext<'_>,
) -> Result<(), StepError> {
  add_column(tx, "claims", "fallacy_ids", "TEXT NOT NULL DEFAULT '[]'")?;
  Ok(())
}

// ─── v7 ──────────────────────────────────────────────────────────────────────

/// Split a legacy free-text fallacy tag into names.
fn tag_names(tag: &str) -> impl Iterator<Item = &str> {
  tag.split([',', ';']).map(str::trim).filter(|s| !s.is_empty())
}

pub(crate) fn v7_rebuttal_fallacies(
  tx: &Transaction<'_>,
  ctx: &mut StepContext<'_>,
) -> Result<(), StepError> {
  rebuild_table(
    tx,
    "rebuttals",
    "CREATE TABLE rebuttals_new (
         id          TEXT PRIMARY KEY,
         claim_id    TEXT NOT NULL REFERENCES claims(id) ON DELETE CASCADE,
         text        TEXT NOT NULL,
         fallacy_ids TEXT NOT NULL DEFAULT '[]',
         created_at  TEXT NOT NULL DEFAULT '',
         updated_at  TEXT NOT NULL DEFAULT ''
     );",
    "SELECT id, claim_id, text, fallacy_tag, created_at, updated_at FROM rebuttals",
    "INSERT INTO rebuttals_new (id, claim_id, text, fallacy_ids, created_at, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    |row| {
      let tag: Option<String> = row.get(3)?;
      let mut ids = Vec::new();
      for name in tag.as_deref().into_iter().flat_map(tag_names) {
        let id = ensure_fallacy(tx, ctx, name)?;
        if !ids.contains(&id) {
          ids.push(id);
        }
      }
      Ok(vec![
        row.get::<_, Value>(0)?,
        row.get::<_, Value>(1)?,
        row.get::<_, Value>(2)?,
        Value::Text(serde_json::to_string(&ids)?),
        row.get::<_, Value>(4)?,
        row.get::<_, Value>(5)?,
      ])
    },
  )?;
  Ok(())
}

// ─── v8 ──────────────────────────────────────────────────────────────────────

fn rename_labels(
  tx: &Transaction<'_>,
  table: &str,
  column: &str,
  renames: &[(&str, &str)],
) -> rusqlite::Result<usize> {
  let mut stmt =
    tx.prepare(&format!("UPDATE {table} SET \"{column}\" = ?1 WHERE \"{column}\" = ?2"))?;
  let mut changed = 0;
  for (old, new) in renames {
    changed += stmt.execute(params![new, old])?;
  }
  Ok(changed)
}

/// Every distinct value of `column` must parse as `L`.
fn ensure_labels<L: FromStr>(
  tx: &Transaction<'_>,
  table: &'static str,
  column: &str,
) -> Result<(), StepError> {
  let values: Vec<String> = {
    let mut stmt = tx.prepare(&format!("SELECT DISTINCT \"{column}\" FROM {table}"))?;
    stmt.query_map([], |row| row.get(0))?.collect::<rusqlite::Result<_>>()?
  };
  match values.into_iter().find(|v| v.parse::<L>().is_err()) {
    Some(bad) => Err(StepError::UnexpectedRow {
      table,
      detail: format!("unknown {column} label {bad:?}"),
    }),
    None => Ok(()),
  }
}

pub(crate) fn v8_label_renames(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  let postures = rename_labels(tx, "topics", "posture", Posture::LEGACY)?;
  let evidence_types = rename_labels(tx, "evidence", "type", EvidenceType::LEGACY)?;
  tracing::info!(postures, evidence_types, "renamed legacy labels");

  ensure_labels::<Posture>(tx, "topics", "posture")?;
  ensure_labels::<Stance>(tx, "claims", "stance")?;
  ensure_labels::<Strength>(tx, "claims", "strength")?;
  ensure_labels::<EvidenceType>(tx, "evidence", "type")?;
  ensure_labels::<Quality>(tx, "evidence", "quality")?;
  ensure_labels::<QuestionKind>(tx, "questions", "kind")?;
  Ok(())
}

// ─── v9 ──────────────────────────────────────────────────────────────────────

const V9_FULL_TEXT: &str = "
CREATE VIRTUAL TABLE topics_fts USING fts5(topic_id UNINDEXED, title, summary);
CREATE VIRTUAL TABLE claims_fts USING fts5(claim_id UNINDEXED, text);

INSERT INTO topics_fts (topic_id, title, summary) SELECT id, title, summary FROM topics;
INSERT INTO claims_fts (claim_id, text) SELECT id, text FROM claims;

CREATE TRIGGER topics_fts_insert AFTER INSERT ON topics BEGIN
    INSERT INTO topics_fts (topic_id, title, summary) VALUES (new.id, new.title, new.summary);
END;
CREATE TRIGGER topics_fts_update AFTER UPDATE OF title, summary ON topics BEGIN
    DELETE FROM topics_fts WHERE topic_id = old.id;
    INSERT INTO topics_fts (topic_id, title, summary) VALUES (new.id, new.title, new.summary);
END;
CREATE TRIGGER topics_fts_delete AFTER DELETE ON topics BEGIN
    DELETE FROM topics_fts WHERE topic_id = old.id;
END;

CREATE TRIGGER claims_fts_insert AFTER INSERT ON claims BEGIN
    INSERT INTO claims_fts (claim_id, text) VALUES (new.id, new.text);
END;
CREATE TRIGGER claims_fts_update AFTER UPDATE OF text ON claims BEGIN
    DELETE FROM claims_fts WHERE claim_id = old.id;
    INSERT INTO claims_fts (claim_id, text) VALUES (new.id, new.text);
END;
CREATE TRIGGER claims_fts_delete AFTER DELETE ON claims BEGIN
    DELETE FROM claims_fts WHERE claim_id = old.id;
END;
";

pub(crate) fn v9_full_text(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  tx.execute_batch(V9_FULL_TEXT)?;
  Ok(())
}

// ─── v10 ─────────────────────────────────────────────────────────────────────

const V10_INDEXES: &str = "
CREATE UNIQUE INDEX tags_label_idx          ON tags(label COLLATE NOCASE);
CREATE INDEX        topics_fingerprint_idx  ON topics(fingerprint);
CREATE INDEX        claims_fingerprint_idx  ON claims(fingerprint);
CREATE INDEX        sources_fingerprint_idx ON sources(fingerprint);
CREATE INDEX        claim_topics_topic_idx  ON claim_topics(topic_id);
CREATE INDEX        rebuttals_claim_idx     ON rebuttals(claim_id);
CREATE INDEX        evidence_claim_idx      ON evidence(claim_id);
CREATE INDEX        evidence_source_idx     ON evidence(source_id);
CREATE INDEX        questions_target_idx    ON questions(target_id);
";

pub(crate) fn v10_indexes(tx: &Transaction<'_>, _: &mut StepContext<'_>) -> Result<(), StepError> {
  // The oldest tag of each case-insensitive label wins.
  let collapsed = tx.execute(
    "DELETE FROM tags WHERE rowid NOT IN (
         SELECT MIN(rowid) FROM tags GROUP BY label COLLATE NOCASE
     )",
    [],
  )?;
  if collapsed > 0 {
    tracing::warn!(collapsed, "removed tags with duplicate labels");
  }
  tx.execute_batch(V10_INDEXES)?;
  Ok(())
}
