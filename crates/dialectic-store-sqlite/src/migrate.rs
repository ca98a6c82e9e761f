//! Versioned schema migrations.
//!
//! The schema version lives in `PRAGMA user_version`. Each step moves the
//! store from version `n - 1` to `n` inside its own transaction; the version
//! bump and a foreign-key check happen inside that transaction, so a failed
//! step leaves the store exactly at `n - 1`. Versions only ever increase.
//!
//! Foreign-key enforcement is switched off for the duration of a run (table
//! rebuilds would otherwise cascade) and switched back on afterwards, whatever
//! the outcome.

use chrono::{DateTime, Utc};
use dialectic_core::catalog::FallacyCatalog;
use rusqlite::{Connection, Transaction};

use crate::{
  encode::encode_dt,
  error::{MigrationError, StepError},
  schema,
};

/// The newest schema version this build knows how to produce.
pub const CURRENT_VERSION: u32 = 10;

type Apply = fn(&Transaction<'_>, &mut StepContext<'_>) -> Result<(), StepError>;

/// One migration step.
pub(crate) struct Step {
  pub version:     u32,
  pub description: &'static str,
  pub apply:       Apply,
}

/// Every step, in version order.
pub(crate) const STEPS: &[Step] = &[
  Step { version: 1, description: "base tables", apply: schema::v1_base_tables },
  Step { version: 2, description: "record timestamps", apply: schema::v2_timestamps },
  Step { version: 3, description: "claim/topic junction", apply: schema::v3_claim_topics },
  Step { version: 4, description: "fingerprints", apply: schema::v4_fingerprints },
  Step { version: 5, description: "fallacy catalog", apply: schema::v5_fallacies },
  Step { version: 6, description: "claim fallacy links", apply: schema::v6_claim_fallacies },
  Step { version: 7, description: "rebuttal fallacy links", apply: schema::v7_rebuttal_fallacies },
  Step { version: 8, description: "label renames", apply: schema::v8_label_renames },
  Step { version: 9, description: "full-text search", apply: schema::v9_full_text },
  Step { version: 10, description: "unique tags and indexes", apply: schema::v10_indexes },
];

/// State shared by the steps of one run.
pub(crate) struct StepContext<'a> {
  pub catalog: &'a FallacyCatalog,
  pub clock:   SequentialClock,
}

// ─── Sequential clock ────────────────────────────────────────────────────────

/// Hands out strictly increasing timestamps one millisecond apart, starting
/// from a fixed base. Used to backfill timestamps on pre-existing rows so that
/// insertion order is preserved and no two rows share an instant.
#[derive(Debug, Clone)]
pub struct SequentialClock {
  base:   DateTime<Utc>,
  issued: i64,
}

impl SequentialClock {
  pub fn starting_at(base: DateTime<Utc>) -> Self { Self { base, issued: 0 } }

  pub fn tick(&mut self) -> DateTime<Utc> {
    let at = self.base + chrono::Duration::milliseconds(self.issued);
    self.issued += 1;
    at
  }

  /// [`Self::tick`], encoded for storage.
  pub fn tick_encoded(&mut self) -> String { encode_dt(self.tick()) }
}

// ─── Runner ──────────────────────────────────────────────────────────────────

/// The schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> rusqlite::Result<u32> {
  conn.pragma_query_value(None, "user_version", |row| row.get(0))
}

/// Bring the schema up to `target`, one step at a time.
///
/// Returns the version the store is at afterwards. A store already at or past
/// `target` is left alone; a store newer than [`CURRENT_VERSION`] is refused.
pub fn migrate(
  conn: &mut Connection,
  target: u32,
  catalog: &FallacyCatalog,
) -> Result<u32, MigrationError> {
  let found = schema_version(conn)?;
  if found > CURRENT_VERSION {
    return Err(MigrationError::TooNew { found, supported: CURRENT_VERSION });
  }
  if target > CURRENT_VERSION {
    return Err(MigrationError::UnknownTarget(target));
  }
  if found >= target {
    tracing::debug!(version = found, "schema is up to date");
    return Ok(found);
  }

  conn.pragma_update(None, "foreign_keys", false)?;
  let outcome = apply_steps(conn, found, target, catalog);
  conn.pragma_update(None, "foreign_keys", true)?;
  outcome
}

fn apply_steps(
  conn: &mut Connection,
  from: u32,
  to: u32,
  catalog: &FallacyCatalog,
) -> Result<u32, MigrationError> {
  let mut ctx = StepContext {
    catalog,
    clock: SequentialClock::starting_at(Utc::now()),
  };

  let mut version = from;
  for step in STEPS.iter().filter(|s| s.version > from && s.version <= to) {
    tracing::info!(from = version, to = step.version, "migrating schema: {}", step.description);
    run_step(conn, step, &mut ctx).map_err(|reason| {
      tracing::error!(version = step.version, %reason, "schema migration failed");
      MigrationError::StepFailed {
        version: step.version,
        description: step.description,
        reason,
      }
    })?;
    version = step.version;
  }
  Ok(version)
}

fn run_step(conn: &mut Connection, step: &Step, ctx: &mut StepContext<'_>) -> Result<(), StepError> {
  let tx = conn.transaction()?;
  (step.apply)(&tx, ctx)?;
  check_foreign_keys(&tx)?;
  tx.pragma_update(None, "user_version", step.version)?;
  tx.commit()?;
  Ok(())
}

/// Fail on the first dangling reference left anywhere in the database.
fn check_foreign_keys(tx: &Transaction<'_>) -> Result<(), StepError> {
  let mut stmt = tx.prepare("PRAGMA foreign_key_check")?;
  let mut rows = stmt.query([])?;
  if let Some(row) = rows.next()? {
    return Err(StepError::ForeignKey {
      table:  row.get(0)?,
      rowid:  row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
      parent: row.get(2)?,
    });
  }
  Ok(())
}
