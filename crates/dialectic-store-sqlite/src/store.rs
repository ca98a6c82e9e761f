//! [`SqliteStore`]: the SQLite implementation of [`DebateStore`].

use std::{path::Path, sync::Arc};

use chrono::Utc;
use dialectic_core::{
  catalog::FallacyCatalog,
  model::TargetRef,
  store::{DebateStore, MergeLocks, Repository, StoreBackend},
};
use rusqlite::{OpenFlags, OptionalExtension as _, params_from_iter};
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::encode_uuid,
  migrate::{CURRENT_VERSION, migrate, schema_version},
  record::SqlRecord,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A debate store backed by a single SQLite file.
///
/// Opening a store migrates it to [`CURRENT_VERSION`]; nothing else can touch
/// the database before that succeeds. Cloning is cheap: the connection, the
/// fallacy catalog and the import/export flags are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  catalog: Arc<FallacyCatalog>,
  locks:   MergeLocks,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and migrate it.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::init(conn).await
  }

  /// Open an in-memory store, as the tests do.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::init(conn).await
  }

  /// Read the schema version of the store at `path` without migrating or
  /// creating it.
  pub async fn inspect(path: impl AsRef<Path>) -> Result<u32> {
    let conn =
      tokio_rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY).await?;
    Ok(conn.call(|conn| Ok(schema_version(conn)?)).await?)
  }

  async fn init(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let catalog = Arc::new(FallacyCatalog::new());
    let for_migration = Arc::clone(&catalog);

    // The run happens on the connection thread and finishes even if this
    // future is dropped.
    let version = conn
      .call(move |conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;")?;
        Ok(migrate(conn, CURRENT_VERSION, &for_migration))
      })
      .await??;

    tracing::info!(version, "store ready");
    Ok(Self { conn, catalog, locks: MergeLocks::default() })
  }

  /// The fallacy name → id cache shared with the migration engine.
  pub fn catalog(&self) -> &FallacyCatalog { &self.catalog }

  /// Rows of `E` matching `clause`, in insertion order.
  async fn select<E: SqlRecord>(&self, clause: &str, params: Vec<String>) -> Result<Vec<E>> {
    let sql = format!("{} {clause}", E::SELECT);
    let raws: Vec<E::Raw> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), E::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(E::decode).collect()
  }

  /// Write `entity` as given, with its dependent rows, in one transaction.
  async fn write<E: SqlRecord>(&self, entity: E) -> Result<E> {
    let raw = entity.encode()?;
    let unknown = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(id) = E::unknown_fallacy(&tx, &raw)? {
          return Ok(Some(id));
        }
        E::sync_copies(&tx, &raw)?;
        E::write(&tx, &raw)?;
        tx.commit()?;
        Ok(None)
      })
      .await?;

    if let Some(id) = unknown {
      return Err(Error::UnknownFallacy(id));
    }
    tracing::debug!(kind = %E::KIND, id = %entity.id(), "wrote record");
    Ok(entity)
  }
}

/// An FTS5 query matching rows that contain every term, each as a prefix.
fn fts_query(query: &str) -> String {
  query
    .split_whitespace()
    .map(|term| format!("\"{}\"*", term.replace('"', "\"\"")))
    .collect::<Vec<_>>()
    .join(" ")
}

/// A `LIKE` pattern matching `query` anywhere, with wildcards escaped.
fn like_pattern(query: &str) -> String {
  let mut pattern = String::with_capacity(query.len() + 2);
  pattern.push('%');
  for c in query.trim().chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

// ─── Repository impl ─────────────────────────────────────────────────────────

impl StoreBackend for SqliteStore {
  type Error = Error;
}

impl<E: SqlRecord> Repository<E> for SqliteStore {
  async fn create(&self, draft: E::Draft) -> Result<E> {
    let entity = E::from_draft(Uuid::new_v4(), draft, Utc::now())?;
    self.write(entity).await
  }

  async fn get(&self, id: Uuid) -> Result<Option<E>> {
    let mut found = self.select::<E>("WHERE r.id = ?1", vec![encode_uuid(id)]).await?;
    Ok(found.pop())
  }

  async fn list(&self) -> Result<Vec<E>> { self.select("ORDER BY r.rowid", Vec::new()).await }

  async fn search(&self, query: String) -> Result<Vec<E>> {
    if query.trim().is_empty() {
      return Ok(Vec::new());
    }
    let param = if E::FULL_TEXT { fts_query(&query) } else { like_pattern(&query) };
    self
      .select(&format!("WHERE {} ORDER BY r.rowid", E::SEARCH), vec![param])
      .await
  }

  async fn update(&self, mut entity: E) -> Result<E> {
    let id = entity.id();
    let Some(stored) = Repository::<E>::get(self, id).await? else {
      return Err(Error::NotFound { kind: E::KIND, id });
    };

    entity.refresh();
    entity.validate()?;
    let updated_at = Utc::now().max(stored.updated_at());
    entity.set_timestamps(stored.created_at(), updated_at);
    self.write(entity).await
  }

  async fn delete(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        E::detach(&tx, &id_str)?;
        let n = tx.execute(&format!("DELETE FROM {} WHERE id = ?1", E::TABLE), [&id_str])?;
        tx.commit()?;
        Ok(n > 0)
      })
      .await?;

    if deleted {
      tracing::debug!(kind = %E::KIND, %id, "deleted record");
    }
    Ok(deleted)
  }

  async fn find_by_fingerprint(&self, fingerprint: String) -> Result<Option<E>> {
    if !E::FINGERPRINTED {
      return Ok(None);
    }
    let mut found = self
      .select::<E>(
        "WHERE r.fingerprint = ?1 ORDER BY r.created_at, r.rowid LIMIT 1",
        vec![fingerprint],
      )
      .await?;
    Ok(found.pop())
  }

  async fn put(&self, mut entity: E) -> Result<E> {
    entity.refresh();
    entity.validate()?;
    self.write(entity).await
  }
}

// ─── DebateStore impl ────────────────────────────────────────────────────────

impl DebateStore for SqliteStore {
  fn merge_locks(&self) -> &MergeLocks { &self.locks }

  async fn schema_version(&self) -> Result<u32> {
    Ok(self.conn.call(|conn| Ok(schema_version(conn)?)).await?)
  }

  async fn cleanup_orphan_questions(&self) -> Result<usize> {
    let removed = self
      .conn
      .call(|conn| {
        Ok(conn.execute(
          "DELETE FROM questions
           WHERE target_id NOT IN (SELECT id FROM topics)
             AND target_id NOT IN (SELECT id FROM claims)",
          [],
        )?)
      })
      .await?;

    if removed > 0 {
      tracing::info!(removed, "deleted orphaned questions");
    }
    Ok(removed)
  }

  async fn resolve_target(&self, target_id: Uuid) -> Result<Option<TargetRef>> {
    let id_str = encode_uuid(target_id);
    let kind: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 'topic' FROM topics WHERE id = ?1
               UNION ALL
               SELECT 'claim' FROM claims WHERE id = ?1
               LIMIT 1",
              [&id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    let target = match kind.as_deref() {
      Some("topic") => Some(TargetRef::Topic(target_id)),
      Some("claim") => Some(TargetRef::Claim(target_id)),
      _ => None,
    };
    Ok(target)
  }
}
