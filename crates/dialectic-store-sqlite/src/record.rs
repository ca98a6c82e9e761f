//! Row mapping for every entity type.
//!
//! Each entity reads into and writes from a `Raw*` struct of column strings;
//! conversion to domain types happens outside the connection thread, the same
//! way for every kind.

use dialectic_core::{
  Entity,
  model::{Claim, Evidence, Fallacy, Question, Rebuttal, Source, Tag, Topic},
};
use rusqlite::{Connection, OptionalExtension as _, Row, params};

use crate::{
  Result,
  encode::{
    decode_dt, decode_label, decode_opt_uuid, decode_strings, decode_uuid, decode_uuids,
    encode_dt, encode_strings, encode_uuid, encode_uuids,
  },
};

/// How an entity maps onto its table.
pub(crate) trait SqlRecord: Entity {
  const TABLE: &'static str;

  /// Column list over the table aliased `r`, without a `WHERE`.
  const SELECT: &'static str;

  /// Search predicate binding the query as `?1`.
  const SEARCH: &'static str;

  /// Whether [`Self::SEARCH`] is an FTS5 `MATCH` rather than a `LIKE`.
  const FULL_TEXT: bool = false;

  /// Whether the table has a `fingerprint` column.
  const FINGERPRINTED: bool = false;

  type Raw: Send + 'static;

  fn read(row: &Row<'_>) -> rusqlite::Result<Self::Raw>;
  fn decode(raw: Self::Raw) -> Result<Self>;
  fn encode(&self) -> Result<Self::Raw>;

  /// Insert, or overwrite in place when the id exists. Never `REPLACE`:
  /// that would delete the row first and fire the cascades.
  fn write(conn: &Connection, raw: &Self::Raw) -> rusqlite::Result<()>;

  /// The first referenced fallacy id that does not exist.
  fn unknown_fallacy(_conn: &Connection, _raw: &Self::Raw) -> rusqlite::Result<Option<String>> {
    Ok(None)
  }

  /// Update denormalised copies of this record's content held by other
  /// rows. Runs in the write transaction, before the row is written.
  fn sync_copies(_conn: &Connection, _raw: &Self::Raw) -> rusqlite::Result<()> { Ok(()) }

  /// Remove references to the row `id` that no foreign key covers. Runs in
  /// the delete transaction, before the row goes.
  fn detach(_conn: &Connection, _id: &str) -> rusqlite::Result<()> { Ok(()) }
}

fn first_unknown_fallacy(conn: &Connection, fallacy_ids: &str) -> rusqlite::Result<Option<String>> {
  conn
    .query_row(
      "SELECT value FROM json_each(?1)
       WHERE value NOT IN (SELECT id FROM fallacies)
       LIMIT 1",
      [fallacy_ids],
      |row| row.get(0),
    )
    .optional()
}

// ─── Topic ───────────────────────────────────────────────────────────────────

pub(crate) struct RawTopic {
  id:          String,
  title:       String,
  summary:     String,
  posture:     String,
  tags:        String,
  fingerprint: Option<String>,
  created_at:  String,
  updated_at:  String,
}

impl SqlRecord for Topic {
  const TABLE: &'static str = "topics";
  const SELECT: &'static str = "SELECT r.id, r.title, r.summary, r.posture, r.tags, \
                                r.fingerprint, r.created_at, r.updated_at FROM topics r";
  const SEARCH: &'static str =
    "r.id IN (SELECT topic_id FROM topics_fts WHERE topics_fts MATCH ?1)";
  const FULL_TEXT: bool = true;
  const FINGERPRINTED: bool = true;

  type Raw = RawTopic;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawTopic> {
    Ok(RawTopic {
      id:          row.get(0)?,
      title:       row.get(1)?,
      summary:     row.get(2)?,
      posture:     row.get(3)?,
      tags:        row.get(4)?,
      fingerprint: row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  fn decode(raw: RawTopic) -> Result<Self> {
    Ok(Self {
      id:          decode_uuid(&raw.id)?,
      title:       raw.title,
      summary:     raw.summary,
      posture:     decode_label(&raw.posture)?,
      tags:        decode_strings(&raw.tags)?,
      fingerprint: raw.fingerprint,
      created_at:  decode_dt(&raw.created_at)?,
      updated_at:  decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawTopic> {
    Ok(RawTopic {
      id:          encode_uuid(self.id),
      title:       self.title.clone(),
      summary:     self.summary.clone(),
      posture:     self.posture.as_str().to_owned(),
      tags:        encode_strings(&self.tags)?,
      fingerprint: self.fingerprint.clone(),
      created_at:  encode_dt(self.created_at),
      updated_at:  encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawTopic) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO topics (id, title, summary, posture, tags, fingerprint, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
       ON CONFLICT(id) DO UPDATE SET
         title = excluded.title, summary = excluded.summary, posture = excluded.posture,
         tags = excluded.tags, fingerprint = excluded.fingerprint,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![
        raw.id,
        raw.title,
        raw.summary,
        raw.posture,
        raw.tags,
        raw.fingerprint,
        raw.created_at,
        raw.updated_at,
      ],
    )?;
    Ok(())
  }
}

// ─── Claim ───────────────────────────────────────────────────────────────────

pub(crate) struct RawClaim {
  id:          String,
  text:        String,
  stance:      String,
  strength:    String,
  /// JSON array, in `claim_topics.position` order.
  topic_ids:   String,
  fallacy_ids: String,
  fingerprint: String,
  created_at:  String,
  updated_at:  String,
}

impl SqlRecord for Claim {
  const TABLE: &'static str = "claims";
  const SELECT: &'static str = "SELECT r.id, r.text, r.stance, r.strength, \
     (SELECT json_group_array(ct.topic_id ORDER BY ct.position) \
        FROM claim_topics ct WHERE ct.claim_id = r.id), \
     r.fallacy_ids, r.fingerprint, r.created_at, r.updated_at FROM claims r";
  const SEARCH: &'static str =
    "r.id IN (SELECT claim_id FROM claims_fts WHERE claims_fts MATCH ?1)";
  const FULL_TEXT: bool = true;
  const FINGERPRINTED: bool = true;

  type Raw = RawClaim;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawClaim> {
    Ok(RawClaim {
      id:          row.get(0)?,
      text:        row.get(1)?,
      stance:      row.get(2)?,
      strength:    row.get(3)?,
      topic_ids:   row.get(4)?,
      fallacy_ids: row.get(5)?,
      fingerprint: row.get(6)?,
      created_at:  row.get(7)?,
      updated_at:  row.get(8)?,
    })
  }

  fn decode(raw: RawClaim) -> Result<Self> {
    Ok(Self {
      id:          decode_uuid(&raw.id)?,
      text:        raw.text,
      stance:      decode_label(&raw.stance)?,
      strength:    decode_label(&raw.strength)?,
      topic_ids:   decode_uuids(&raw.topic_ids)?,
      fallacy_ids: decode_uuids(&raw.fallacy_ids)?,
      fingerprint: raw.fingerprint,
      created_at:  decode_dt(&raw.created_at)?,
      updated_at:  decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawClaim> {
    Ok(RawClaim {
      id:          encode_uuid(self.id),
      text:        self.text.clone(),
      stance:      self.stance.as_str().to_owned(),
      strength:    self.strength.as_str().to_owned(),
      topic_ids:   encode_uuids(&self.topic_ids)?,
      fallacy_ids: encode_uuids(&self.fallacy_ids)?,
      fingerprint: self.fingerprint.clone(),
      created_at:  encode_dt(self.created_at),
      updated_at:  encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawClaim) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO claims (id, text, stance, strength, fallacy_ids, fingerprint, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
       ON CONFLICT(id) DO UPDATE SET
         text = excluded.text, stance = excluded.stance, strength = excluded.strength,
         fallacy_ids = excluded.fallacy_ids, fingerprint = excluded.fingerprint,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![
        raw.id,
        raw.text,
        raw.stance,
        raw.strength,
        raw.fallacy_ids,
        raw.fingerprint,
        raw.created_at,
        raw.updated_at,
      ],
    )?;
    conn.execute("DELETE FROM claim_topics WHERE claim_id = ?1", [&raw.id])?;
    conn.execute(
      "INSERT INTO claim_topics (claim_id, topic_id, position)
       SELECT ?1, value, key FROM json_each(?2)",
      params![raw.id, raw.topic_ids],
    )?;
    Ok(())
  }

  fn unknown_fallacy(conn: &Connection, raw: &RawClaim) -> rusqlite::Result<Option<String>> {
    first_unknown_fallacy(conn, &raw.fallacy_ids)
  }
}

// ─── Rebuttal ────────────────────────────────────────────────────────────────

pub(crate) struct RawRebuttal {
  id:          String,
  claim_id:    String,
  text:        String,
  fallacy_ids: String,
  created_at:  String,
  updated_at:  String,
}

impl SqlRecord for Rebuttal {
  const TABLE: &'static str = "rebuttals";
  const SELECT: &'static str = "SELECT r.id, r.claim_id, r.text, r.fallacy_ids, \
                                r.created_at, r.updated_at FROM rebuttals r";
  const SEARCH: &'static str = "r.text LIKE ?1 ESCAPE '\\'";

  type Raw = RawRebuttal;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawRebuttal> {
    Ok(RawRebuttal {
      id:          row.get(0)?,
      claim_id:    row.get(1)?,
      text:        row.get(2)?,
      fallacy_ids: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
    })
  }

  fn decode(raw: RawRebuttal) -> Result<Self> {
    Ok(Self {
      id:          decode_uuid(&raw.id)?,
      claim_id:    decode_uuid(&raw.claim_id)?,
      text:        raw.text,
      fallacy_ids: decode_uuids(&raw.fallacy_ids)?,
      created_at:  decode_dt(&raw.created_at)?,
      updated_at:  decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawRebuttal> {
    Ok(RawRebuttal {
      id:          encode_uuid(self.id),
      claim_id:    encode_uuid(self.claim_id),
      text:        self.text.clone(),
      fallacy_ids: encode_uuids(&self.fallacy_ids)?,
      created_at:  encode_dt(self.created_at),
      updated_at:  encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawRebuttal) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO rebuttals (id, claim_id, text, fallacy_ids, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT(id) DO UPDATE SET
         claim_id = excluded.claim_id, text = excluded.text, fallacy_ids = excluded.fallacy_ids,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![raw.id, raw.claim_id, raw.text, raw.fallacy_ids, raw.created_at, raw.updated_at],
    )?;
    Ok(())
  }

  fn unknown_fallacy(conn: &Connection, raw: &RawRebuttal) -> rusqlite::Result<Option<String>> {
    first_unknown_fallacy(conn, &raw.fallacy_ids)
  }
}

// ─── Evidence ────────────────────────────────────────────────────────────────

pub(crate) struct RawEvidence {
  id:         String,
  claim_id:   String,
  content:    String,
  kind:       String,
  quality:    String,
  source_id:  Option<String>,
  created_at: String,
  updated_at: String,
}

impl SqlRecord for Evidence {
  const TABLE: &'static str = "evidence";
  const SELECT: &'static str = "SELECT r.id, r.claim_id, r.content, r.\"type\", r.quality, \
                                r.source_id, r.created_at, r.updated_at FROM evidence r";
  const SEARCH: &'static str = "r.content LIKE ?1 ESCAPE '\\'";

  type Raw = RawEvidence;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawEvidence> {
    Ok(RawEvidence {
      id:         row.get(0)?,
      claim_id:   row.get(1)?,
      content:    row.get(2)?,
      kind:       row.get(3)?,
      quality:    row.get(4)?,
      source_id:  row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  fn decode(raw: RawEvidence) -> Result<Self> {
    Ok(Self {
      id:         decode_uuid(&raw.id)?,
      claim_id:   decode_uuid(&raw.claim_id)?,
      content:    raw.content,
      kind:       decode_label(&raw.kind)?,
      quality:    decode_label(&raw.quality)?,
      source_id:  decode_opt_uuid(raw.source_id.as_deref())?,
      created_at: decode_dt(&raw.created_at)?,
      updated_at: decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawEvidence> {
    Ok(RawEvidence {
      id:         encode_uuid(self.id),
      claim_id:   encode_uuid(self.claim_id),
      content:    self.content.clone(),
      kind:       self.kind.as_str().to_owned(),
      quality:    self.quality.as_str().to_owned(),
      source_id:  self.source_id.map(encode_uuid),
      created_at: encode_dt(self.created_at),
      updated_at: encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawEvidence) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO evidence (id, claim_id, content, \"type\", quality, source_id, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
       ON CONFLICT(id) DO UPDATE SET
         claim_id = excluded.claim_id, content = excluded.content, \"type\" = excluded.\"type\",
         quality = excluded.quality, source_id = excluded.source_id,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![
        raw.id,
        raw.claim_id,
        raw.content,
        raw.kind,
        raw.quality,
        raw.source_id,
        raw.created_at,
        raw.updated_at,
      ],
    )?;
    Ok(())
  }
}

// ─── Source ──────────────────────────────────────────────────────────────────

pub(crate) struct RawSource {
  id:          String,
  title:       String,
  citation:    Option<String>,
  url:         Option<String>,
  publisher:   Option<String>,
  date:        Option<String>,
  notes:       Option<String>,
  reliability: Option<f64>,
  fingerprint: String,
  created_at:  String,
  updated_at:  String,
}

impl SqlRecord for Source {
  const TABLE: &'static str = "sources";
  const SELECT: &'static str = "SELECT r.id, r.title, r.citation, r.url, r.publisher, r.date, \
                                r.notes, r.reliability, r.fingerprint, r.created_at, \
                                r.updated_at FROM sources r";
  const SEARCH: &'static str = "(r.title LIKE ?1 ESCAPE '\\' OR r.citation LIKE ?1 ESCAPE '\\' \
                                OR r.publisher LIKE ?1 ESCAPE '\\' OR r.notes LIKE ?1 ESCAPE '\\')";
  const FINGERPRINTED: bool = true;

  type Raw = RawSource;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawSource> {
    Ok(RawSource {
      id:          row.get(0)?,
      title:       row.get(1)?,
      citation:    row.get(2)?,
      url:         row.get(3)?,
      publisher:   row.get(4)?,
      date:        row.get(5)?,
      notes:       row.get(6)?,
      reliability: row.get(7)?,
      fingerprint: row.get(8)?,
      created_at:  row.get(9)?,
      updated_at:  row.get(10)?,
    })
  }

  fn decode(raw: RawSource) -> Result<Self> {
    Ok(Self {
      id:          decode_uuid(&raw.id)?,
      title:       raw.title,
      citation:    raw.citation,
      url:         raw.url,
      publisher:   raw.publisher,
      date:        raw.date,
      notes:       raw.notes,
      reliability: raw.reliability,
      fingerprint: raw.fingerprint,
      created_at:  decode_dt(&raw.created_at)?,
      updated_at:  decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawSource> {
    Ok(RawSource {
      id:          encode_uuid(self.id),
      title:       self.title.clone(),
      citation:    self.citation.clone(),
      url:         self.url.clone(),
      publisher:   self.publisher.clone(),
      date:        self.date.clone(),
      notes:       self.notes.clone(),
      reliability: self.reliability,
      fingerprint: self.fingerprint.clone(),
      created_at:  encode_dt(self.created_at),
      updated_at:  encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawSource) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO sources (id, title, citation, url, publisher, date, notes, reliability,
                            fingerprint, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
       ON CONFLICT(id) DO UPDATE SET
         title = excluded.title, citation = excluded.citation, url = excluded.url,
         publisher = excluded.publisher, date = excluded.date, notes = excluded.notes,
         reliability = excluded.reliability, fingerprint = excluded.fingerprint,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![
        raw.id,
        raw.title,
        raw.citation,
        raw.url,
        raw.publisher,
        raw.date,
        raw.notes,
        raw.reliability,
        raw.fingerprint,
        raw.created_at,
        raw.updated_at,
      ],
    )?;
    Ok(())
  }
}

// ─── Question ────────────────────────────────────────────────────────────────

pub(crate) struct RawQuestion {
  id:         String,
  target_id:  String,
  text:       String,
  kind:       String,
  created_at: String,
  updated_at: String,
}

impl SqlRecord for Question {
  const TABLE: &'static str = "questions";
  const SELECT: &'static str = "SELECT r.id, r.target_id, r.text, r.kind, \
                                r.created_at, r.updated_at FROM questions r";
  const SEARCH: &'static str = "r.text LIKE ?1 ESCAPE '\\'";

  type Raw = RawQuestion;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawQuestion> {
    Ok(RawQuestion {
      id:         row.get(0)?,
      target_id:  row.get(1)?,
      text:       row.get(2)?,
      kind:       row.get(3)?,
      created_at: row.get(4)?,
      updated_at: row.get(5)?,
    })
  }

  fn decode(raw: RawQuestion) -> Result<Self> {
    Ok(Self {
      id:         decode_uuid(&raw.id)?,
      target_id:  decode_uuid(&raw.target_id)?,
      text:       raw.text,
      kind:       decode_label(&raw.kind)?,
      created_at: decode_dt(&raw.created_at)?,
      updated_at: decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawQuestion> {
    Ok(RawQuestion {
      id:         encode_uuid(self.id),
      target_id:  encode_uuid(self.target_id),
      text:       self.text.clone(),
      kind:       self.kind.as_str().to_owned(),
      created_at: encode_dt(self.created_at),
      updated_at: encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawQuestion) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO questions (id, target_id, text, kind, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6)
       ON CONFLICT(id) DO UPDATE SET
         target_id = excluded.target_id, text = excluded.text, kind = excluded.kind,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![raw.id, raw.target_id, raw.text, raw.kind, raw.created_at, raw.updated_at],
    )?;
    Ok(())
  }
}

// ─── Tag ─────────────────────────────────────────────────────────────────────

pub(crate) struct RawTag {
  id:         String,
  label:      String,
  color:      Option<String>,
  created_at: String,
  updated_at: String,
}

impl SqlRecord for Tag {
  const TABLE: &'static str = "tags";
  const SELECT: &'static str =
    "SELECT r.id, r.label, r.color, r.created_at, r.updated_at FROM tags r";
  const SEARCH: &'static str = "r.label LIKE ?1 ESCAPE '\\'";

  type Raw = RawTag;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawTag> {
    Ok(RawTag {
      id:         row.get(0)?,
      label:      row.get(1)?,
      color:      row.get(2)?,
      created_at: row.get(3)?,
      updated_at: row.get(4)?,
    })
  }

  fn decode(raw: RawTag) -> Result<Self> {
    Ok(Self {
      id:         decode_uuid(&raw.id)?,
      label:      raw.label,
      color:      raw.color,
      created_at: decode_dt(&raw.created_at)?,
      updated_at: decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawTag> {
    Ok(RawTag {
      id:         encode_uuid(self.id),
      label:      self.label.clone(),
      color:      self.color.clone(),
      created_at: encode_dt(self.created_at),
      updated_at: encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawTag) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO tags (id, label, color, created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5)
       ON CONFLICT(id) DO UPDATE SET
         label = excluded.label, color = excluded.color,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![raw.id, raw.label, raw.color, raw.created_at, raw.updated_at],
    )?;
    Ok(())
  }

  /// Carry a relabel into every topic that lists the old label, keeping its
  /// position and dropping a later copy of the new one.
  fn sync_copies(conn: &Connection, raw: &RawTag) -> rusqlite::Result<()> {
    let old: Option<String> = conn
      .query_row("SELECT label FROM tags WHERE id = ?1", [&raw.id], |row| row.get(0))
      .optional()?;
    let Some(old) = old.filter(|old| *old != raw.label) else {
      return Ok(());
    };
    conn.execute(
      "UPDATE topics SET tags = (
           SELECT json_group_array(
             CASE WHEN t.value = ?1 COLLATE NOCASE THEN ?2 ELSE t.value END ORDER BY t.key
           )
           FROM json_each(topics.tags) t
           WHERE NOT EXISTS (
             SELECT 1 FROM json_each(topics.tags) e
             WHERE e.key < t.key
               AND (CASE WHEN e.value = ?1 COLLATE NOCASE THEN ?2 ELSE e.value END)
                 = (CASE WHEN t.value = ?1 COLLATE NOCASE THEN ?2 ELSE t.value END)
           )
       )
       WHERE EXISTS (
           SELECT 1 FROM json_each(topics.tags) WHERE value = ?1 COLLATE NOCASE
       )",
      params![old, raw.label],
    )?;
    Ok(())
  }

  /// Strip the label from every topic that carries it.
  fn detach(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    let label: Option<String> = conn
      .query_row("SELECT label FROM tags WHERE id = ?1", [id], |row| row.get(0))
      .optional()?;
    if let Some(label) = label {
      conn.execute(
        "UPDATE topics SET tags = (
             SELECT json_group_array(value) FROM json_each(topics.tags)
             WHERE value <> ?1 COLLATE NOCASE
         )
         WHERE EXISTS (
             SELECT 1 FROM json_each(topics.tags) WHERE value = ?1 COLLATE NOCASE
         )",
        [&label],
      )?;
    }
    Ok(())
  }
}

// ─── Fallacy ─────────────────────────────────────────────────────────────────

pub(crate) struct RawFallacy {
  id:          String,
  name:        String,
  description: String,
  example:     String,
  category:    String,
  is_custom:   bool,
  created_at:  String,
  updated_at:  String,
}

impl SqlRecord for Fallacy {
  const TABLE: &'static str = "fallacies";
  const SELECT: &'static str = "SELECT r.id, r.name, r.description, r.example, r.category, \
                                r.is_custom, r.created_at, r.updated_at FROM fallacies r";
  const SEARCH: &'static str = "(r.name LIKE ?1 ESCAPE '\\' OR r.description LIKE ?1 ESCAPE '\\')";

  type Raw = RawFallacy;

  fn read(row: &Row<'_>) -> rusqlite::Result<RawFallacy> {
    Ok(RawFallacy {
      id:          row.get(0)?,
      name:        row.get(1)?,
      description: row.get(2)?,
      example:     row.get(3)?,
      category:    row.get(4)?,
      is_custom:   row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  fn decode(raw: RawFallacy) -> Result<Self> {
    Ok(Self {
      id:          decode_uuid(&raw.id)?,
      name:        raw.name,
      description: raw.description,
      example:     raw.example,
      category:    raw.category,
      is_custom:   raw.is_custom,
      created_at:  decode_dt(&raw.created_at)?,
      updated_at:  decode_dt(&raw.updated_at)?,
    })
  }

  fn encode(&self) -> Result<RawFallacy> {
    Ok(RawFallacy {
      id:          encode_uuid(self.id),
      name:        self.name.clone(),
      description: self.description.clone(),
      example:     self.example.clone(),
      category:    self.category.clone(),
      is_custom:   self.is_custom,
      created_at:  encode_dt(self.created_at),
      updated_at:  encode_dt(self.updated_at),
    })
  }

  fn write(conn: &Connection, raw: &RawFallacy) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO fallacies (id, name, description, example, category, is_custom,
                              created_at, updated_at)
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
       ON CONFLICT(id) DO UPDATE SET
         name = excluded.name, description = excluded.description, example = excluded.example,
         category = excluded.category, is_custom = excluded.is_custom,
         created_at = excluded.created_at, updated_at = excluded.updated_at",
      params![
        raw.id,
        raw.name,
        raw.description,
        raw.example,
        raw.category,
        raw.is_custom,
        raw.created_at,
        raw.updated_at,
      ],
    )?;
    Ok(())
  }

  /// Drop the id from every claim's and rebuttal's fallacy list.
  fn detach(conn: &Connection, id: &str) -> rusqlite::Result<()> {
    for table in ["claims", "rebuttals"] {
      conn.execute(
        &format!(
          "UPDATE {table} SET fallacy_ids = (
               SELECT json_group_array(value) FROM json_each({table}.fallacy_ids)
               WHERE value <> ?1
           )
           WHERE EXISTS (SELECT 1 FROM json_each({table}.fallacy_ids) WHERE value = ?1)"
        ),
        [id],
      )?;
    }
    Ok(())
  }
}
