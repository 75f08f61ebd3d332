use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use curator_core::traits::StructuredStore;
use curator_core::types::{FeedbackExample, InsertOutcome, Record, RecordId, ResourceKind, Vote};

use crate::schema::{init_schema, RECORD_COLUMNS};

/// SQLite-backed record store. `url` carries a UNIQUE constraint, so
/// concurrent inserts of one url resolve to a single row.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {parent:?}"))?;
        }
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open SQLite database at {db_path:?}"))?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            ",
        )
        .context("Failed to configure SQLite pragmas")?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    /// Runs `f` against the connection on the blocking pool so SQLite I/O
    /// never stalls a runtime worker.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| anyhow!("sqlite connection lock poisoned"))?;
            f(&guard)
        })
        .await
        .context("sqlite task panicked")?
    }

    fn query_records<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Record>> {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRecord::from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?.into_record()?);
        }
        Ok(out)
    }
}

struct RawRecord {
    id: String,
    url: String,
    kind: String,
    title: String,
    summary: String,
    author: String,
    published_at: String,
    concepts: String,
    tech_stack: String,
    recommended_reason: Option<String>,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            url: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            summary: row.get(4)?,
            author: row.get(5)?,
            published_at: row.get(6)?,
            concepts: row.get(7)?,
            tech_stack: row.get(8)?,
            recommended_reason: row.get(9)?,
        })
    }

    fn into_record(self) -> Result<Record> {
        let kind: ResourceKind = self.kind.parse()?;
        let published_at = DateTime::parse_from_rfc3339(&self.published_at)
            .with_context(|| format!("bad published_at for record {}", self.id))?
            .with_timezone(&Utc);
        let concepts: BTreeSet<String> = serde_json::from_str(&self.concepts)?;
        let tech_stack: BTreeSet<String> = serde_json::from_str(&self.tech_stack)?;
        Ok(Record {
            id: self.id,
            url: self.url,
            kind,
            title: self.title,
            summary: self.summary,
            author: self.author,
            published_at,
            concepts,
            tech_stack,
            recommended_reason: self.recommended_reason,
        })
    }
}

#[async_trait]
impl StructuredStore for SqliteStore {
    async fn insert(&self, record: &Record) -> Result<InsertOutcome> {
        let record = record.clone();
        self.with_conn(move |conn| {
            let changed = conn.execute(
                &format!(
                    "INSERT INTO records ({RECORD_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                     ON CONFLICT(url) DO NOTHING"
                ),
                params![
                    record.id,
                    record.url,
                    record.kind.as_str(),
                    record.title,
                    record.summary,
                    record.author,
                    record.published_at.to_rfc3339(),
                    serde_json::to_string(&record.concepts)?,
                    serde_json::to_string(&record.tech_stack)?,
                    record.recommended_reason,
                ],
            )?;
            if changed == 0 {
                debug!(url = %record.url, "url already stored");
                return Ok(InsertOutcome::Duplicate);
            }
            Ok(InsertOutcome::Inserted)
        })
        .await
    }

    async fn get(&self, id: &str) -> Result<Option<Record>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1"), [&id], RawRecord::from_row)
                .optional()?;
            raw.map(RawRecord::into_record).transpose()
        })
        .await
    }

    async fn get_many(&self, ids: &[RecordId]) -> Result<Vec<Record>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = ids.to_vec();
        self.with_conn(move |conn| {
            let placeholders = vec!["?"; ids.len()].join(", ");
            Self::query_records(
                conn,
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE id IN ({placeholders})"),
                params_from_iter(ids.iter()),
            )
        })
        .await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Record>> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE url = ?1"), [&url], RawRecord::from_row)
                .optional()?;
            raw.map(RawRecord::into_record).transpose()
        })
        .await
    }

    async fn exists_by_url(&self, url: &str) -> Result<bool> {
        let url = url.to_string();
        self.with_conn(move |conn| {
            let found: Option<i64> = conn
                .query_row("SELECT 1 FROM records WHERE url = ?1", [&url], |row| row.get(0))
                .optional()?;
            Ok(found.is_some())
        })
        .await
    }

    async fn search_text(&self, needles: &[String], limit: usize) -> Result<Vec<Record>> {
        let needles: Vec<String> = needles.iter().map(|n| n.trim().to_string()).filter(|n| !n.is_empty()).collect();
        self.with_conn(move |conn| {
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for needle in &needles {
                if out.len() >= limit {
                    break;
                }
                let matches = Self::query_records(
                    conn,
                    &format!(
                        "SELECT {RECORD_COLUMNS} FROM records
                         WHERE instr(lower(title), lower(?1)) > 0 OR instr(lower(summary), lower(?1)) > 0
                         ORDER BY published_at DESC LIMIT ?2"
                    ),
                    params![needle, limit as i64],
                )?;
                for record in matches {
                    if out.len() < limit && seen.insert(record.id.clone()) {
                        out.push(record);
                    }
                }
            }
            Ok(out)
        })
        .await
    }

    async fn all(&self) -> Result<Vec<Record>> {
        self.with_conn(|conn| {
            Self::query_records(conn, &format!("SELECT {RECORD_COLUMNS} FROM records ORDER BY created_at, id"), ())
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.with_conn(move |conn| Ok(conn.execute("DELETE FROM records WHERE id = ?1", [&id])? > 0)).await
    }

    async fn add_feedback(&self, record_id: &str, vote: Vote, reason: Option<&str>) -> Result<()> {
        let record_id = record_id.to_string();
        let reason = reason.map(str::to_string);
        self.with_conn(move |conn| {
            let exists: Option<i64> = conn
                .query_row("SELECT 1 FROM records WHERE id = ?1", [&record_id], |row| row.get(0))
                .optional()?;
            if exists.is_none() {
                bail!("no record with id {record_id}");
            }
            conn.execute(
                "INSERT INTO feedback (record_id, vote, reason) VALUES (?1, ?2, ?3)",
                params![record_id, vote.as_str(), reason],
            )?;
            Ok(())
        })
        .await
    }

    async fn recent_feedback(&self, vote: Vote, limit: usize) -> Result<Vec<FeedbackExample>> {
        self.with_conn(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT r.title, f.reason FROM feedback f JOIN records r ON r.id = f.record_id
                 WHERE f.vote = ?1 AND f.reason IS NOT NULL AND trim(f.reason) <> ''
                 ORDER BY f.created_at DESC, f.id DESC LIMIT ?2",
            )?;
            let rows = stmt.query_map(params![vote.as_str(), limit as i64], |row| {
                Ok(FeedbackExample { title: row.get(0)?, reason: row.get(1)?, vote })
            })?;
            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
        .await
    }
}
