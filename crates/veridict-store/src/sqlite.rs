//! SQLite-backed verdict cache.
//!
//! Statements here are short single-row reads and writes, so the
//! connection sits behind an async mutex rather than a blocking pool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tokio::sync::Mutex;
use veridict_common::{SourceRef, Verdict, VerdictStatus};

use crate::error::Result;
use crate::repository::{CachedVerdict, InsertOutcome, VerdictRepository};

/// Status and confidence are CHECK-constrained to match the application
/// invariants. `updated_at` carries a refresh trigger for future manual
/// corrections, although no application code path updates a row today.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS verdicts (
    fingerprint   TEXT PRIMARY KEY,
    input_text    TEXT NOT NULL,
    status        TEXT NOT NULL CHECK (status IN ('real', 'fake', 'uncertain')),
    confidence    INTEGER NOT NULL CHECK (confidence BETWEEN 0 AND 100),
    justification TEXT NOT NULL,
    sources       TEXT NOT NULL,
    raw_response  TEXT,
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS verdicts_touch_updated_at
AFTER UPDATE ON verdicts
FOR EACH ROW
BEGIN
    UPDATE verdicts
    SET updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
    WHERE fingerprint = NEW.fingerprint;
END;
"#;

pub struct SqliteVerdictRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteVerdictRepository {
    /// Open or create the cache database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database, used in tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

type VerdictRow = (
    String,         // fingerprint
    String,         // input_text
    String,         // status
    i64,            // confidence
    String,         // justification
    String,         // sources JSON
    Option<String>, // raw_response
    String,         // created_at
    String,         // updated_at
);

fn row_to_record(row: VerdictRow) -> Result<CachedVerdict> {
    let (fingerprint, input_text, status, confidence, justification, sources, raw, created, updated) =
        row;
    let sources: Vec<SourceRef> = serde_json::from_str(&sources)?;
    Ok(CachedVerdict {
        fingerprint,
        input_text,
        verdict: Verdict {
            status: VerdictStatus::coerce(&status),
            confidence: confidence.clamp(0, 100) as u8,
            justification,
            sources,
        },
        raw_response: raw,
        created_at: parse_utc(&created)?,
        updated_at: parse_utc(&updated)?,
    })
}

fn parse_utc(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[async_trait]
impl VerdictRepository for SqliteVerdictRepository {
    async fn lookup(&self, fingerprint: &str) -> Result<Option<CachedVerdict>> {
        let conn = self.conn.lock().await;
        let row: Option<VerdictRow> = conn
            .query_row(
                "SELECT fingerprint, input_text, status, confidence, justification,
                        sources, raw_response, created_at, updated_at
                 FROM verdicts WHERE fingerprint = ?1",
                params![fingerprint],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                        row.get(8)?,
                    ))
                },
            )
            .optional()?;
        row.map(row_to_record).transpose()
    }

    async fn insert(&self, record: &CachedVerdict) -> Result<InsertOutcome> {
        let sources = serde_json::to_string(&record.verdict.sources)?;
        let conn = self.conn.lock().await;
        // INSERT OR IGNORE: first writer wins, a lost race is benign.
        let changed = conn.execute(
            "INSERT OR IGNORE INTO verdicts
                 (fingerprint, input_text, status, confidence, justification,
                  sources, raw_response, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                record.fingerprint,
                record.input_text,
                record.verdict.status.as_str(),
                record.verdict.confidence as i64,
                record.verdict.justification,
                sources,
                record.raw_response,
                record.created_at.to_rfc3339(),
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(if changed == 0 {
            InsertOutcome::Conflict
        } else {
            InsertOutcome::Inserted
        })
    }
}
