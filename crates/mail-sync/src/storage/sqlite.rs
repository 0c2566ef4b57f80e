//! SQLite-based document store

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use rusqlite_migration::{M, Migrations};
use serde_json::{Map, Value};

use super::{DocumentStore, WriteBatch};
use crate::models::{MessageId, MessageSummary, SummaryDocument, UserId};

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            -- One document per user, stored as a JSON object
            CREATE TABLE users (
                uid TEXT PRIMARY KEY,
                data TEXT NOT NULL
            );

            -- users/{uid}/emails/{message_id}
            CREATE TABLE email_summaries (
                uid TEXT NOT NULL,
                message_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                sender TEXT NOT NULL,
                body_snippet TEXT NOT NULL,
                received_at TEXT NOT NULL,
                PRIMARY KEY (uid, message_id)
            );
            "#,
        ),
    ])
}

/// SQLite-backed DocumentStore
///
/// A batch commit runs in a single transaction; a failure rolls back every
/// write in it.
pub struct SqliteDocumentStore {
    conn: Mutex<Connection>,
}

impl SqliteDocumentStore {
    /// Open (or create) the database at `db_path` and run migrations
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        // WAL lets readers proceed while a batch is being committed.
        // busy_timeout covers two invocations committing at once.
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("database connection lock poisoned"))
    }

    fn load_user(conn: &Connection, uid: &UserId) -> Result<Option<Map<String, Value>>> {
        let data: Option<String> = conn
            .query_row("SELECT data FROM users WHERE uid = ?", [uid.as_str()], |row| row.get(0))
            .optional()?;

        let Some(data) = data else {
            return Ok(None);
        };

        match serde_json::from_str::<Value>(&data)
            .with_context(|| format!("Corrupt user document for {}", uid))?
        {
            Value::Object(map) => Ok(Some(map)),
            _ => bail!("User document for {} is not an object", uid),
        }
    }

    fn row_to_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, SummaryDocument, String)> {
        Ok((
            row.get(0)?,
            SummaryDocument {
                subject: row.get(1)?,
                from: row.get(2)?,
                body_snippet: row.get(3)?,
            },
            row.get(4)?,
        ))
    }

    fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .with_context(|| format!("Invalid stored timestamp: {}", value))
    }
}

impl DocumentStore for SqliteDocumentStore {
    fn get_user_document(&self, uid: &UserId) -> Result<Option<Map<String, Value>>> {
        let conn = self.lock()?;
        Self::load_user(&conn, uid)
    }

    fn merge_user_document(&self, uid: &UserId, fields: Map<String, Value>) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut doc = Self::load_user(&tx, uid)?.unwrap_or_default();
        doc.extend(fields);
        let data = serde_json::to_string(&doc)?;

        tx.execute(
            "INSERT INTO users (uid, data) VALUES (?, ?)
             ON CONFLICT(uid) DO UPDATE SET data = excluded.data",
            params![uid.as_str(), data],
        )?;
        tx.commit().context("Failed to commit user document merge")?;
        Ok(())
    }

    fn commit(&self, batch: WriteBatch) -> Result<usize> {
        let received_at = Utc::now().to_rfc3339();
        let count = batch.len();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO email_summaries
                    (uid, message_id, subject, sender, body_snippet, received_at)
                 VALUES (?, ?, ?, ?, ?, ?)
                 ON CONFLICT(uid, message_id) DO UPDATE SET
                    subject = excluded.subject,
                    sender = excluded.sender,
                    body_snippet = excluded.body_snippet,
                    received_at = excluded.received_at",
            )?;

            for write in batch.writes() {
                stmt.execute(params![
                    write.uid.as_str(),
                    write.message_id.as_str(),
                    write.doc.subject,
                    write.doc.from,
                    write.doc.body_snippet,
                    received_at,
                ])?;
            }
        }
        tx.commit().context("Failed to commit write batch")?;
        Ok(count)
    }

    fn get_summary(&self, uid: &UserId, id: &MessageId) -> Result<Option<MessageSummary>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT message_id, subject, sender, body_snippet, received_at
                 FROM email_summaries WHERE uid = ? AND message_id = ?",
                params![uid.as_str(), id.as_str()],
                Self::row_to_summary,
            )
            .optional()?;

        row.map(|(id, doc, at)| -> Result<MessageSummary> {
            Ok(MessageSummary::from_document(MessageId::new(id), doc, Self::parse_timestamp(&at)?))
        })
        .transpose()
    }

    fn list_summaries(&self, uid: &UserId) -> Result<Vec<MessageSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT message_id, subject, sender, body_snippet, received_at
             FROM email_summaries WHERE uid = ? ORDER BY message_id",
        )?;

        let rows = stmt
            .query_map([uid.as_str()], Self::row_to_summary)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, doc, at)| -> Result<MessageSummary> {
                Ok(MessageSummary::from_document(MessageId::new(id), doc, Self::parse_timestamp(&at)?))
            })
            .collect()
    }

    fn count_summaries(&self, uid: &UserId) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM email_summaries WHERE uid = ?",
            [uid.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
