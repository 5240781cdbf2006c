//! Conversation history keyed by session id.
//!
//! Stored in SQLite next to the vector store, so the tutor remembers a
//! conversation across requests and restarts.

use crate::error::{Result, StudyError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id TEXT NOT NULL,
        role TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id, id);
"#;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = StudyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(StudyError::Session(format!("Unknown role: {}", other))),
        }
    }
}

/// A stored conversation message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// SQLite-backed session store.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl SessionStore {
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Opened session store at {:?}", path);
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StudyError::Session(format!("Failed to acquire lock: {}", e)))
    }

    /// Append a message to a session.
    #[instrument(skip(self, content))]
    pub fn append(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO messages (session_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![session_id, role.as_str(), content, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// The last `limit` messages of a session, oldest first.
    #[instrument(skip(self))]
    pub fn history(&self, session_id: &str, limit: usize) -> Result<Vec<SessionMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT role, content, created_at FROM (
                SELECT id, role, content, created_at FROM messages
                WHERE session_id = ?1
                ORDER BY id DESC
                LIMIT ?2
            ) ORDER BY id ASC
            "#,
        )?;

        let rows = stmt.query_map(params![session_id, limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut messages = Vec::new();
        for row in rows {
            let (role, content, created_at) = row?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now());
            messages.push(SessionMessage {
                role: role.parse()?,
                content,
                created_at,
            });
        }

        debug!("Loaded {} messages for session {}", messages.len(), session_id);
        Ok(messages)
    }

    /// Delete every message of a session.
    pub fn clear(&self, session_id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM messages WHERE session_id = ?1", params![session_id])?;
        Ok(deleted)
    }
}
