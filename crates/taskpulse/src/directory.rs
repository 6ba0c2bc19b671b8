// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record directory backing the daemon's task/user lookups.
//!
//! The authoritative document store belongs to the web application; this
//! daemon only needs point lookups (reminder re-validation, handshake user
//! checks, notification recipients). [`SqliteDirectory`] reads a mirror the
//! embedding application maintains in the daemon's SQLite database: one JSON
//! snapshot per record, upserted alongside each mutation it dispatches.
//!
//! Without a configured database there is no mirror; [`PermissiveDirectory`]
//! then accepts every token-authenticated user for the socket handshake and
//! resolves no records, so recipient lookups (and their notifications) are
//! skipped.

use async_trait::async_trait;
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::warn;

use taskpulse_core::{PulseError, Task, TaskStore, User, UserStore};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS task_records (
    id     TEXT PRIMARY KEY,
    record TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS user_records (
    id     TEXT PRIMARY KEY,
    record TEXT NOT NULL
);
";

/// Read-side mirror of task and user records.
pub struct SqliteDirectory {
    conn: Connection,
}

fn map_tr_err(e: tokio_rusqlite::Error) -> PulseError {
    PulseError::Storage {
        source: Box::new(e),
    }
}

impl SqliteDirectory {
    /// Open the mirror in the given database, creating the tables if needed.
    ///
    /// The file is shared with the queue, so this is a second connection to a
    /// WAL database with a concurrent writer; the busy timeout makes upserts
    /// wait out the worker's write lock instead of failing with SQLITE_BUSY.
    pub async fn open(path: &str) -> Result<Self, PulseError> {
        let conn = Connection::open(path).await.map_err(|e| map_tr_err(e.into()))?;
        conn.call(|conn| {
            conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn })
    }

    async fn fetch_record(&self, table: &'static str, id: &str) -> Result<Option<String>, PulseError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt =
                    conn.prepare_cached(&format!("SELECT record FROM {table} WHERE id = ?1"))?;
                match stmt.query_row(params![id], |row| row.get::<_, String>(0)) {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Upsert a record snapshot. Exposed for the embedding application and
    /// the test suite.
    pub async fn put_record(
        &self,
        table: &'static str,
        id: &str,
        record: String,
    ) -> Result<(), PulseError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    &format!(
                        "INSERT INTO {table} (id, record) VALUES (?1, ?2)
                         ON CONFLICT(id) DO UPDATE SET record = excluded.record"
                    ),
                    params![id, record],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    pub async fn put_task(&self, task: &Task) -> Result<(), PulseError> {
        let record = serde_json::to_string(task)
            .map_err(|e| PulseError::Internal(format!("task serialization failed: {e}")))?;
        self.put_record("task_records", &task.id, record).await
    }

    /// Flip the mirrored task's soft-delete flag, so a pending reminder for
    /// it is skipped at processing time. Unknown ids are a no-op.
    pub async fn mark_task_deleted(&self, task_id: &str) -> Result<(), PulseError> {
        if let Some(mut task) = self.find_task(task_id).await? {
            task.is_deleted = true;
            self.put_task(&task).await?;
        }
        Ok(())
    }

    pub async fn put_user(&self, user: &User) -> Result<(), PulseError> {
        let record = serde_json::to_string(user)
            .map_err(|e| PulseError::Internal(format!("user serialization failed: {e}")))?;
        self.put_record("user_records", &user.id, record).await
    }
}

#[async_trait]
impl TaskStore for SqliteDirectory {
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>, PulseError> {
        let Some(record) = self.fetch_record("task_records", task_id).await? else {
            return Ok(None);
        };
        serde_json::from_str(&record)
            .map(Some)
            .map_err(|e| PulseError::Internal(format!("corrupt task record {task_id}: {e}")))
    }
}

#[async_trait]
impl UserStore for SqliteDirectory {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, PulseError> {
        let Some(record) = self.fetch_record("user_records", user_id).await? else {
            return Ok(None);
        };
        serde_json::from_str(&record)
            .map(Some)
            .map_err(|e| PulseError::Internal(format!("corrupt user record {user_id}: {e}")))
    }
}

/// Directory used when no database is configured. Trusts the verified token
/// for handshake existence checks and resolves no records.
pub struct PermissiveDirectory;

#[async_trait]
impl TaskStore for PermissiveDirectory {
    async fn find_task(&self, _task_id: &str) -> Result<Option<Task>, PulseError> {
        Ok(None)
    }
}

#[async_trait]
impl UserStore for PermissiveDirectory {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, PulseError> {
        warn!(user_id, "no record directory configured, user lookup resolves nothing");
        Ok(None)
    }

    async fn user_exists(&self, _user_id: &str) -> Result<bool, PulseError> {
        // The token signature is the only identity evidence available.
        Ok(true)
    }
}
