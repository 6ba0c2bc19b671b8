// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for the notification job queue.
//!
//! All writes are serialized through tokio-rusqlite's single background
//! thread. Lifecycle of a row: pending -> processing -> deleted on ack, or
//! pending again with a pushed-back `run_at` on retry, or terminal `failed`
//! once attempts reach `max_attempts`. Failed rows are retained for operator
//! inspection.

use chrono::Utc;
use rusqlite::params;
use tokio_rusqlite::Connection;
use tracing::debug;

use taskpulse_core::PulseError;

use crate::job::NotificationJob;

/// Retry/backoff policy shared by every job kind.
#[derive(Debug, Clone, Copy)]
pub struct QueuePolicy {
    /// Total attempts before a job is left in a terminal failed state.
    pub max_attempts: u32,
    /// First retry delay; doubles on each subsequent attempt.
    pub backoff_base_ms: i64,
    /// Processing lease; a crashed worker's job becomes re-eligible after this.
    pub lock_ms: i64,
}

impl Default for QueuePolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 2_000,
            lock_ms: 5 * 60 * 1_000,
        }
    }
}

impl QueuePolicy {
    /// Exponential backoff delay before attempt `next_attempt` (1-based:
    /// the delay after the first failure is the base delay).
    pub fn backoff_ms(&self, failed_attempts: u32) -> i64 {
        self.backoff_base_ms << failed_attempts.saturating_sub(1).min(16)
    }
}

/// A job leased to a worker for exactly one processing attempt.
#[derive(Debug, Clone)]
pub struct LeasedJob {
    pub id: i64,
    pub job: NotificationJob,
    /// Attempts completed before this lease.
    pub attempts: u32,
}

/// Point-in-time queue depth observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueCounts {
    pub pending: i64,
    pub processing: i64,
    pub failed: i64,
}

/// Owns the SQLite connection backing the queue.
pub struct QueueStore {
    conn: Connection,
    policy: QueuePolicy,
}

fn map_tr_err(e: tokio_rusqlite::Error) -> PulseError {
    PulseError::Storage {
        source: Box::new(e),
    }
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS jobs (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    kind         TEXT NOT NULL,
    payload      TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'pending',
    attempts     INTEGER NOT NULL DEFAULT 0,
    max_attempts INTEGER NOT NULL DEFAULT 3,
    run_at       INTEGER NOT NULL,
    locked_until INTEGER,
    created_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    updated_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_jobs_pending ON jobs (status, run_at);
";

impl QueueStore {
    /// Open (or create) the queue database and apply the schema.
    pub async fn open(path: &str, policy: QueuePolicy) -> Result<Self, PulseError> {
        let conn = Connection::open(path).await.map_err(|e| map_tr_err(e.into()))?;
        conn.call(move |conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )?;
            conn.execute_batch(SCHEMA)?;
            // Crash recovery: a previous process may have died mid-lease.
            conn.execute(
                "UPDATE jobs SET status = 'pending', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE status = 'processing'",
                [],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;
        Ok(Self { conn, policy })
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    /// Insert a job eligible for processing at `run_at` (unix millis).
    pub async fn enqueue_at(&self, job: &NotificationJob, run_at_ms: i64) -> Result<i64, PulseError> {
        let kind = job.kind().to_string();
        let payload = serde_json::to_string(job)
            .map_err(|e| PulseError::Internal(format!("job serialization failed: {e}")))?;
        let max_attempts = self.policy.max_attempts;
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO jobs (kind, payload, run_at, max_attempts)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![kind, payload, run_at_ms, max_attempts],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Lease the next eligible job.
    ///
    /// Atomically selects the oldest pending row with `run_at <= now` (or a
    /// processing row whose lease expired) and marks it processing, so at
    /// most one attempt is in flight per job. Returns `None` when nothing is
    /// eligible.
    pub async fn dequeue(&self) -> Result<Option<LeasedJob>, PulseError> {
        let now_ms = Utc::now().timestamp_millis();
        let lock_ms = self.policy.lock_ms;
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;

                let result = {
                    let mut stmt = tx.prepare(
                        "SELECT id, payload, attempts FROM jobs
                         WHERE run_at <= ?1
                           AND (status = 'pending'
                                OR (status = 'processing' AND locked_until <= ?1))
                         ORDER BY run_at ASC, id ASC
                         LIMIT 1",
                    )?;
                    stmt.query_row(params![now_ms], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, u32>(2)?,
                        ))
                    })
                };

                match result {
                    Ok((id, payload, attempts)) => {
                        tx.execute(
                            "UPDATE jobs SET status = 'processing', locked_until = ?1,
                             updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                             WHERE id = ?2",
                            params![now_ms + lock_ms, id],
                        )?;
                        tx.commit()?;

                        let job: NotificationJob = match serde_json::from_str(&payload) {
                            Ok(job) => job,
                            Err(e) => {
                                // Undecodable payloads would wedge the queue;
                                // report as a storage error instead.
                                return Err(rusqlite::Error::ToSqlConversionFailure(Box::new(e)));
                            }
                        };
                        Ok(Some(LeasedJob { id, job, attempts }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        tx.commit()?;
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .map_err(map_tr_err)
    }

    /// Acknowledge successful processing: completed jobs are purged.
    pub async fn ack(&self, id: i64) -> Result<(), PulseError> {
        self.conn
            .call(move |conn| {
                conn.execute("DELETE FROM jobs WHERE id = ?1", params![id])?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Record a failed attempt.
    ///
    /// Increments `attempts`; once they reach `max_attempts` the row becomes
    /// terminal `failed` and is retained. Otherwise the row returns to
    /// pending with `run_at` pushed forward by the exponential backoff.
    pub async fn fail(&self, id: i64) -> Result<(), PulseError> {
        let policy = self.policy;
        let now_ms = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| {
                let (attempts, max_attempts): (u32, u32) = conn.query_row(
                    "SELECT attempts, max_attempts FROM jobs WHERE id = ?1",
                    params![id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;

                let new_attempts = attempts + 1;
                if new_attempts >= max_attempts {
                    conn.execute(
                        "UPDATE jobs SET status = 'failed', attempts = ?1,
                         locked_until = NULL,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?2",
                        params![new_attempts, id],
                    )?;
                } else {
                    let next_run = now_ms + policy.backoff_ms(new_attempts);
                    conn.execute(
                        "UPDATE jobs SET status = 'pending', attempts = ?1,
                         run_at = ?2, locked_until = NULL,
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?3",
                        params![new_attempts, next_run, id],
                    )?;
                }
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        debug!(job_id = id, "job attempt failed, retry scheduled or exhausted");
        Ok(())
    }

    /// Current queue depth by status.
    pub async fn counts(&self) -> Result<QueueCounts, PulseError> {
        self.conn
            .call(|conn| {
                let count = |status: &str| -> Result<i64, rusqlite::Error> {
                    conn.query_row(
                        "SELECT COUNT(*) FROM jobs WHERE status = ?1",
                        params![status],
                        |row| row.get(0),
                    )
                };
                Ok(QueueCounts {
                    pending: count("pending")?,
                    processing: count("processing")?,
                    failed: count("failed")?,
                })
            })
            .await
            .map_err(map_tr_err)
    }

    /// Close the backing connection.
    pub async fn close(self) -> Result<(), PulseError> {
        self.conn
            .close()
            .await
            .map_err(|e| PulseError::Storage {
                source: Box::new(e),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskpulse_core::EmailMessage;
    use tempfile::tempdir;

    fn email_job(to: &str) -> NotificationJob {
        NotificationJob::Email(EmailMessage {
            to: to.into(),
            subject: "s".into(),
            html_body: "<p>b</p>".into(),
            text_body: "b".into(),
        })
    }

    async fn setup() -> (QueueStore, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let store = QueueStore::open(path.to_str().unwrap(), QueuePolicy::default())
            .await
            .unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn enqueue_and_dequeue_lifecycle() {
        let (store, _dir) = setup().await;
        let now = Utc::now().timestamp_millis();

        let id = store.enqueue_at(&email_job("a@example.com"), now).await.unwrap();
        assert!(id > 0);

        let leased = store.dequeue().await.unwrap().unwrap();
        assert_eq!(leased.id, id);
        assert_eq!(leased.attempts, 0);
        assert_eq!(leased.job, email_job("a@example.com"));

        // Leased job must not be handed out twice.
        assert!(store.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delayed_job_not_eligible_before_run_at() {
        let (store, _dir) = setup().await;
        let future = Utc::now().timestamp_millis() + 60_000;

        store.enqueue_at(&email_job("a@example.com"), future).await.unwrap();
        assert!(store.dequeue().await.unwrap().is_none());

        let counts = store.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
    }

    #[tokio::test]
    async fn ack_purges_completed_job() {
        let (store, _dir) = setup().await;
        let now = Utc::now().timestamp_millis();

        let id = store.enqueue_at(&email_job("a@example.com"), now).await.unwrap();
        store.dequeue().await.unwrap().unwrap();
        store.ack(id).await.unwrap();

        let counts = store.counts().await.unwrap();
        assert_eq!(
            counts,
            QueueCounts {
                pending: 0,
                processing: 0,
                failed: 0
            }
        );
    }

    #[tokio::test]
    async fn fail_pushes_run_at_forward_for_retry() {
        let (store, _dir) = setup().await;
        let now = Utc::now().timestamp_millis();

        let id = store.enqueue_at(&email_job("a@example.com"), now).await.unwrap();
        let leased = store.dequeue().await.unwrap().unwrap();
        assert_eq!(leased.id, id);
        assert!(
            store.dequeue().await.unwrap().is_none(),
            "leased job must not be re-dequeued"
        );

        store.fail(id).await.unwrap();

        // Back to pending, but the 2s backoff makes it ineligible right now.
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.pending, 1);
        assert!(store.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn job_attempted_exactly_max_attempts_then_terminal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        // Tiny backoff so retries are immediately eligible.
        let policy = QueuePolicy {
            max_attempts: 3,
            backoff_base_ms: 0,
            lock_ms: 60_000,
        };
        let store = QueueStore::open(path.to_str().unwrap(), policy).await.unwrap();
        let now = Utc::now().timestamp_millis();
        let id = store.enqueue_at(&email_job("a@example.com"), now).await.unwrap();

        let mut attempts = 0;
        while let Some(leased) = store.dequeue().await.unwrap() {
            attempts += 1;
            assert_eq!(leased.id, id);
            store.fail(leased.id).await.unwrap();
        }

        assert_eq!(attempts, 3, "an always-failing job is attempted exactly 3 times");

        // Terminal failed state: retained, never handed out again.
        let counts = store.counts().await.unwrap();
        assert_eq!(counts.failed, 1);
        assert!(store.dequeue().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn crash_recovery_requeues_processing_rows() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jobs.db");
        let path_str = path.to_str().unwrap().to_string();

        let store = QueueStore::open(&path_str, QueuePolicy::default()).await.unwrap();
        let now = Utc::now().timestamp_millis();
        store.enqueue_at(&email_job("a@example.com"), now).await.unwrap();
        store.dequeue().await.unwrap().unwrap();
        store.close().await.unwrap();

        // Simulated restart: the leased job must become eligible again.
        let store = QueueStore::open(&path_str, QueuePolicy::default()).await.unwrap();
        let leased = store.dequeue().await.unwrap();
        assert!(leased.is_some());
    }

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = QueuePolicy::default();
        assert_eq!(policy.backoff_ms(1), 2_000);
        assert_eq!(policy.backoff_ms(2), 4_000);
        assert_eq!(policy.backoff_ms(3), 8_000);
    }
}
