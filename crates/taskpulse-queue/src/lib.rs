// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable notification job queue.
//!
//! Jobs are persisted to SQLite so scheduled reminders and retries survive a
//! process restart. The queue as a whole is optional: without a configured
//! database path the handle is disabled, every `enqueue` reports `false`, and
//! callers fall back to sending directly. Queue storage errors after startup
//! are logged and absorbed here for the same reason — notification delivery
//! must never take the mutation path down with it.

pub mod job;
pub mod store;
pub mod worker;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

pub use job::{NotificationJob, ReminderPayload};
pub use store::{LeasedJob, QueueCounts, QueuePolicy, QueueStore};
pub use worker::{JobHandler, JobOutcome, Worker};

/// Cloneable handle to the job queue, or a disabled stand-in.
#[derive(Clone)]
pub struct JobQueue {
    store: Option<Arc<QueueStore>>,
}

impl JobQueue {
    /// Open the queue database, or return a disabled queue.
    ///
    /// `None` path disables queueing by configuration; a failed open also
    /// disables it (logged), preserving the host process.
    pub async fn open(database_path: Option<&str>) -> Self {
        Self::open_with_policy(database_path, QueuePolicy::default()).await
    }

    /// As [`JobQueue::open`], with an explicit retry/backoff policy.
    pub async fn open_with_policy(database_path: Option<&str>, policy: QueuePolicy) -> Self {
        let Some(path) = database_path else {
            info!("no queue database configured, notification queue disabled");
            return Self { store: None };
        };
        match QueueStore::open(path, policy).await {
            Ok(store) => {
                info!(path, "notification queue opened");
                Self {
                    store: Some(Arc::new(store)),
                }
            }
            Err(e) => {
                warn!(path, error = %e, "queue database open failed, notification queue disabled");
                Self { store: None }
            }
        }
    }

    /// A queue that is permanently disabled. Every `enqueue` returns `false`.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Whether a backing store is available.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Enqueue a job, optionally delayed. Returns whether the job was
    /// persisted; on `false` the caller should deliver directly.
    pub async fn enqueue(&self, job: NotificationJob, delay: Option<Duration>) -> bool {
        let run_at = Utc::now().timestamp_millis()
            + delay.map(|d| d.as_millis() as i64).unwrap_or(0);
        self.enqueue_at_ms(job, run_at).await
    }

    /// Enqueue a job to run at an absolute instant.
    ///
    /// A `run_at` in the past is discarded: the reminder window has already
    /// elapsed and a late reminder is worse than none.
    pub async fn enqueue_scheduled(&self, job: NotificationJob, run_at: DateTime<Utc>) -> bool {
        if run_at <= Utc::now() {
            warn!(kind = job.kind(), run_at = %run_at, "scheduled time already elapsed, job discarded");
            return false;
        }
        self.enqueue_at_ms(job, run_at.timestamp_millis()).await
    }

    async fn enqueue_at_ms(&self, job: NotificationJob, run_at_ms: i64) -> bool {
        let Some(store) = &self.store else {
            return false;
        };
        match store.enqueue_at(&job, run_at_ms).await {
            Ok(id) => {
                info!(job_id = id, kind = job.kind(), "job enqueued");
                true
            }
            Err(e) => {
                warn!(kind = job.kind(), error = %e, "enqueue failed");
                false
            }
        }
    }

    /// Lease the next eligible job, if any. Storage errors are logged and
    /// reported as "nothing eligible".
    pub async fn dequeue(&self) -> Option<LeasedJob> {
        let store = self.store.as_ref()?;
        match store.dequeue().await {
            Ok(leased) => leased,
            Err(e) => {
                warn!(error = %e, "dequeue failed");
                None
            }
        }
    }

    /// Acknowledge successful (or skipped) processing.
    pub async fn ack(&self, id: i64) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.ack(id).await {
            warn!(job_id = id, error = %e, "ack failed");
        }
    }

    /// Record a failed attempt; the store applies retry/backoff policy.
    pub async fn fail(&self, id: i64) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.fail(id).await {
            warn!(job_id = id, error = %e, "fail-mark failed");
        }
    }

    /// Current queue depth by status, when the queue is enabled.
    pub async fn counts(&self) -> Option<QueueCounts> {
        let store = self.store.as_ref()?;
        match store.counts().await {
            Ok(counts) => Some(counts),
            Err(e) => {
                warn!(error = %e, "queue counts failed");
                None
            }
        }
    }
}
