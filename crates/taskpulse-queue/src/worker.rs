// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generic worker loop draining the notification queue.
//!
//! The worker owns nothing about job semantics: it leases jobs, hands them to
//! a [`JobHandler`], and translates the outcome back into queue state. One
//! worker processes one job at a time, so a given job never has two attempts
//! in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::job::NotificationJob;
use crate::JobQueue;

/// What the handler decided about a leased job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Side effect performed; purge the job.
    Done,
    /// Job target no longer qualifies (stale reminder); purge without error.
    Skipped,
    /// Transient failure; hand back to the queue's retry/backoff policy.
    Retry,
}

/// Processes one leased job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn process(&self, job: &NotificationJob) -> JobOutcome;
}

/// Drains the queue until cancelled.
pub struct Worker {
    queue: JobQueue,
    handler: Arc<dyn JobHandler>,
    poll_interval: Duration,
}

impl Worker {
    /// Build a worker, or `None` when the queue is disabled — absence of the
    /// worker is silent, never fatal to the host process.
    pub fn new(
        queue: JobQueue,
        handler: Arc<dyn JobHandler>,
        poll_interval: Duration,
    ) -> Option<Self> {
        if !queue.is_enabled() {
            info!("queue disabled, worker not started");
            return None;
        }
        Some(Self {
            queue,
            handler,
            poll_interval,
        })
    }

    /// Run the drain loop until the token is cancelled.
    ///
    /// Each tick drains every currently eligible job, then sleeps. The
    /// in-flight job is finished before shutdown completes.
    pub async fn run(self, cancel: CancellationToken) {
        info!(poll_interval = ?self.poll_interval, "notification worker started");
        let mut interval = tokio::time::interval(self.poll_interval);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.drain_eligible(&cancel).await;
                }
                _ = cancel.cancelled() => {
                    info!("notification worker shutting down");
                    break;
                }
            }
        }
    }

    /// Process every job that is eligible right now.
    async fn drain_eligible(&self, cancel: &CancellationToken) {
        while let Some(leased) = self.queue.dequeue().await {
            let kind = leased.job.kind();
            match self.handler.process(&leased.job).await {
                JobOutcome::Done => {
                    debug!(job_id = leased.id, kind, "job completed");
                    self.queue.ack(leased.id).await;
                }
                JobOutcome::Skipped => {
                    debug!(job_id = leased.id, kind, "job skipped (stale target)");
                    self.queue.ack(leased.id).await;
                }
                JobOutcome::Retry => {
                    warn!(
                        job_id = leased.id,
                        kind,
                        attempt = leased.attempts + 1,
                        "job attempt failed"
                    );
                    self.queue.fail(leased.id).await;
                }
            }
            if cancel.is_cancelled() {
                break;
            }
        }
    }
}
