// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery policy: queue first, direct send as fallback.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, warn};

use taskpulse_core::{EmailMessage, MailTransport, Task, User};
use taskpulse_queue::{JobQueue, NotificationJob, ReminderPayload};

/// Front door for everything that wants to notify a user.
///
/// Emails go through the durable queue when one is configured; when the queue
/// is disabled or the enqueue fails, the notifier falls back to sending
/// directly so a missing Redis/SQLite never silently swallows notifications.
/// All methods are best-effort and report delivery as `bool`.
#[derive(Clone)]
pub struct Notifier {
    queue: JobQueue,
    transport: Arc<dyn MailTransport>,
}

impl Notifier {
    pub fn new(queue: JobQueue, transport: Arc<dyn MailTransport>) -> Self {
        Self { queue, transport }
    }

    /// Deliver a rendered email, queued when possible.
    pub async fn send_email(&self, message: EmailMessage) -> bool {
        if self
            .queue
            .enqueue(NotificationJob::Email(message.clone()), None)
            .await
        {
            return true;
        }

        if !self.transport.is_enabled() {
            warn!(to = %message.to, "no queue and no mail transport, notification dropped");
            return false;
        }
        debug!(to = %message.to, "queue unavailable, sending directly");
        match self.transport.send(&message).await {
            Ok(()) => true,
            Err(e) => {
                warn!(to = %message.to, error = %e, "direct send failed");
                false
            }
        }
    }

    /// Schedule a deadline reminder `lead` before the task's due date.
    ///
    /// Requires the durable queue; there is no direct-send fallback because
    /// the send lies in the future. Tasks without a due date, and reminder
    /// times already in the past, schedule nothing.
    pub async fn schedule_reminder(&self, task: &Task, user: &User, lead: Duration) -> bool {
        let Some(due_date) = task.due_date else {
            return false;
        };
        let run_at = due_date - lead;
        self.queue
            .enqueue_scheduled(
                NotificationJob::TaskReminder(ReminderPayload {
                    task_id: task.id.clone(),
                    user_id: user.id.clone(),
                    task_title: task.title.clone(),
                    due_date,
                }),
                run_at,
            )
            .await
    }
}
