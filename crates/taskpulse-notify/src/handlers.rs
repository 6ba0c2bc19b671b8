// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Worker-side processing of queued notification jobs.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use taskpulse_core::{MailTransport, TaskStatus, TaskStore, UserStore};
use taskpulse_queue::{JobHandler, JobOutcome, NotificationJob, ReminderPayload};

use crate::templates::Branding;

/// Processes every queued job kind.
///
/// Email jobs carry a fully rendered body and just need the transport.
/// Reminder jobs carry ids and are re-validated against live state before
/// rendering: the task may have been deleted or completed, and the user may
/// have been removed, in the window between scheduling and delivery.
pub struct NotificationHandler {
    transport: Arc<dyn MailTransport>,
    tasks: Arc<dyn TaskStore>,
    users: Arc<dyn UserStore>,
    branding: Branding,
}

impl NotificationHandler {
    pub fn new(
        transport: Arc<dyn MailTransport>,
        tasks: Arc<dyn TaskStore>,
        users: Arc<dyn UserStore>,
        branding: Branding,
    ) -> Self {
        Self {
            transport,
            tasks,
            users,
            branding,
        }
    }

    async fn process_reminder(&self, payload: &ReminderPayload) -> JobOutcome {
        let task = match self.tasks.find_task(&payload.task_id).await {
            Ok(task) => task,
            Err(e) => {
                warn!(task_id = %payload.task_id, error = %e, "reminder task lookup failed");
                return JobOutcome::Retry;
            }
        };
        match task {
            None => {
                debug!(task_id = %payload.task_id, "task gone, reminder skipped");
                return JobOutcome::Skipped;
            }
            Some(task) if task.is_deleted || task.status == TaskStatus::Completed => {
                debug!(task_id = %payload.task_id, "task deleted or completed, reminder skipped");
                return JobOutcome::Skipped;
            }
            Some(_) => {}
        }

        let user = match self.users.find_user(&payload.user_id).await {
            Ok(user) => user,
            Err(e) => {
                warn!(user_id = %payload.user_id, error = %e, "reminder user lookup failed");
                return JobOutcome::Retry;
            }
        };
        let Some(user) = user else {
            debug!(user_id = %payload.user_id, "user gone, reminder skipped");
            return JobOutcome::Skipped;
        };

        let message = self.branding.deadline_reminder(
            &user.email,
            &user.name,
            &payload.task_title,
            &payload.task_id,
            payload.due_date,
        );
        match self.transport.send(&message).await {
            Ok(()) => JobOutcome::Done,
            Err(e) => {
                warn!(task_id = %payload.task_id, error = %e, "reminder send failed");
                JobOutcome::Retry
            }
        }
    }
}

#[async_trait]
impl JobHandler for NotificationHandler {
    async fn process(&self, job: &NotificationJob) -> JobOutcome {
        match job {
            NotificationJob::Email(message) => match self.transport.send(message).await {
                Ok(()) => JobOutcome::Done,
                Err(e) => {
                    warn!(to = %message.to, error = %e, "queued email send failed");
                    JobOutcome::Retry
                }
            },
            NotificationJob::TaskReminder(payload) => self.process_reminder(payload).await,
        }
    }
}
