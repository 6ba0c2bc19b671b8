// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutation event dispatcher.
//!
//! The request layer calls one dispatcher method after each authoritative
//! write. The dispatcher derives every side effect of the mutation: realtime
//! fanout through the hub, email notifications through the notifier, cache
//! invalidation, and deadline-reminder scheduling. All of it is best-effort;
//! a dead Redis or SMTP relay is logged, never surfaced to the mutation.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use taskpulse_cache::{keys, Cache};
use taskpulse_core::{Comment, FileRecord, Task, TaskStatus, User, UserStore};
use taskpulse_notify::{Branding, Notifier};
use taskpulse_realtime::{ServerEvent, SocketHub};

/// Derives side effects from task/comment/file mutations.
#[derive(Clone)]
pub struct Dispatcher {
    hub: Arc<SocketHub>,
    cache: Cache,
    notifier: Notifier,
    users: Arc<dyn UserStore>,
    branding: Branding,
    reminder_lead: Duration,
}

impl Dispatcher {
    pub fn new(
        hub: Arc<SocketHub>,
        cache: Cache,
        notifier: Notifier,
        users: Arc<dyn UserStore>,
        branding: Branding,
        reminder_lead: Duration,
    ) -> Self {
        Self {
            hub,
            cache,
            notifier,
            users,
            branding,
            reminder_lead,
        }
    }

    /// A task was created. Notifies the assignee (unless self-assigned),
    /// announces the task to everyone, and schedules its deadline reminder.
    pub async fn task_created(&self, task: &Task, actor_id: &str) {
        if let Some(assignee_id) = task.assigned_to.as_deref() {
            if assignee_id != actor_id {
                self.notify_assigned(task, assignee_id, actor_id).await;
            }
        }

        self.hub.broadcast(&ServerEvent::TaskCreated(task.clone()));

        self.cache.delete_pattern(keys::task_lists()).await;
        self.cache.delete_pattern(keys::analytics_all()).await;

        self.schedule_reminder(task).await;
    }

    /// A task was updated. `before` is the pre-write snapshot used to detect
    /// assignment and status transitions.
    pub async fn task_updated(&self, before: &Task, task: &Task, actor_id: &str) {
        let assignee_changed = task.assigned_to != before.assigned_to;
        if assignee_changed {
            if let Some(assignee_id) = task.assigned_to.as_deref() {
                if assignee_id != actor_id {
                    self.notify_assigned(task, assignee_id, actor_id).await;
                }
            }
        }

        if task.status != before.status {
            // Creator and assignee are notified independently; the same
            // change can produce both emails, but never one to the actor.
            if task.created_by != actor_id {
                self.notify_status_changed(task, &task.created_by, actor_id)
                    .await;
            }
            if let Some(assignee_id) = task.assigned_to.as_deref() {
                if assignee_id != actor_id && assignee_id != task.created_by {
                    self.notify_status_changed(task, assignee_id, actor_id).await;
                }
            }
        }

        self.hub
            .emit_to_task(&task.id, &ServerEvent::TaskUpdated(task.clone()));

        self.cache.delete(&keys::task(&task.id)).await;
        self.cache.delete_pattern(keys::task_lists()).await;
        self.cache.delete_pattern(keys::analytics_all()).await;

        self.schedule_reminder(task).await;
    }

    /// A task was (soft-)deleted.
    pub async fn task_deleted(&self, task_id: &str) {
        self.hub.broadcast(&ServerEvent::TaskDeleted {
            task_id: task_id.to_string(),
        });

        self.cache.delete(&keys::task(task_id)).await;
        self.cache.delete_pattern(keys::task_lists()).await;
        self.cache.delete_pattern(keys::analytics_all()).await;
    }

    /// A comment was added. Notifies the task's creator and assignee, minus
    /// the comment's author, each at most once.
    pub async fn comment_created(&self, task: &Task, comment: &Comment, author: &User) {
        let mut recipients: HashSet<&str> = HashSet::new();
        recipients.insert(task.created_by.as_str());
        if let Some(assignee_id) = task.assigned_to.as_deref() {
            recipients.insert(assignee_id);
        }
        recipients.remove(author.id.as_str());

        for recipient_id in recipients {
            let Some(recipient) = self.resolve_user(recipient_id).await else {
                continue;
            };
            let message = self.branding.comment_added(
                &recipient.email,
                &recipient.name,
                &task.title,
                &task.id,
                &author.name,
                &comment.content,
            );
            self.notifier.send_email(message).await;
        }

        self.hub
            .emit_to_task(&task.id, &ServerEvent::CommentAdded(comment.clone()));

        self.cache.delete(&keys::task_comments(&task.id)).await;
    }

    /// A comment was removed. Realtime + cache only, no notification.
    pub async fn comment_deleted(&self, task_id: &str, comment_id: &str) {
        self.hub.emit_to_task(
            task_id,
            &ServerEvent::CommentDeleted {
                comment_id: comment_id.to_string(),
            },
        );
        self.cache.delete(&keys::task_comments(task_id)).await;
    }

    /// Files were attached to a task. One frame per file, so clients can
    /// render attachments incrementally.
    pub fn files_uploaded(&self, task_id: &str, files: &[FileRecord]) {
        for file in files {
            self.hub
                .emit_to_task(task_id, &ServerEvent::FileUploaded(file.clone()));
        }
    }

    /// A file attachment was removed.
    pub fn file_deleted(&self, task_id: &str, file_id: &str) {
        self.hub.emit_to_task(
            task_id,
            &ServerEvent::FileDeleted {
                file_id: file_id.to_string(),
            },
        );
    }

    async fn notify_assigned(&self, task: &Task, assignee_id: &str, actor_id: &str) {
        let Some(assignee) = self.resolve_user(assignee_id).await else {
            return;
        };
        let actor_name = self.actor_name(actor_id).await;
        let message = self.branding.task_assigned(
            &assignee.email,
            &assignee.name,
            &task.title,
            &task.id,
            &actor_name,
        );
        self.notifier.send_email(message).await;
    }

    async fn notify_status_changed(&self, task: &Task, recipient_id: &str, actor_id: &str) {
        let Some(recipient) = self.resolve_user(recipient_id).await else {
            return;
        };
        let actor_name = self.actor_name(actor_id).await;
        let message = self.branding.status_changed(
            &recipient.email,
            &recipient.name,
            &task.title,
            &task.id,
            task.status,
            &actor_name,
        );
        self.notifier.send_email(message).await;
    }

    /// Schedule (or re-schedule on update) the deadline reminder for a task
    /// with a future due date. Completed tasks get none; stale reminders are
    /// neutralized at processing time by the worker's re-validation, so an
    /// update simply schedules a fresh one.
    async fn schedule_reminder(&self, task: &Task) {
        if task.status == TaskStatus::Completed {
            return;
        }
        let Some(due_date) = task.due_date else {
            return;
        };
        if due_date <= Utc::now() {
            return;
        }
        let recipient_id = task.assigned_to.as_deref().unwrap_or(&task.created_by);
        let Some(recipient) = self.resolve_user(recipient_id).await else {
            return;
        };
        if self
            .notifier
            .schedule_reminder(task, &recipient, self.reminder_lead)
            .await
        {
            debug!(task_id = %task.id, user_id = %recipient.id, "deadline reminder scheduled");
        }
    }

    async fn resolve_user(&self, user_id: &str) -> Option<User> {
        match self.users.find_user(user_id).await {
            Ok(Some(user)) => Some(user),
            Ok(None) => {
                debug!(user_id, "user not found, notification skipped");
                None
            }
            Err(e) => {
                warn!(user_id, error = %e, "user lookup failed, notification skipped");
                None
            }
        }
    }

    async fn actor_name(&self, actor_id: &str) -> String {
        match self.resolve_user(actor_id).await {
            Some(user) => user.name,
            None => "A teammate".to_string(),
        }
    }
}
