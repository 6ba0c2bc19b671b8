// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification job payloads.
//!
//! One tagged enum covers every job kind the queue carries; the worker
//! dispatches on the kind. Payloads are serialized to JSON in the `jobs`
//! table and must stay backward-deserializable across restarts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use taskpulse_core::EmailMessage;

/// A unit of deferred notification work.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationJob {
    /// A fully rendered email ready for the transport.
    Email(EmailMessage),
    /// A deadline reminder; re-validated against live task/user state at
    /// processing time, so it carries ids rather than a rendered body.
    TaskReminder(ReminderPayload),
}

/// Payload for a scheduled deadline reminder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReminderPayload {
    pub task_id: String,
    pub user_id: String,
    pub task_title: String,
    pub due_date: DateTime<Utc>,
}

impl NotificationJob {
    /// Short kind tag stored alongside the payload for operator queries.
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationJob::Email(_) => "email",
            NotificationJob::TaskReminder(_) => "task_reminder",
        }
    }
}
