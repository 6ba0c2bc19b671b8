// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only views of the external document store.

use async_trait::async_trait;

use crate::error::PulseError;
use crate::types::{Task, User};

/// Lookup of task records, used by the reminder worker to re-validate a
/// scheduled reminder before sending.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Fetch a task by id. Soft-deleted tasks are still returned (with
    /// `is_deleted` set) so callers can distinguish deleted from unknown.
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>, PulseError>;
}

/// Lookup of user records, used for recipient resolution and for confirming
/// that a token's subject still exists at socket-connect time.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, PulseError>;

    /// Existence check; default implementation goes through `find_user`.
    async fn user_exists(&self, user_id: &str) -> Result<bool, PulseError> {
        Ok(self.find_user(user_id).await?.is_some())
    }
}
