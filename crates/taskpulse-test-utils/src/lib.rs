// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory mock collaborators for Taskpulse test suites.
//!
//! Everything here lives behind the core traits, so tests exercise the real
//! dispatch/queue/notify code with controllable stores and a capturing mail
//! transport instead of MongoDB and SMTP.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use taskpulse_core::{
    EmailMessage, MailTransport, PulseError, Task, TaskStatus, TaskStore, TokenClaims,
    TokenVerifier, User, UserStore,
};

/// A minimal valid task owned and assigned to nobody, due never.
pub fn sample_task(id: &str, created_by: &str) -> Task {
    Task {
        id: id.to_string(),
        title: format!("Task {id}"),
        description: None,
        status: TaskStatus::Todo,
        priority: None,
        due_date: None,
        tags: Vec::new(),
        created_by: created_by.to_string(),
        assigned_to: None,
        is_deleted: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn sample_user(id: &str) -> User {
    User {
        id: id.to_string(),
        name: format!("User {id}"),
        email: format!("{id}@example.com"),
    }
}

/// In-memory task lookup.
#[derive(Default)]
pub struct MockTaskStore {
    tasks: Mutex<HashMap<String, Task>>,
}

impl MockTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id.clone(), task);
    }

    pub fn remove(&self, task_id: &str) {
        self.tasks.lock().unwrap().remove(task_id);
    }

    /// Apply a mutation to a stored task in place.
    pub fn update<F: FnOnce(&mut Task)>(&self, task_id: &str, f: F) {
        if let Some(task) = self.tasks.lock().unwrap().get_mut(task_id) {
            f(task);
        }
    }
}

#[async_trait]
impl TaskStore for MockTaskStore {
    async fn find_task(&self, task_id: &str) -> Result<Option<Task>, PulseError> {
        Ok(self.tasks.lock().unwrap().get(task_id).cloned())
    }
}

/// In-memory user lookup.
#[derive(Default)]
pub struct MockUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl MockUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn remove(&self, user_id: &str) {
        self.users.lock().unwrap().remove(user_id);
    }

    /// Store with `n` numbered users (`u1`..`un`).
    pub fn with_users(n: usize) -> Self {
        let store = Self::new();
        for i in 1..=n {
            store.insert(sample_user(&format!("u{i}")));
        }
        store
    }
}

#[async_trait]
impl UserStore for MockUserStore {
    async fn find_user(&self, user_id: &str) -> Result<Option<User>, PulseError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }
}

/// Capturing mail transport. Records every sent message; can be switched to
/// fail to exercise retry paths.
pub struct MockMailTransport {
    sent: Mutex<Vec<EmailMessage>>,
    failing: AtomicBool,
    enabled: bool,
}

impl Default for MockMailTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
            enabled: true,
        }
    }

    /// A transport that reports itself unconfigured and rejects every send.
    pub fn disabled() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(true),
            enabled: false,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<(), PulseError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PulseError::Mail {
                message: "mock transport failure".into(),
                source: None,
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Token verifier backed by a fixed token -> claims table.
#[derive(Default)]
pub struct StaticTokenVerifier {
    tokens: Mutex<HashMap<String, TokenClaims>>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token that resolves to the given user, valid for an hour.
    pub fn accept(&self, token: &str, user: &User) {
        self.tokens.lock().unwrap().insert(
            token.to_string(),
            TokenClaims {
                user_id: user.id.clone(),
                email: user.email.clone(),
                exp: Utc::now().timestamp() + 3600,
            },
        );
    }
}

impl TokenVerifier for StaticTokenVerifier {
    fn verify(&self, token: &str) -> Result<TokenClaims, PulseError> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| PulseError::Auth("unknown token".into()))
    }
}
