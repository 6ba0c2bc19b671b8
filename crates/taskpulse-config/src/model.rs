// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Taskpulse server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup. Every optional-infrastructure section (queue,
//! cache, smtp) disables its subsystem when left unset, never errors.

use serde::{Deserialize, Serialize};

/// Top-level Taskpulse configuration.
///
/// Loaded from TOML files with `TASKPULSE_*` environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TaskpulseConfig {
    /// Application identity and presentation settings.
    #[serde(default)]
    pub app: AppConfig,

    /// Realtime server bind settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Access-token verification settings.
    #[serde(default)]
    pub auth: AuthConfig,

    /// Notification job queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Read-path cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound SMTP settings.
    #[serde(default)]
    pub smtp: SmtpConfig,
}

/// Application identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Display name used in email footers and the From header.
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Base URL of the web frontend, used to build task links in emails.
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hours before a task's due date to deliver the deadline reminder.
    #[serde(default = "default_reminder_lead_hours")]
    pub reminder_lead_hours: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            frontend_url: default_frontend_url(),
            log_level: default_log_level(),
            reminder_lead_hours: default_reminder_lead_hours(),
        }
    }
}

fn default_app_name() -> String {
    "Taskpulse".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_reminder_lead_hours() -> u64 {
    24
}

/// Realtime server bind configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

/// Access-token verification configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret for access-token MAC verification. Required for `serve`.
    #[serde(default)]
    pub access_secret: Option<String>,

    /// Bearer token the web application presents on the internal ingest
    /// routes. Falls back to `access_secret` when unset.
    #[serde(default)]
    pub service_token: Option<String>,
}

/// Notification job queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Path to the SQLite file backing the queue. `None` disables the queue
    /// (enqueues become no-ops, no worker is started).
    #[serde(default)]
    pub database_path: Option<String>,

    /// Worker poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_poll_interval() -> u64 {
    1
}

/// Read-path cache configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Redis connection URL (e.g. `redis://localhost:6379`). `None` disables
    /// caching entirely.
    #[serde(default)]
    pub redis_url: Option<String>,
}

/// Outbound SMTP configuration. Leaving `host`, `username`, or `password`
/// unset disables the mail subsystem.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// From address; falls back to `username` when unset.
    #[serde(default)]
    pub from: Option<String>,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            username: None,
            password: None,
            from: None,
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpConfig {
    /// Whether enough is configured to build a transport.
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.username.is_some() && self.password.is_some()
    }
}
