// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Taskpulse core.

use thiserror::Error;

/// The primary error type used across Taskpulse components.
///
/// Optional subsystems (cache, queue, mail) convert their failures to
/// `bool`/`Option` results at the component boundary; this type covers the
/// remaining paths where an error is genuinely surfaced to a caller.
#[derive(Debug, Error)]
pub enum PulseError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Queue backing store errors (database open, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache backend errors (connection, command failure).
    #[error("cache error: {source}")]
    Cache {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Mail transport errors (SMTP connection, send failure).
    #[error("mail error: {message}")]
    Mail {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Realtime transport errors (bind failure, serve error).
    #[error("realtime error: {message}")]
    Realtime {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Access token rejected (malformed, bad signature, expired, unknown user).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
