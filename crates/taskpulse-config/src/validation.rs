// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of the configuration.
//!
//! Figment handles types and unknown keys; this module checks cross-field
//! constraints that serde cannot express.

use crate::diagnostic::ConfigError;
use crate::model::TaskpulseConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration.
///
/// Returns all problems found, not just the first.
pub fn validate_config(config: &TaskpulseConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !LOG_LEVELS.contains(&config.app.log_level.as_str()) {
        errors.push(ConfigError::with_help(
            format!("unknown log level `{}`", config.app.log_level),
            "expected one of: trace, debug, info, warn, error",
        ));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::with_help(
            "server.port must be non-zero",
            "pick a port the realtime server can bind, e.g. 4000",
        ));
    }

    if config.app.frontend_url.is_empty() {
        errors.push(ConfigError::with_help(
            "app.frontend_url must not be empty",
            "email templates link back to the frontend",
        ));
    }

    // Partial SMTP config is almost certainly a mistake: the mail subsystem
    // silently disables itself unless host, username, and password are all set.
    let smtp_fields_set = [
        config.smtp.host.is_some(),
        config.smtp.username.is_some(),
        config.smtp.password.is_some(),
    ]
    .iter()
    .filter(|b| **b)
    .count();
    if smtp_fields_set > 0 && smtp_fields_set < 3 {
        errors.push(ConfigError::with_help(
            "incomplete [smtp] configuration",
            "set smtp.host, smtp.username, and smtp.password together (or none to disable mail)",
        ));
    }

    if config.queue.poll_interval_secs == 0 {
        errors.push(ConfigError::with_help(
            "queue.poll_interval_secs must be at least 1",
            "the worker polls the queue on this interval",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
