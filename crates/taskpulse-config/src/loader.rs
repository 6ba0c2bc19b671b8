// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./taskpulse.toml` > `~/.config/taskpulse/taskpulse.toml`
//! > `/etc/taskpulse/taskpulse.toml` with environment variable overrides via
//! `TASKPULSE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TaskpulseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/taskpulse/taskpulse.toml` (system-wide)
/// 3. `~/.config/taskpulse/taskpulse.toml` (user XDG config)
/// 4. `./taskpulse.toml` (local directory)
/// 5. `TASKPULSE_*` environment variables
pub fn load_config() -> Result<TaskpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskpulseConfig::default()))
        .merge(Toml::file("/etc/taskpulse/taskpulse.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("taskpulse/taskpulse.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("taskpulse.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<TaskpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskpulseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TaskpulseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TaskpulseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TASKPULSE_QUEUE_DATABASE_PATH` must map
/// to `queue.database_path`, not `queue.database.path`.
fn env_provider() -> Env {
    Env::prefixed("TASKPULSE_").map(|key| {
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("app_", "app.", 1)
            .replacen("server_", "server.", 1)
            .replacen("auth_", "auth.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("cache_", "cache.", 1)
            .replacen("smtp_", "smtp.", 1);
        mapped.into()
    })
}
