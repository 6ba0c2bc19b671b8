// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Taskpulse server.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, environment variable
//! overrides, and miette diagnostic rendering.
//!
//! # Usage
//!
//! ```no_run
//! use taskpulse_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("binding on port {}", config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AppConfig, AuthConfig, CacheConfig, QueueConfig, ServerConfig, SmtpConfig, TaskpulseConfig,
};

/// Load configuration from the XDG hierarchy and validate it.
///
/// This is the high-level entry point that:
/// 1. Loads config from TOML files + env vars via Figment
/// 2. On success: runs post-deserialization validation
/// 3. On Figment error: converts to miette diagnostics
pub fn load_and_validate() -> Result<TaskpulseConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<TaskpulseConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_accepts_complete_config() {
        let config = load_and_validate_str(
            r#"
            [app]
            name = "Taskpulse Dev"

            [auth]
            access_secret = "dev-secret"

            [smtp]
            host = "smtp.example.com"
            username = "mailer"
            password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(config.app.name, "Taskpulse Dev");
        assert!(config.smtp.is_configured());
    }

    #[test]
    fn load_and_validate_str_reports_validation_errors() {
        let errors = load_and_validate_str(
            r#"
            [app]
            log_level = "loud"
            "#,
        )
        .unwrap_err();
        assert!(errors[0].message.contains("unknown log level"));
    }
}
