// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Diagnostic rendering for configuration errors.
//!
//! Wraps figment/validation failures in miette diagnostics so startup errors
//! print with the offending key and a short remediation hint.

use miette::Diagnostic;
use thiserror::Error;

/// A single configuration problem, suitable for miette rendering.
#[derive(Debug, Error, Diagnostic)]
#[error("{message}")]
#[diagnostic(code(taskpulse::config))]
pub struct ConfigError {
    pub message: String,

    #[help]
    pub help: Option<String>,
}

impl ConfigError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: None,
        }
    }

    pub fn with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

/// Convert a figment extraction error into per-problem diagnostics.
pub fn figment_to_config_errors(err: figment::Error) -> Vec<ConfigError> {
    err.into_iter()
        .map(|e| {
            let path = e.path.join(".");
            let message = if path.is_empty() {
                format!("invalid configuration: {}", e.kind)
            } else {
                format!("invalid configuration at `{path}`: {}", e.kind)
            };
            ConfigError::with_help(
                message,
                "check taskpulse.toml and TASKPULSE_* environment overrides",
            )
        })
        .collect()
}

/// Print all collected config errors to stderr via miette's fancy handler.
pub fn render_errors(errors: &[ConfigError]) {
    for err in errors {
        let report = miette::Report::new(ConfigError {
            message: err.message.clone(),
            help: err.help.clone(),
        });
        eprintln!("{report:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::new("bad port");
        assert_eq!(err.to_string(), "bad port");
        assert!(err.help.is_none());
    }

    #[test]
    fn figment_errors_become_diagnostics() {
        let err = crate::loader::load_config_from_str("server = 5").unwrap_err();
        let errors = figment_to_config_errors(err);
        assert!(!errors.is_empty());
        assert!(errors[0].message.contains("invalid configuration"));
    }
}
