// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP mail transport.
//!
//! Built from [`SmtpConfig`]; missing credentials produce no transport, and
//! callers fall back to [`NullMailer`]. Port 465 selects implicit TLS, any
//! other port negotiates STARTTLS.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info, warn};

use taskpulse_config::SmtpConfig;
use taskpulse_core::{EmailMessage, MailTransport, PulseError};

/// Sends rendered emails over SMTP.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build a mailer from config, or `None` when SMTP is not (fully)
    /// configured or the relay/from address is invalid. Failure to build is
    /// logged and disables mail; it never aborts startup.
    pub fn from_config(app_name: &str, config: &SmtpConfig) -> Option<Self> {
        if !config.is_configured() {
            info!("smtp credentials not provided, mail transport disabled");
            return None;
        }
        let host = config.host.as_deref()?;
        let username = config.username.as_deref()?;
        let password = config.password.as_deref()?;

        let builder = if config.port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        };
        let transport = match builder {
            Ok(builder) => builder
                .port(config.port)
                .credentials(Credentials::new(username.to_string(), password.to_string()))
                .build(),
            Err(e) => {
                warn!(host, error = %e, "smtp relay setup failed, mail transport disabled");
                return None;
            }
        };

        let from_addr = config.from.as_deref().unwrap_or(username);
        let from: Mailbox = match format!("{app_name} <{from_addr}>").parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                warn!(from_addr, error = %e, "invalid from address, mail transport disabled");
                return None;
            }
        };

        info!(host, port = config.port, "smtp mail transport configured");
        Some(Self { transport, from })
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), PulseError> {
        let to: Mailbox = message.to.parse().map_err(|e| PulseError::Mail {
            message: format!("invalid recipient address {:?}", message.to),
            source: Some(Box::new(e)),
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject)
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| PulseError::Mail {
                message: "message build failed".into(),
                source: Some(Box::new(e)),
            })?;

        self.transport.send(email).await.map_err(|e| PulseError::Mail {
            message: "smtp send failed".into(),
            source: Some(Box::new(e)),
        })?;
        debug!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

/// Stand-in transport when SMTP is not configured. Rejects every send so the
/// caller's best-effort conversion reports `false`.
pub struct NullMailer;

#[async_trait]
impl MailTransport for NullMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), PulseError> {
        warn!(to = %message.to, "mail transport not configured, email dropped");
        Err(PulseError::Mail {
            message: "mail transport not configured".into(),
            source: None,
        })
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
