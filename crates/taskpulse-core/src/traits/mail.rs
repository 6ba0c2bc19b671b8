// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound mail transport interface.

use async_trait::async_trait;

use crate::error::PulseError;
use crate::types::EmailMessage;

/// Sends a fully rendered email through an external transport (SMTP in
/// production). A returned error triggers the queue's retry policy; callers
/// on the synchronous path convert it to a best-effort `false`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), PulseError>;

    /// Whether the transport is configured and able to send at all.
    fn is_enabled(&self) -> bool {
        true
    }
}
