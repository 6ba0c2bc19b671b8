// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Email notifications for Taskpulse.
//!
//! [`templates`] renders the four notification emails, [`mailer`] carries
//! them over SMTP, [`Notifier`] decides between queueing and sending
//! directly, and [`NotificationHandler`] is the worker-side consumer that
//! re-validates reminders before delivery.

pub mod handlers;
pub mod mailer;
pub mod notifier;
pub mod templates;

pub use handlers::NotificationHandler;
pub use mailer::{NullMailer, SmtpMailer};
pub use notifier::Notifier;
pub use templates::Branding;
