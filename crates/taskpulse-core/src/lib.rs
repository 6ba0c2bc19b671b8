// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Taskpulse realtime/notification pipeline.
//!
//! Provides the shared error type, the domain record snapshots the pipeline
//! operates on, and the collaborator traits (stores, mail transport, token
//! verification) that the rest of the workspace programs against.

pub mod error;
pub mod traits;
pub mod types;

pub use error::PulseError;
pub use traits::{MailTransport, TaskStore, TokenVerifier, UserStore};
pub use types::{Comment, EmailMessage, FileRecord, Task, TaskStatus, TokenClaims, User};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        // Compile-time check that the collaborator traits are reachable
        // through the crate root.
        fn _assert_task_store<T: TaskStore>() {}
        fn _assert_user_store<T: UserStore>() {}
        fn _assert_mail_transport<T: MailTransport>() {}
        fn _assert_token_verifier<T: TokenVerifier>() {}
    }

    #[test]
    fn email_message_equality() {
        let a = EmailMessage {
            to: "a@example.com".into(),
            subject: "s".into(),
            html_body: "<p>hi</p>".into(),
            text_body: "hi".into(),
        };
        assert_eq!(a, a.clone());
    }
}
