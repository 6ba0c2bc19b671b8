// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits for systems this core consumes but does not implement.
//!
//! Persistence, mail delivery, and token verification are external concerns;
//! the dispatcher, workers, and socket hub only see these interfaces so tests
//! can substitute doubles.

pub mod mail;
pub mod store;
pub mod token;

pub use mail::MailTransport;
pub use store::{TaskStore, UserStore};
pub use token::TokenVerifier;
