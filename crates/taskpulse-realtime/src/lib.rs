// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime layer for Taskpulse.
//!
//! [`SocketHub`] tracks authenticated sessions and task rooms, [`ws`] is the
//! axum WebSocket endpoint feeding it, [`ServerEvent`] defines the wire
//! envelope, and [`HmacTokenVerifier`] checks the access tokens presented at
//! handshake time.

pub mod event;
pub mod hub;
pub mod server;
pub mod token;
pub mod ws;

pub use event::ServerEvent;
pub use hub::SocketHub;
pub use server::{router, serve_app, start_server};
pub use token::HmacTokenVerifier;
pub use ws::RealtimeState;
