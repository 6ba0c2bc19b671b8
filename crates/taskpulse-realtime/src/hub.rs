// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection registry and fanout.
//!
//! Three maps track who is connected where:
//! - `sessions`: socket id -> authenticated user + outbound channel
//! - `user_sockets`: user id -> live socket ids (a user may have several tabs)
//! - `task_rooms`: task id -> socket ids watching that task
//!
//! A user id is present in `user_sockets` iff it has at least one live
//! socket, so `is_online` is a plain key lookup. Delivery uses `try_send`:
//! a slow or closed client loses frames rather than stalling fanout.

use std::collections::HashSet;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::event::ServerEvent;

/// Outbound channel depth per socket.
const SESSION_BUFFER: usize = 64;

struct Session {
    user_id: String,
    tx: mpsc::Sender<String>,
}

/// Shared registry of live WebSocket sessions.
#[derive(Default)]
pub struct SocketHub {
    sessions: DashMap<String, Session>,
    user_sockets: DashMap<String, HashSet<String>>,
    task_rooms: DashMap<String, HashSet<String>>,
}

impl SocketHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticated socket and return the receiver half of its
    /// outbound channel. The socket is immediately part of its user's
    /// personal room.
    pub fn register(&self, socket_id: &str, user_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions.insert(
            socket_id.to_string(),
            Session {
                user_id: user_id.to_string(),
                tx,
            },
        );
        self.user_sockets
            .entry(user_id.to_string())
            .or_default()
            .insert(socket_id.to_string());
        info!(socket_id, user_id, "socket connected");
        rx
    }

    /// Remove a socket from every map. Empty user entries and task rooms are
    /// dropped so `is_online` and room iteration stay accurate.
    pub fn disconnect(&self, socket_id: &str) {
        let Some((_, session)) = self.sessions.remove(socket_id) else {
            return;
        };
        if let Some(mut sockets) = self.user_sockets.get_mut(&session.user_id) {
            sockets.remove(socket_id);
            if sockets.is_empty() {
                drop(sockets);
                self.user_sockets
                    .remove_if(&session.user_id, |_, s| s.is_empty());
            }
        }
        self.task_rooms.retain(|_, members| {
            members.remove(socket_id);
            !members.is_empty()
        });
        info!(socket_id, user_id = %session.user_id, "socket disconnected");
    }

    /// Subscribe a socket to a task room. Unknown sockets are ignored; task
    /// ids are not validated here, membership only yields events that are
    /// actually emitted for the task.
    pub fn join_task(&self, socket_id: &str, task_id: &str) {
        if !self.sessions.contains_key(socket_id) {
            return;
        }
        self.task_rooms
            .entry(task_id.to_string())
            .or_default()
            .insert(socket_id.to_string());
        debug!(socket_id, task_id, "joined task room");
    }

    /// Unsubscribe a socket from a task room.
    pub fn leave_task(&self, socket_id: &str, task_id: &str) {
        if let Some(mut members) = self.task_rooms.get_mut(task_id) {
            members.remove(socket_id);
            if members.is_empty() {
                drop(members);
                self.task_rooms.remove_if(task_id, |_, m| m.is_empty());
            }
        }
        debug!(socket_id, task_id, "left task room");
    }

    /// Deliver an event to every socket of one user.
    pub fn emit_to_user(&self, user_id: &str, event: &ServerEvent) {
        let Some(sockets) = self.user_sockets.get(user_id) else {
            return;
        };
        let frame = event.to_frame();
        for socket_id in sockets.iter() {
            self.send_frame(socket_id, &frame);
        }
    }

    /// Deliver an event to each listed user once, even if ids repeat.
    pub fn emit_to_users<'a, I>(&self, user_ids: I, event: &ServerEvent)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        for user_id in user_ids {
            if seen.insert(user_id) {
                self.emit_to_user(user_id, event);
            }
        }
    }

    /// Deliver an event to every socket in a task room.
    pub fn emit_to_task(&self, task_id: &str, event: &ServerEvent) {
        let Some(members) = self.task_rooms.get(task_id) else {
            return;
        };
        let frame = event.to_frame();
        for socket_id in members.iter() {
            self.send_frame(socket_id, &frame);
        }
    }

    /// Deliver an event to every connected socket.
    pub fn broadcast(&self, event: &ServerEvent) {
        let frame = event.to_frame();
        for entry in self.sessions.iter() {
            if entry.value().tx.try_send(frame.clone()).is_err() {
                debug!(socket_id = %entry.key(), "frame dropped (slow or closed socket)");
            }
        }
    }

    /// Whether the user has at least one live socket.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.user_sockets.contains_key(user_id)
    }

    /// Number of distinct users currently connected.
    pub fn online_count(&self) -> usize {
        self.user_sockets.len()
    }

    fn send_frame(&self, socket_id: &str, frame: &str) {
        if let Some(session) = self.sessions.get(socket_id) {
            if session.tx.try_send(frame.to_string()).is_err() {
                debug!(socket_id, "frame dropped (slow or closed socket)");
            }
        }
    }
}
