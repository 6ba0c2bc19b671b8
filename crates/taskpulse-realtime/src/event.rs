// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server -> client events and their wire encoding.
//!
//! Every frame on the socket is a JSON envelope:
//! ```json
//! {"event": "task:updated", "data": { ... }}
//! ```
//! Create/update events carry the full record; delete events carry only the
//! id, since the record may already be gone.

use serde::Serialize;
use serde_json::json;

use taskpulse_core::{Comment, FileRecord, Task};

/// An event fanned out to connected clients.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    TaskCreated(Task),
    TaskUpdated(Task),
    TaskDeleted { task_id: String },
    CommentAdded(Comment),
    CommentDeleted { comment_id: String },
    FileUploaded(FileRecord),
    FileDeleted { file_id: String },
}

impl ServerEvent {
    /// Wire name, as subscribed to by the frontend.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::TaskCreated(_) => "task:created",
            ServerEvent::TaskUpdated(_) => "task:updated",
            ServerEvent::TaskDeleted { .. } => "task:deleted",
            ServerEvent::CommentAdded(_) => "comment:added",
            ServerEvent::CommentDeleted { .. } => "comment:deleted",
            ServerEvent::FileUploaded(_) => "file:uploaded",
            ServerEvent::FileDeleted { .. } => "file:deleted",
        }
    }

    fn data(&self) -> serde_json::Value {
        fn value<T: Serialize>(record: &T) -> serde_json::Value {
            serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
        }
        match self {
            ServerEvent::TaskCreated(task) | ServerEvent::TaskUpdated(task) => value(task),
            ServerEvent::TaskDeleted { task_id } => json!({ "taskId": task_id }),
            ServerEvent::CommentAdded(comment) => value(comment),
            ServerEvent::CommentDeleted { comment_id } => json!({ "commentId": comment_id }),
            ServerEvent::FileUploaded(file) => value(file),
            ServerEvent::FileDeleted { file_id } => json!({ "fileId": file_id }),
        }
    }

    /// Render the full envelope as a text frame.
    pub fn to_frame(&self) -> String {
        json!({ "event": self.name(), "data": self.data() }).to_string()
    }
}
