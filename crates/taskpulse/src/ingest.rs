// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Internal ingest API.
//!
//! The authoritative request layer (the web application owning task CRUD)
//! posts one event here after each successful write; the dispatcher derives
//! all fanout, notification, and invalidation side effects. Bodies carry the
//! post-write record snapshots, camelCase on the wire.
//!
//! All routes require `Authorization: Bearer <service token>`; this is a
//! backend-to-backend surface, never exposed to browsers. Handlers return
//! 202: side effects are best-effort and already decoupled from the caller's
//! transaction.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tracing::warn;

use taskpulse_core::{Comment, FileRecord, Task, User};
use taskpulse_dispatch::Dispatcher;

use crate::directory::SqliteDirectory;

/// Shared state for the ingest routes.
#[derive(Clone)]
pub struct IngestState {
    pub dispatcher: Dispatcher,
    /// Mirror updated from the event snapshots, when a database is
    /// configured. The reminder worker re-validates against it.
    pub directory: Option<Arc<SqliteDirectory>>,
    /// Expected bearer token (the shared service secret).
    pub service_token: String,
}

impl IngestState {
    async fn mirror_task(&self, task: &Task) {
        if let Some(directory) = &self.directory {
            if let Err(e) = directory.put_task(task).await {
                warn!(task_id = %task.id, error = %e, "task mirror update failed");
            }
        }
    }

    async fn mirror_user(&self, user: &User) {
        if let Some(directory) = &self.directory {
            if let Err(e) = directory.put_user(user).await {
                warn!(user_id = %user.id, error = %e, "user mirror update failed");
            }
        }
    }
}

/// Ingest routes, bearer-authenticated.
pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/internal/events/task-created", post(task_created))
        .route("/internal/events/task-updated", post(task_updated))
        .route("/internal/events/task-deleted", post(task_deleted))
        .route("/internal/events/comment-created", post(comment_created))
        .route("/internal/events/comment-deleted", post(comment_deleted))
        .route("/internal/events/files-uploaded", post(files_uploaded))
        .route("/internal/events/file-deleted", post(file_deleted))
        .route("/internal/records/user", post(record_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), service_auth))
        .with_state(state)
}

/// Bearer comparison against the shared service secret. Fail-closed: an
/// empty configured token rejects everything.
async fn service_auth(
    State(state): State<IngestState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.service_token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    let presented = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match presented {
        Some(token) if token == state.service_token => Ok(next.run(request).await),
        _ => Err(StatusCode::UNAUTHORIZED),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskCreatedBody {
    task: Task,
    actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskUpdatedBody {
    before: Task,
    task: Task,
    actor_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDeletedBody {
    task_id: String,
}

#[derive(Debug, Deserialize)]
struct CommentCreatedBody {
    task: Task,
    comment: Comment,
    author: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDeletedBody {
    task_id: String,
    comment_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesUploadedBody {
    task_id: String,
    files: Vec<FileRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDeletedBody {
    task_id: String,
    file_id: String,
}

#[derive(Debug, Deserialize)]
struct RecordUserBody {
    user: User,
}

async fn task_created(
    State(state): State<IngestState>,
    Json(body): Json<TaskCreatedBody>,
) -> StatusCode {
    state.mirror_task(&body.task).await;
    state.dispatcher.task_created(&body.task, &body.actor_id).await;
    StatusCode::ACCEPTED
}

async fn task_updated(
    State(state): State<IngestState>,
    Json(body): Json<TaskUpdatedBody>,
) -> StatusCode {
    state.mirror_task(&body.task).await;
    state
        .dispatcher
        .task_updated(&body.before, &body.task, &body.actor_id)
        .await;
    StatusCode::ACCEPTED
}

async fn task_deleted(
    State(state): State<IngestState>,
    Json(body): Json<TaskDeletedBody>,
) -> StatusCode {
    if let Some(directory) = &state.directory {
        if let Err(e) = directory.mark_task_deleted(&body.task_id).await {
            warn!(task_id = %body.task_id, error = %e, "task mirror delete failed");
        }
    }
    state.dispatcher.task_deleted(&body.task_id).await;
    StatusCode::ACCEPTED
}

async fn comment_created(
    State(state): State<IngestState>,
    Json(body): Json<CommentCreatedBody>,
) -> StatusCode {
    state.mirror_user(&body.author).await;
    state
        .dispatcher
        .comment_created(&body.task, &body.comment, &body.author)
        .await;
    StatusCode::ACCEPTED
}

async fn comment_deleted(
    State(state): State<IngestState>,
    Json(body): Json<CommentDeletedBody>,
) -> StatusCode {
    state
        .dispatcher
        .comment_deleted(&body.task_id, &body.comment_id)
        .await;
    StatusCode::ACCEPTED
}

async fn files_uploaded(
    State(state): State<IngestState>,
    Json(body): Json<FilesUploadedBody>,
) -> StatusCode {
    state.dispatcher.files_uploaded(&body.task_id, &body.files);
    StatusCode::ACCEPTED
}

async fn file_deleted(
    State(state): State<IngestState>,
    Json(body): Json<FileDeletedBody>,
) -> StatusCode {
    state.dispatcher.file_deleted(&body.task_id, &body.file_id);
    StatusCode::ACCEPTED
}

/// Sync one user record into the mirror, so reminder re-validation and
/// recipient resolution see current names and addresses.
async fn record_user(
    State(state): State<IngestState>,
    Json(body): Json<RecordUserBody>,
) -> StatusCode {
    state.mirror_user(&body.user).await;
    StatusCode::ACCEPTED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bodies_deserialize_camel_case() {
        let body: TaskDeletedBody = serde_json::from_str(r#"{"taskId": "t-1"}"#).unwrap();
        assert_eq!(body.task_id, "t-1");

        let body: FileDeletedBody =
            serde_json::from_str(r#"{"taskId": "t-1", "fileId": "f-1"}"#).unwrap();
        assert_eq!(body.file_id, "f-1");

        let body: TaskCreatedBody = serde_json::from_str(
            r#"{
                "actorId": "u-1",
                "task": {
                    "id": "t-1",
                    "title": "minimal",
                    "status": "todo",
                    "created_by": "u-1",
                    "created_at": "2026-01-01T00:00:00Z",
                    "updated_at": "2026-01-01T00:00:00Z"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(body.actor_id, "u-1");
        assert_eq!(body.task.id, "t-1");
    }
}
