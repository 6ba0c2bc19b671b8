// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end dispatcher scenarios: one mutation in, the right set of
//! frames, emails, and scheduled jobs out.

use std::sync::Arc;

use chrono::{Duration, Utc};

use taskpulse_cache::Cache;
use taskpulse_core::{Comment, FileRecord, Task};
use taskpulse_dispatch::Dispatcher;
use taskpulse_notify::{Branding, Notifier};
use taskpulse_queue::JobQueue;
use taskpulse_realtime::SocketHub;
use taskpulse_test_utils::{sample_task, sample_user, MockMailTransport, MockUserStore};

struct Harness {
    hub: Arc<SocketHub>,
    transport: Arc<MockMailTransport>,
    users: Arc<MockUserStore>,
    dispatcher: Dispatcher,
}

/// Dispatcher wired to a disabled queue and cache, so emails are observable
/// synchronously on the mock transport.
fn harness() -> Harness {
    harness_with_queue(JobQueue::disabled())
}

fn harness_with_queue(queue: JobQueue) -> Harness {
    harness_with(queue, Cache::disabled())
}

fn harness_with(queue: JobQueue, cache: Cache) -> Harness {
    let hub = Arc::new(SocketHub::new());
    let transport = Arc::new(MockMailTransport::new());
    let users = Arc::new(MockUserStore::with_users(3));
    let dispatcher = Dispatcher::new(
        hub.clone(),
        cache,
        Notifier::new(queue, transport.clone()),
        users.clone(),
        Branding::new("Taskpulse", "http://localhost:3000"),
        Duration::hours(24),
    );
    Harness {
        hub,
        transport,
        users,
        dispatcher,
    }
}

fn assigned_task(id: &str, creator: &str, assignee: &str) -> Task {
    let mut task = sample_task(id, creator);
    task.assigned_to = Some(assignee.to_string());
    task
}

fn comment(task_id: &str, author: &str, content: &str) -> Comment {
    Comment {
        id: "c1".into(),
        task_id: task_id.into(),
        user_id: author.into(),
        content: content.into(),
        created_at: Utc::now(),
    }
}

fn file(id: &str, task_id: &str) -> FileRecord {
    FileRecord {
        id: id.into(),
        task_id: task_id.into(),
        uploaded_by: "u1".into(),
        original_name: format!("{id}.pdf"),
        mime_type: "application/pdf".into(),
        size: 1024,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn create_notifies_assignee_and_broadcasts() {
    let h = harness();
    let mut rx = h.hub.register("s1", "u3");

    h.dispatcher
        .task_created(&assigned_task("t1", "u1", "u2"), "u1")
        .await;

    // Assignee got the email, addressed by name, naming the actor.
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u2@example.com");
    assert!(sent[0].subject.starts_with("New Task Assigned"));
    assert!(sent[0].html_body.contains("User u1"));

    // Everyone connected saw the broadcast, room membership or not.
    let frame = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["event"], "task:created");
    assert_eq!(parsed["data"]["id"], "t1");
}

#[tokio::test]
async fn self_assignment_sends_no_email() {
    let h = harness();
    h.dispatcher
        .task_created(&assigned_task("t1", "u1", "u1"), "u1")
        .await;
    assert_eq!(h.transport.sent_count(), 0);

    let h = harness();
    h.dispatcher.task_created(&sample_task("t2", "u1"), "u1").await;
    assert_eq!(h.transport.sent_count(), 0, "unassigned task notifies nobody");
}

#[tokio::test]
async fn reassignment_notifies_only_the_new_assignee() {
    let h = harness();
    let before = assigned_task("t1", "u1", "u2");
    let after = assigned_task("t1", "u1", "u3");

    h.dispatcher.task_updated(&before, &after, "u1").await;

    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u3@example.com");
    assert!(sent[0].subject.starts_with("New Task Assigned"));
}

#[tokio::test]
async fn unchanged_assignee_is_not_renotified() {
    let h = harness();
    let before = assigned_task("t1", "u1", "u2");
    let mut after = before.clone();
    after.title = "renamed".into();

    h.dispatcher.task_updated(&before, &after, "u1").await;
    assert_eq!(h.transport.sent_count(), 0);
}

#[tokio::test]
async fn status_change_notifies_creator_and_assignee_but_never_the_actor() {
    use taskpulse_core::TaskStatus;

    // Assignee flips the status: only the creator hears about it.
    let h = harness();
    let before = assigned_task("t1", "u1", "u2");
    let mut after = before.clone();
    after.status = TaskStatus::Completed;
    h.dispatcher.task_updated(&before, &after, "u2").await;
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u1@example.com");
    assert!(sent[0].subject.starts_with("Task Status Updated"));
    assert!(sent[0].html_body.contains("COMPLETED"));

    // A third party flips it: both creator and assignee hear about it.
    let h = harness();
    let before = assigned_task("t1", "u1", "u2");
    let mut after = before.clone();
    after.status = TaskStatus::InProgress;
    h.dispatcher.task_updated(&before, &after, "u3").await;
    let mut recipients: Vec<String> = h.transport.sent().iter().map(|m| m.to.clone()).collect();
    recipients.sort();
    assert_eq!(recipients, ["u1@example.com", "u2@example.com"]);
}

#[tokio::test]
async fn status_change_to_self_created_self_assigned_task_is_quiet() {
    use taskpulse_core::TaskStatus;

    let h = harness();
    let before = assigned_task("t1", "u1", "u1");
    let mut after = before.clone();
    after.status = TaskStatus::Completed;
    h.dispatcher.task_updated(&before, &after, "u1").await;
    assert_eq!(h.transport.sent_count(), 0);
}

#[tokio::test]
async fn update_emits_only_to_the_task_room() {
    let h = harness();
    let mut watcher = h.hub.register("s1", "u2");
    let mut bystander = h.hub.register("s2", "u3");
    h.hub.join_task("s1", "t1");

    let before = sample_task("t1", "u1");
    let mut after = before.clone();
    after.title = "renamed".into();
    h.dispatcher.task_updated(&before, &after, "u1").await;

    let frame = watcher.recv().await.unwrap();
    assert!(frame.contains("task:updated"));
    assert!(bystander.try_recv().is_err());
}

#[tokio::test]
async fn delete_broadcasts_the_task_id() {
    let h = harness();
    let mut rx = h.hub.register("s1", "u2");

    h.dispatcher.task_deleted("t1").await;

    let frame = rx.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["event"], "task:deleted");
    assert_eq!(parsed["data"], serde_json::json!({ "taskId": "t1" }));
}

#[tokio::test]
async fn comment_notifies_creator_and_assignee_minus_author() {
    let h = harness();
    let task = assigned_task("t1", "u1", "u2");
    let author = sample_user("u3");

    h.dispatcher
        .comment_created(&task, &comment("t1", "u3", "looks good"), &author)
        .await;

    let mut recipients: Vec<String> = h.transport.sent().iter().map(|m| m.to.clone()).collect();
    recipients.sort();
    assert_eq!(recipients, ["u1@example.com", "u2@example.com"]);
    assert!(h.transport.sent()[0].subject.starts_with("New comment on"));
}

#[tokio::test]
async fn comment_author_is_excluded_and_recipients_deduped() {
    // Author is the assignee: only the creator remains.
    let h = harness();
    let task = assigned_task("t1", "u1", "u2");
    h.dispatcher
        .comment_created(&task, &comment("t1", "u2", "done"), &sample_user("u2"))
        .await;
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u1@example.com");

    // Creator == assignee: one recipient, one email.
    let h = harness();
    let task = assigned_task("t1", "u1", "u1");
    h.dispatcher
        .comment_created(&task, &comment("t1", "u3", "hi"), &sample_user("u3"))
        .await;
    assert_eq!(h.transport.sent_count(), 1);

    // Creator comments on their own unassigned task: silence.
    let h = harness();
    let task = sample_task("t1", "u1");
    h.dispatcher
        .comment_created(&task, &comment("t1", "u1", "note to self"), &sample_user("u1"))
        .await;
    assert_eq!(h.transport.sent_count(), 0);
}

#[tokio::test]
async fn comment_events_reach_the_task_room() {
    let h = harness();
    let mut watcher = h.hub.register("s1", "u2");
    h.hub.join_task("s1", "t1");

    let task = sample_task("t1", "u1");
    h.dispatcher
        .comment_created(&task, &comment("t1", "u1", "hello"), &sample_user("u1"))
        .await;
    let frame = watcher.recv().await.unwrap();
    assert!(frame.contains("comment:added"));

    h.dispatcher.comment_deleted("t1", "c1").await;
    let frame = watcher.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["event"], "comment:deleted");
    assert_eq!(parsed["data"]["commentId"], "c1");
}

#[tokio::test]
async fn file_events_are_emitted_per_file() {
    let h = harness();
    let mut watcher = h.hub.register("s1", "u2");
    h.hub.join_task("s1", "t1");

    h.dispatcher
        .files_uploaded("t1", &[file("f1", "t1"), file("f2", "t1")]);
    let first = watcher.recv().await.unwrap();
    let second = watcher.recv().await.unwrap();
    assert!(first.contains("file:uploaded"));
    assert!(second.contains("file:uploaded"));
    assert!(watcher.try_recv().is_err());

    h.dispatcher.file_deleted("t1", "f1");
    let frame = watcher.recv().await.unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(parsed["data"]["fileId"], "f1");
}

#[tokio::test]
async fn create_with_future_due_date_schedules_a_reminder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.db");
    let queue = JobQueue::open(path.to_str()).await;
    let h = harness_with_queue(queue.clone());

    let mut task = assigned_task("t1", "u1", "u2");
    task.due_date = Some(Utc::now() + Duration::hours(48));
    h.dispatcher.task_created(&task, "u2").await;

    // Self-assigned by the actor, so no email; but the reminder is queued
    // and not yet eligible (due in 48h, lead 24h).
    let counts = queue.counts().await.unwrap();
    assert_eq!(counts.pending, 1);
    assert!(queue.dequeue().await.is_none());
}

#[tokio::test]
async fn no_reminder_for_completed_past_due_or_undated_tasks() {
    use taskpulse_core::TaskStatus;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.db");
    let queue = JobQueue::open(path.to_str()).await;
    let h = harness_with_queue(queue.clone());

    let undated = sample_task("t1", "u1");
    h.dispatcher.task_created(&undated, "u1").await;

    let mut completed = sample_task("t2", "u1");
    completed.status = TaskStatus::Completed;
    completed.due_date = Some(Utc::now() + Duration::hours(48));
    h.dispatcher.task_created(&completed, "u1").await;

    let mut overdue = sample_task("t3", "u1");
    overdue.due_date = Some(Utc::now() - Duration::hours(1));
    h.dispatcher.task_created(&overdue, "u1").await;

    assert_eq!(queue.counts().await.unwrap().pending, 0);
}

// Invalidation-discipline tests require Redis running.
// Run with: cargo test -p taskpulse-dispatch -- --ignored

#[tokio::test]
#[ignore]
async fn task_mutations_invalidate_list_and_analytics_caches() {
    use taskpulse_cache::keys;

    let cache = Cache::connect(Some("redis://localhost:6379")).await;
    assert!(cache.is_enabled());

    cache.set("tasks:user:u1", &1u32, None).await;
    cache.set("tasks:user:u2:status=todo", &2u32, None).await;
    cache.set("analytics:user:u1", &3u32, None).await;
    // A key outside the task/analytics namespaces must survive.
    cache.set("taskpulse-test:unrelated", &4u32, None).await;

    let h = harness_with(JobQueue::disabled(), cache.clone());
    h.dispatcher.task_created(&sample_task("t1", "u1"), "u1").await;

    assert!(cache.get::<u32>("tasks:user:u1").await.is_none());
    assert!(cache.get::<u32>("tasks:user:u2:status=todo").await.is_none());
    assert!(cache.get::<u32>("analytics:user:u1").await.is_none());
    assert_eq!(cache.get::<u32>("taskpulse-test:unrelated").await, Some(4));

    // An update also drops the task's own entry.
    cache.set(&keys::task("t1"), &5u32, None).await;
    cache.set("tasks:user:u1", &6u32, None).await;
    let before = sample_task("t1", "u1");
    let mut after = before.clone();
    after.title = "renamed".into();
    h.dispatcher.task_updated(&before, &after, "u1").await;
    assert!(cache.get::<u32>(&keys::task("t1")).await.is_none());
    assert!(cache.get::<u32>("tasks:user:u1").await.is_none());

    cache.delete("taskpulse-test:unrelated").await;
}

#[tokio::test]
#[ignore]
async fn comment_mutations_invalidate_the_task_comment_cache() {
    use taskpulse_cache::keys;

    let cache = Cache::connect(Some("redis://localhost:6379")).await;
    assert!(cache.is_enabled());

    let h = harness_with(JobQueue::disabled(), cache.clone());
    let task = sample_task("t1", "u1");

    cache.set(&keys::task_comments("t1"), &1u32, None).await;
    h.dispatcher
        .comment_created(&task, &comment("t1", "u1", "hi"), &sample_user("u1"))
        .await;
    assert!(cache.get::<u32>(&keys::task_comments("t1")).await.is_none());

    cache.set(&keys::task_comments("t1"), &2u32, None).await;
    h.dispatcher.comment_deleted("t1", "c1").await;
    assert!(cache.get::<u32>(&keys::task_comments("t1")).await.is_none());
}

#[tokio::test]
async fn missing_users_never_break_dispatch() {
    let h = harness();
    h.users.remove("u2");

    let task = assigned_task("t1", "u1", "u2");
    h.dispatcher.task_created(&task, "u1").await;
    h.dispatcher
        .comment_created(&task, &comment("t1", "u3", "hi"), &sample_user("u3"))
        .await;

    // The vanished assignee is skipped; remaining recipients still served.
    let sent = h.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u1@example.com");
}
