// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Notification email rendering.
//!
//! Every template produces both an HTML and a plain-text body. User-supplied
//! strings (titles, names, comment content) are HTML-escaped before they are
//! interpolated into the HTML body.

use chrono::{DateTime, Utc};

use taskpulse_core::{EmailMessage, TaskStatus};

/// Identity baked into every rendered email: the app name for the footer and
/// the frontend base URL for task links.
#[derive(Debug, Clone)]
pub struct Branding {
    pub app_name: String,
    pub frontend_url: String,
}

impl Branding {
    pub fn new(app_name: impl Into<String>, frontend_url: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            frontend_url: frontend_url.into(),
        }
    }

    fn task_url(&self, task_id: &str) -> String {
        format!("{}/tasks/{}", self.frontend_url.trim_end_matches('/'), task_id)
    }

    fn wrap_html(&self, heading: &str, inner: &str, task_id: &str) -> String {
        format!(
            concat!(
                "<!DOCTYPE html><html><body>",
                "<div style=\"max-width:600px;margin:0 auto;padding:20px;",
                "font-family:Arial,sans-serif;line-height:1.6;color:#333\">",
                "<h1 style=\"color:#667eea\">{heading}</h1>",
                "{inner}",
                "<p><a href=\"{url}\" style=\"display:inline-block;padding:12px 30px;",
                "background:#667eea;color:white;text-decoration:none;border-radius:5px\">",
                "View Task</a></p>",
                "<p style=\"color:#666;font-size:14px\">",
                "This is an automated message from {app}</p>",
                "</div></body></html>"
            ),
            heading = heading,
            inner = inner,
            url = self.task_url(task_id),
            app = escape_html(&self.app_name),
        )
    }

    /// Rendered when a task is assigned to someone other than the actor.
    pub fn task_assigned(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
        task_id: &str,
        assigned_by: &str,
    ) -> EmailMessage {
        let inner = format!(
            "<p>Hi <strong>{}</strong>,</p>\
             <p>You have been assigned a new task by <strong>{}</strong>:</p>\
             <h2>{}</h2>\
             <p>Please review the task details and take necessary action.</p>",
            escape_html(to_name),
            escape_html(assigned_by),
            escape_html(task_title),
        );
        EmailMessage {
            to: to_email.to_string(),
            subject: format!("New Task Assigned: {task_title}"),
            html_body: self.wrap_html("New Task Assigned", &inner, task_id),
            text_body: format!(
                "Hi {to_name}, You have been assigned a new task by {assigned_by}: \
                 {task_title}. View it at {}",
                self.task_url(task_id),
            ),
        }
    }

    /// Rendered when a task's status changes.
    pub fn status_changed(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
        task_id: &str,
        new_status: TaskStatus,
        changed_by: &str,
    ) -> EmailMessage {
        let inner = format!(
            "<p>Hi <strong>{}</strong>,</p>\
             <p><strong>{}</strong> updated the status of:</p>\
             <h2>{}</h2>\
             <p><strong>New Status:</strong> {}</p>",
            escape_html(to_name),
            escape_html(changed_by),
            escape_html(task_title),
            new_status.label(),
        );
        EmailMessage {
            to: to_email.to_string(),
            subject: format!("Task Status Updated: {task_title}"),
            html_body: self.wrap_html("Task Status Updated", &inner, task_id),
            text_body: format!(
                "Hi {to_name}, {changed_by} updated the status of task \"{task_title}\" \
                 to {}. View it at {}",
                new_status.label(),
                self.task_url(task_id),
            ),
        }
    }

    /// Rendered when someone comments on a task.
    pub fn comment_added(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
        task_id: &str,
        commenter_name: &str,
        comment_content: &str,
    ) -> EmailMessage {
        let inner = format!(
            "<p>Hi <strong>{}</strong>,</p>\
             <p><strong>{}</strong> commented on task: <strong>{}</strong></p>\
             <blockquote style=\"border-left:4px solid #667eea;padding-left:15px\">{}</blockquote>",
            escape_html(to_name),
            escape_html(commenter_name),
            escape_html(task_title),
            escape_html(comment_content),
        );
        EmailMessage {
            to: to_email.to_string(),
            subject: format!("New comment on: {task_title}"),
            html_body: self.wrap_html("New Comment on Task", &inner, task_id),
            text_body: format!(
                "Hi {to_name}, {commenter_name} commented on task \"{task_title}\": \
                 {comment_content}"
            ),
        }
    }

    /// Rendered by the reminder worker shortly before a task's due date.
    pub fn deadline_reminder(
        &self,
        to_email: &str,
        to_name: &str,
        task_title: &str,
        task_id: &str,
        due_date: DateTime<Utc>,
    ) -> EmailMessage {
        let formatted = due_date.format("%A, %B %-d, %Y").to_string();
        let inner = format!(
            "<p>Hi <strong>{}</strong>,</p>\
             <p>This is a reminder that the following task is due soon:</p>\
             <h2>{}</h2>\
             <p><strong>Due Date:</strong> {}</p>\
             <p>Please ensure the task is completed on time.</p>",
            escape_html(to_name),
            escape_html(task_title),
            formatted,
        );
        EmailMessage {
            to: to_email.to_string(),
            subject: format!("Reminder: {task_title} is due soon"),
            html_body: self.wrap_html("Task Deadline Reminder", &inner, task_id),
            text_body: format!(
                "Hi {to_name}, This is a reminder that task \"{task_title}\" is due \
                 on {formatted}. View it at {}",
                self.task_url(task_id),
            ),
        }
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
