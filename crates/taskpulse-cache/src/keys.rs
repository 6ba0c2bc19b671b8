// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache key builders and TTL constants.
//!
//! Keys follow `<entity>:<id>` for single records and `<entity>:<scope>:*`
//! glob patterns for coarse invalidation. Every caller goes through these
//! builders so the invalidation discipline in the dispatcher stays in sync
//! with the read paths.

/// Key for a single task record.
pub fn task(task_id: &str) -> String {
    format!("task:{task_id}")
}

/// Key for one page of a user's task list, optionally qualified by a
/// serialized filter string.
pub fn task_list(user_id: &str, filters: Option<&str>) -> String {
    match filters {
        Some(f) => format!("tasks:user:{user_id}:{f}"),
        None => format!("tasks:user:{user_id}"),
    }
}

/// Pattern matching every cached task-list page for every user.
pub fn task_lists() -> &'static str {
    "tasks:*"
}

/// Key for the cached comment list of a task.
pub fn task_comments(task_id: &str) -> String {
    format!("comments:task:{task_id}")
}

/// Key for a user's analytics summary.
pub fn analytics(user_id: &str) -> String {
    format!("analytics:user:{user_id}")
}

/// Pattern matching every cached analytics summary.
pub fn analytics_all() -> &'static str {
    "analytics:*"
}

/// Cache TTLs in seconds.
pub mod ttl {
    pub const SHORT: u64 = 60;
    pub const MEDIUM: u64 = 300;
    pub const LONG: u64 = 1800;
    pub const HOUR: u64 = 3600;
    pub const DAY: u64 = 86400;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_builders_shape() {
        assert_eq!(task("t-1"), "task:t-1");
        assert_eq!(task_list("u-1", None), "tasks:user:u-1");
        assert_eq!(
            task_list("u-1", Some("status=todo:page=2")),
            "tasks:user:u-1:status=todo:page=2"
        );
        assert_eq!(task_comments("t-1"), "comments:task:t-1");
        assert_eq!(analytics("u-1"), "analytics:user:u-1");
    }

    #[test]
    fn patterns_cover_their_keys() {
        // The wildcard patterns must glob-match every key their builders
        // produce, or invalidation would miss entries.
        assert!(task_list("u-1", Some("p=1")).starts_with("tasks:"));
        assert!(analytics("u-1").starts_with("analytics:"));
        assert_eq!(task_lists(), "tasks:*");
        assert_eq!(analytics_all(), "analytics:*");
    }

    #[test]
    fn ttl_ordering() {
        assert!(ttl::SHORT < ttl::MEDIUM);
        assert!(ttl::MEDIUM < ttl::LONG);
        assert!(ttl::LONG < ttl::HOUR);
        assert!(ttl::HOUR < ttl::DAY);
    }
}
