// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional Redis cache layer with glob-pattern invalidation.
//!
//! The cache is an accelerator, never a correctness dependency: when no Redis
//! URL is configured (or the connection fails at startup), every operation is
//! a safe no-op — `get` always misses and mutations report `false`. Transport
//! errors at runtime are logged and converted to misses/`false` at this
//! boundary; they never propagate to the caller.

pub mod keys;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Cloneable handle to the cache backend.
///
/// Cloning is cheap; all clones share the same multiplexed connection.
#[derive(Clone)]
pub struct Cache {
    conn: Option<ConnectionManager>,
}

impl Cache {
    /// Connect to Redis, or return a disabled cache.
    ///
    /// `None` url disables caching by configuration. A failed connection also
    /// disables caching (logged), preserving the host process.
    pub async fn connect(redis_url: Option<&str>) -> Self {
        let Some(url) = redis_url else {
            info!("no redis url configured, caching disabled");
            return Self { conn: None };
        };

        match redis::Client::open(url) {
            Ok(client) => match ConnectionManager::new(client).await {
                Ok(conn) => {
                    info!(url = %url, "redis cache connected");
                    Self { conn: Some(conn) }
                }
                Err(e) => {
                    warn!(error = %e, "redis connection failed, caching disabled");
                    Self { conn: None }
                }
            },
            Err(e) => {
                warn!(error = %e, "invalid redis url, caching disabled");
                Self { conn: None }
            }
        }
    }

    /// A cache that is permanently disabled. Every `get` misses and every
    /// mutation returns `false`.
    pub fn disabled() -> Self {
        Self { conn: None }
    }

    /// Whether a backend connection is available.
    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    /// Fetch and deserialize a cached value. Any transport or decode failure
    /// is a miss.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key, error = %e, "cache entry failed to deserialize, treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "cache get failed, treating as miss");
                None
            }
        }
    }

    /// Serialize and store a value, optionally expiring after `ttl` seconds.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Option<u64>) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        let serialized = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                warn!(key, error = %e, "cache set skipped: serialization failed");
                return false;
            }
        };
        let result = match ttl {
            Some(secs) => conn.set_ex::<_, _, ()>(key, serialized, secs).await,
            None => conn.set::<_, _, ()>(key, serialized).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "cache set failed");
                false
            }
        }
    }

    /// Remove a single key.
    pub async fn delete(&self, key: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        match conn.del::<_, i64>(key).await {
            Ok(_) => true,
            Err(e) => {
                warn!(key, error = %e, "cache delete failed");
                false
            }
        }
    }

    /// Remove every key matching a glob pattern.
    ///
    /// This is a scan-then-delete sequence; a key written between the scan and
    /// the delete may survive. Invalidation is best-effort, bounded by the
    /// next successful invalidation or TTL expiry.
    pub async fn delete_pattern(&self, pattern: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        let keys: Vec<String> = match conn.keys(pattern).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(pattern, error = %e, "cache pattern scan failed");
                return false;
            }
        };
        if keys.is_empty() {
            return true;
        }
        match conn.del::<_, i64>(keys.clone()).await {
            Ok(removed) => {
                debug!(pattern, removed, "cache pattern invalidated");
                true
            }
            Err(e) => {
                warn!(pattern, error = %e, "cache pattern delete failed");
                false
            }
        }
    }

    /// Whether a key currently exists.
    pub async fn exists(&self, key: &str) -> bool {
        let Some(mut conn) = self.conn.clone() else {
            return false;
        };
        match conn.exists::<_, bool>(key).await {
            Ok(present) => present,
            Err(e) => {
                warn!(key, error = %e, "cache exists failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_cache_is_a_safe_noop() {
        let cache = Cache::disabled();
        assert!(!cache.is_enabled());

        // Correctness must hold with caching fully disabled: every read
        // misses and every mutation reports failure without error.
        let miss: Option<String> = cache.get("task:1").await;
        assert!(miss.is_none());
        assert!(!cache.set("task:1", &"value", Some(keys::ttl::SHORT)).await);
        assert!(!cache.delete("task:1").await);
        assert!(!cache.delete_pattern(keys::task_lists()).await);
        assert!(!cache.exists("task:1").await);
    }

    #[tokio::test]
    async fn connect_with_no_url_disables() {
        let cache = Cache::connect(None).await;
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn connect_with_bad_url_disables() {
        let cache = Cache::connect(Some("not-a-redis-url")).await;
        assert!(!cache.is_enabled());
    }

    // Integration tests require Redis running.
    // Run with: cargo test -p taskpulse-cache -- --ignored

    #[tokio::test]
    #[ignore]
    async fn set_get_delete_round_trip() {
        let cache = Cache::connect(Some("redis://localhost:6379")).await;
        assert!(cache.is_enabled());

        assert!(cache.set("taskpulse-test:k1", &42u32, Some(60)).await);
        let got: Option<u32> = cache.get("taskpulse-test:k1").await;
        assert_eq!(got, Some(42));
        assert!(cache.exists("taskpulse-test:k1").await);
        assert!(cache.delete("taskpulse-test:k1").await);
        let gone: Option<u32> = cache.get("taskpulse-test:k1").await;
        assert!(gone.is_none());
    }

    #[tokio::test]
    #[ignore]
    async fn pattern_delete_removes_matching_keys() {
        let cache = Cache::connect(Some("redis://localhost:6379")).await;

        cache.set("taskpulse-test:tasks:user:a", &1u32, None).await;
        cache.set("taskpulse-test:tasks:user:b", &2u32, None).await;
        cache.set("taskpulse-test:other", &3u32, None).await;

        assert!(cache.delete_pattern("taskpulse-test:tasks:*").await);
        let a: Option<u32> = cache.get("taskpulse-test:tasks:user:a").await;
        let other: Option<u32> = cache.get("taskpulse-test:other").await;
        assert!(a.is_none());
        assert_eq!(other, Some(3));

        cache.delete("taskpulse-test:other").await;
    }
}
