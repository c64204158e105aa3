// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fixed-window rate limiter for contact form submissions.
//!
//! Each client identity gets a window of `window_secs` anchored at its first
//! request; up to `max_requests` submissions are accepted inside it. Records
//! live in a [`RateLimitStore`], which the limiter receives at construction so
//! a shared backing store can replace the in-memory one.
//!
//! The limiter is advisory: a record is loaded and saved in two steps, so
//! concurrent requests for the same key may lose an increment.

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Per-identity counter for the current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRecord {
    /// Accepted requests in this window
    pub count: u32,
    /// When the window closes
    pub reset_time: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Whether the window has closed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_time
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request is allowed
    Allowed {
        /// Remaining requests in current window
        remaining: u32,
        /// When the current window closes
        reset_at: DateTime<Utc>,
    },
    /// Request is rate limited
    Limited {
        /// Time until the window closes
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitResult::Allowed { .. })
    }
}

/// Backing storage for rate limit records.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Fetch the record for `key`, if any.
    async fn load(&self, key: &str) -> Option<RateLimitRecord>;

    /// Insert or replace the record for `key`.
    async fn save(&self, key: &str, record: RateLimitRecord);

    /// Drop every record whose window closed before `now`. Returns how many
    /// were removed.
    async fn sweep(&self, now: DateTime<Utc>) -> usize;

    /// Number of records currently held.
    async fn len(&self) -> usize;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, RateLimitRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn load(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.read().await.get(key).copied()
    }

    async fn save(&self, key: &str, record: RateLimitRecord) {
        self.records.write().await.insert(key.to_string(), record);
    }

    async fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        before - records.len()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

/// Fixed-window rate limiter over an injected store.
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
    checks: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter backed by a fresh [`MemoryStore`].
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Create a limiter over an existing store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self {
            config,
            store,
            checks: AtomicU64::new(0),
        }
    }

    /// Check and record a request for `key` at the current time.
    pub async fn check(&self, key: &str) -> RateLimitResult {
        self.check_at(key, Utc::now()).await
    }

    /// Check and record a request for `key` at `now`.
    pub async fn check_at(&self, key: &str, now: DateTime<Utc>) -> RateLimitResult {
        let calls = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if self.config.sweep_every > 0 && calls % self.config.sweep_every == 0 {
            let removed = self.store.sweep(now).await;
            debug!(removed, "Swept expired rate limit records");
        }

        let max = self.config.max_requests;

        match self.store.load(key).await {
            Some(mut record) if !record.is_expired(now) => {
                if record.count >= max {
                    let retry_after = (record.reset_time - now).to_std().unwrap_or(Duration::ZERO);
                    debug!(key, count = record.count, ?retry_after, "Rate limit exceeded");
                    return RateLimitResult::Limited { retry_after };
                }

                record.count += 1;
                self.store.save(key, record).await;
                RateLimitResult::Allowed {
                    remaining: max - record.count,
                    reset_at: record.reset_time,
                }
            }
            _ => {
                let record = RateLimitRecord {
                    count: 1,
                    reset_time: now
                        .checked_add_signed(self.window())
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                };
                self.store.save(key, record).await;
                RateLimitResult::Allowed {
                    remaining: max.saturating_sub(1),
                    reset_at: record.reset_time,
                }
            }
        }
    }

    /// Remove expired records (called from the background sweeper).
    pub async fn cleanup(&self) -> usize {
        self.cleanup_at(Utc::now()).await
    }

    pub async fn cleanup_at(&self, now: DateTime<Utc>) -> usize {
        self.store.sweep(now).await
    }

    /// Number of identities currently tracked.
    pub async fn tracked(&self) -> usize {
        self.store.len().await
    }

    fn window(&self) -> ChronoDuration {
        ChronoDuration::from_std(self.config.window_duration())
            .unwrap_or_else(|_| ChronoDuration::hours(1))
    }
}
