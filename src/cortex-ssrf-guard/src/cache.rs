//! Verdict cache for repeated checks of the same target.
//!
//! Entries are keyed by the exact URL string and mode, expire after a TTL,
//! and the cache is bounded. Only allowed verdicts are stored: a block or a
//! resolution failure is always evaluated again on the next call.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use super::config::SecurityMode;
use super::policy::ValidationResult;

type CacheKey = (String, SecurityMode);

#[derive(Debug, Clone)]
struct CachedVerdict {
    result: ValidationResult,
    stored_at: Instant,
}

impl CachedVerdict {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() >= ttl
    }
}

/// TTL- and size-bounded cache of allowed verdicts.
///
/// Safe to share across tasks via `Arc<ValidationCache>`.
#[derive(Debug)]
pub struct ValidationCache {
    entries: RwLock<HashMap<CacheKey, CachedVerdict>>,
    ttl: Duration,
    max_entries: usize,
}

impl ValidationCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            max_entries,
        }
    }

    /// Get a fresh cached verdict.
    pub async fn get(&self, url: &str, mode: SecurityMode) -> Option<ValidationResult> {
        let key = (url.to_string(), mode);
        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if !entry.is_expired(self.ttl) => return Some(entry.result.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Expired: drop it so the next caller re-validates
        self.entries.write().await.remove(&key);
        debug!(url, %mode, "Cached SSRF verdict expired");
        None
    }

    /// Store a verdict. Blocked verdicts are ignored.
    pub async fn insert(&self, url: &str, mode: SecurityMode, result: ValidationResult) {
        if !result.valid || self.max_entries == 0 || self.ttl.is_zero() {
            return;
        }

        let mut entries = self.entries.write().await;

        if entries.len() >= self.max_entries && !entries.contains_key(&(url.to_string(), mode)) {
            entries.retain(|_, entry| !entry.is_expired(self.ttl));

            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.stored_at)
                    .map(|(key, _)| key.clone());
                if let Some(oldest) = oldest {
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(
            (url.to_string(), mode),
            CachedVerdict {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Forget the verdict for one target.
    pub async fn invalidate(&self, url: &str, mode: SecurityMode) -> bool {
        self.entries
            .write()
            .await
            .remove(&(url.to_string(), mode))
            .is_some()
    }

    /// Forget every verdict.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Drop expired entries. Returns how many were removed.
    pub async fn prune_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
