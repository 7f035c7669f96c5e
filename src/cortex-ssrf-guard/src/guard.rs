//! Gate for outbound HTTP calls.
//!
//! [`OutboundGuard`] sits in front of the HTTP client. A blocked verdict is
//! turned into [`GuardError::Blocked`] and the request must be aborted; the
//! guard never retries with a different mode.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::{
    GuardError, Result,
    cache::ValidationCache,
    policy::{UrlGuard, ValidationResult},
    redact::{redact_url, sanitize_headers},
    state::GuardMetrics,
};

/// Validation gate used immediately before outbound requests.
#[derive(Debug)]
pub struct OutboundGuard {
    guard: UrlGuard,
    cache: Option<ValidationCache>,
    metrics: Arc<GuardMetrics>,
    validate_requests: bool,
}

impl OutboundGuard {
    /// Create a gate with a verdict cache sized from the guard config.
    pub fn new(guard: UrlGuard) -> Self {
        let config = guard.config();
        let cache = ValidationCache::new(config.cache_ttl(), config.cache_max_entries);

        Self {
            guard,
            cache: Some(cache),
            metrics: Arc::new(GuardMetrics::new()),
            validate_requests: true,
        }
    }

    /// Disable verdict caching; every request is validated.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Turn request validation on or off.
    ///
    /// Off is meant for trusted, operator-configured endpoints only.
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate_requests = enabled;
        self
    }

    /// Get the underlying guard.
    pub fn guard(&self) -> &UrlGuard {
        &self.guard
    }

    /// Get the metrics.
    pub fn metrics(&self) -> &Arc<GuardMetrics> {
        &self.metrics
    }

    /// Get the verdict cache, if enabled.
    pub fn cache(&self) -> Option<&ValidationCache> {
        self.cache.as_ref()
    }

    /// Startup check of a configured URL (no DNS, `api_mode`).
    pub fn check_startup(&self, url: &str) -> Result<()> {
        into_result(url, self.guard.validate_sync(url))
    }

    /// Request-time check (DNS, `webhook_mode`). An error means abort.
    pub async fn ensure_allowed(&self, url: &str) -> Result<()> {
        if !self.validate_requests {
            debug!(url = %redact_url(url), "Outbound request validation disabled");
            return Ok(());
        }

        let mode = self.guard.config().webhook_mode;

        if let Some(cache) = &self.cache {
            if cache.get(url, mode).await.is_some() {
                debug!(url = %redact_url(url), %mode, "SSRF verdict served from cache");
                self.metrics.record_cache_hit();
                return Ok(());
            }
        }

        let result = self.guard.validate_with_mode(url, mode).await;

        if result.valid {
            if let Some(cache) = &self.cache {
                cache.insert(url, mode, result.clone()).await;
            }
            self.metrics.record_allowed();
        } else {
            self.metrics.record_blocked();
        }

        into_result(url, result)
    }

    /// Drop the cached verdict for `url`, e.g. after a DNS change.
    pub async fn invalidate(&self, url: &str) {
        if let Some(cache) = &self.cache {
            cache
                .invalidate(url, self.guard.config().webhook_mode)
                .await;
        }
    }

    /// Log an outbound request with credentials redacted.
    pub fn log_request(&self, method: &str, url: &str, headers: &HashMap<String, String>) {
        let headers = sanitize_headers(headers);
        debug!(method, url = %redact_url(url), ?headers, "Outbound request");
    }
}

fn into_result(url: &str, result: ValidationResult) -> Result<()> {
    if result.valid {
        return Ok(());
    }

    Err(GuardError::Blocked {
        url: redact_url(url),
        reason: result.reason.unwrap_or_default(),
    })
}
