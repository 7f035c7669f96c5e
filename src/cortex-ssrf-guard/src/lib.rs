//! Outbound request guard with SSRF protection for Cortex.
//!
//! Before a caller-supplied URL (a webhook, a configured API base URL) is
//! contacted, this crate decides whether the destination is safe:
//! - Cloud metadata endpoints are blocked in every mode
//! - Loopback and private ranges are blocked depending on [`SecurityMode`]
//! - DNS rebinding is defeated by checking the *resolved* address
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    OutboundGuard                             │
//! │  ┌─────────────────────────────────────────────────────────┐│
//! │  │                    UrlGuard                              ││
//! │  │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────┐ ││
//! │  │  │ classifier  │  │ NameResolver│  │ SecurityMode    │ ││
//! │  │  └─────────────┘  └─────────────┘  └─────────────────┘ ││
//! │  └─────────────────────────────────────────────────────────┘│
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐ │
//! │  │ ValidationCache          │  │ GuardMetrics             │ │
//! │  └──────────────────────────┘  └──────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are two entry points with different guarantees:
//! - [`validate_url_sync`] inspects only the literal hostname. It never
//!   resolves names, so `internal.example.com` pointing at `10.0.0.5` passes.
//!   Use it for startup-time configuration checks.
//! - [`UrlGuard::validate`] resolves the hostname and re-checks the resolved
//!   address. This is the authoritative request-time gate.
//!
//! # Example
//!
//! ```rust,ignore
//! use cortex_ssrf_guard::{GuardConfig, SecurityMode, UrlGuard, validate_url_sync};
//!
//! // Startup check, no DNS.
//! assert!(!validate_url_sync("http://10.0.0.1/", Some(SecurityMode::Strict)).valid);
//!
//! // Request-time check.
//! let guard = UrlGuard::new(GuardConfig::default());
//! let result = guard.validate("https://hooks.example.com/notify").await;
//! if !result.valid {
//!     return Err(result.reason.unwrap_or_default());
//! }
//! ```

pub mod cache;
pub mod classifier;
pub mod config;
pub mod dns;
pub mod guard;
pub mod host;
pub mod policy;
pub mod redact;
pub mod state;

pub use cache::ValidationCache;
pub use classifier::{
    is_cloud_metadata, is_cloud_metadata_host, is_localhost, is_private_ipv4, is_reserved_ipv6,
};
pub use config::{GuardConfig, GuardConfigBuilder, SecurityMode};
pub use dns::{NameResolver, StaticResolver, SystemResolver};
pub use guard::OutboundGuard;
pub use host::normalize_hostname;
pub use policy::{BlockReason, UrlGuard, ValidationResult, validate_url_sync};
pub use redact::{redact_url, sanitize_headers};
pub use state::{GuardMetrics, MetricsSnapshot};

use thiserror::Error;

/// Errors raised by the surfaces around the guard.
///
/// Validation itself never fails with an error; see [`ValidationResult`].
#[derive(Debug, Error)]
pub enum GuardError {
    /// Unknown security mode string.
    #[error("Invalid security mode: {0} (expected strict, moderate or permissive)")]
    InvalidMode(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound request aborted by the guard. `url` has userinfo removed.
    #[error("SSRF protection blocked request to {url}: {reason}")]
    Blocked { url: String, reason: String },
}

pub type Result<T> = std::result::Result<T, GuardError>;
