//! Validation policy engine.
//!
//! Two entry points share one decision table:
//!
//! - [`validate_url_sync`] looks at the literal hostname only. It is safe to
//!   call while loading configuration, but a public-looking name whose DNS
//!   record points at `10.0.0.5` passes it.
//! - [`UrlGuard::validate`] resolves the hostname and decides on the resolved
//!   address, which defeats DNS rebinding. This is the check to run right
//!   before an outbound request.

use std::net::{IpAddr, Ipv6Addr};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    Result,
    classifier::{
        is_cloud_metadata_host, is_cloud_metadata_ip, is_localhost, is_private_ipv4,
        is_reserved_ipv6, is_reserved_ipv6_addr, private_ipv4_range,
    },
    config::{GuardConfig, SecurityMode},
    dns::{NameResolver, SystemResolver, resolve_with_timeout},
    host::url_hostname,
};

/// Outcome of validating a URL.
///
/// `reason` is set if and only if `valid` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    /// An allowed destination.
    pub fn allowed() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    /// A blocked destination.
    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            valid: false,
            reason: Some(reason.to_string()),
        }
    }
}

impl From<BlockReason> for ValidationResult {
    fn from(reason: BlockReason) -> Self {
        Self::blocked(reason)
    }
}

/// Reason for blocking a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockReason {
    /// URL could not be parsed.
    MalformedUrl,

    /// Scheme is not http or https.
    DisallowedProtocol,

    /// Hostname is a cloud metadata endpoint.
    CloudMetadata,

    /// Hostname resolves to a cloud metadata endpoint.
    ResolvesToCloudMetadata,

    /// Localhost target in strict mode.
    LocalhostBlocked,

    /// Private IPv4 range.
    PrivateIpv4 { mode: SecurityMode },

    /// Private or reserved IPv6 range.
    PrivateIpv6,

    /// Name resolution failed or timed out.
    ResolutionFailed,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockReason::MalformedUrl => write!(f, "Invalid URL format"),
            BlockReason::DisallowedProtocol => {
                write!(f, "Invalid protocol. Only HTTP/HTTPS allowed.")
            }
            BlockReason::CloudMetadata => write!(f, "Cloud metadata endpoint blocked"),
            BlockReason::ResolvesToCloudMetadata => write!(
                f,
                "Cloud metadata endpoint blocked (hostname resolves to cloud metadata endpoint)"
            ),
            BlockReason::LocalhostBlocked => {
                write!(f, "Localhost access is blocked in strict mode")
            }
            BlockReason::PrivateIpv4 {
                mode: SecurityMode::Strict,
            } => write!(f, "Private IP addresses not allowed"),
            BlockReason::PrivateIpv4 { .. } => write!(
                f,
                "Private IP addresses not allowed (use permissive mode if needed)"
            ),
            BlockReason::PrivateIpv6 => write!(f, "IPv6 private address not allowed"),
            BlockReason::ResolutionFailed => write!(f, "DNS resolution failed"),
        }
    }
}

/// Result of applying the mode table to an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Allowed,
    /// Permissive mode skipped the localhost and private checks.
    PermissiveBypass,
    /// Moderate mode let a localhost target through.
    LocalhostAllowed,
    Blocked(BlockReason),
}

/// Apply the mode table to `addr`. Cloud metadata is checked by the caller.
fn decide(mode: SecurityMode, localhost: bool, addr: &str) -> Decision {
    if mode.allows_private() {
        return Decision::PermissiveBypass;
    }

    if localhost {
        return if mode.allows_localhost() {
            Decision::LocalhostAllowed
        } else {
            Decision::Blocked(BlockReason::LocalhostBlocked)
        };
    }

    if is_private_ipv4(addr) {
        return Decision::Blocked(BlockReason::PrivateIpv4 { mode });
    }

    let typed_reserved = addr
        .parse::<Ipv6Addr>()
        .map(|ip| is_reserved_ipv6_addr(&ip))
        .unwrap_or(false);
    if is_reserved_ipv6(addr) || typed_reserved {
        return Decision::Blocked(BlockReason::PrivateIpv6);
    }

    Decision::Allowed
}

/// Parse a URL, check its scheme and return the normalized hostname.
fn parse_target(url: &str) -> std::result::Result<String, BlockReason> {
    let parsed = Url::parse(url).map_err(|_| BlockReason::MalformedUrl)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(BlockReason::DisallowedProtocol);
    }

    url_hostname(&parsed).ok_or(BlockReason::MalformedUrl)
}

/// Validate a URL without resolving DNS.
///
/// Only the literal hostname is inspected, so a hostname that resolves to a
/// private address passes. Use [`UrlGuard::validate`] before the request
/// itself. `None` means strict mode.
pub fn validate_url_sync(url: &str, mode: Option<SecurityMode>) -> ValidationResult {
    let mode = mode.unwrap_or_default();

    let hostname = match parse_target(url) {
        Ok(hostname) => hostname,
        Err(reason) => return reason.into(),
    };

    if is_cloud_metadata_host(&hostname) {
        debug!(%hostname, %mode, "Cloud metadata endpoint rejected during startup check");
        return BlockReason::CloudMetadata.into();
    }

    match decide(mode, is_localhost(&hostname), &hostname) {
        Decision::Blocked(reason) => {
            debug!(%hostname, %mode, %reason, "URL rejected during startup check");
            reason.into()
        }
        Decision::Allowed | Decision::PermissiveBypass | Decision::LocalhostAllowed => {
            ValidationResult::allowed()
        }
    }
}

/// Request-time URL validator with DNS rebinding protection.
pub struct UrlGuard {
    config: GuardConfig,
    resolver: Arc<dyn NameResolver>,
}

impl UrlGuard {
    /// Create a guard using the system resolver.
    pub fn new(config: GuardConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver::new()))
    }

    /// Create a guard with a custom resolver.
    pub fn with_resolver(config: GuardConfig, resolver: Arc<dyn NameResolver>) -> Self {
        Self { config, resolver }
    }

    /// Create a guard configured from environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GuardConfig::from_env()?))
    }

    /// Get the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// DNS-free check using the configured startup mode.
    pub fn validate_sync(&self, url: &str) -> ValidationResult {
        validate_url_sync(url, Some(self.config.api_mode))
    }

    /// Resolving check using the configured request-time mode.
    pub async fn validate(&self, url: &str) -> ValidationResult {
        self.validate_with_mode(url, self.config.webhook_mode).await
    }

    /// Resolving check with an explicit mode.
    ///
    /// Exactly one name resolution is performed, bounded by the configured
    /// DNS timeout. Failure or timeout blocks the URL.
    pub async fn validate_with_mode(&self, url: &str, mode: SecurityMode) -> ValidationResult {
        let hostname = match parse_target(url) {
            Ok(hostname) => hostname,
            Err(reason) => {
                // URL is not logged: it may carry userinfo credentials
                warn!(%mode, %reason, "SSRF blocked: unusable URL");
                return reason.into();
            }
        };

        if is_cloud_metadata_host(&hostname) {
            warn!(%hostname, %mode, "SSRF blocked: cloud metadata endpoint");
            return BlockReason::CloudMetadata.into();
        }

        let resolved = match resolve_with_timeout(
            self.resolver.as_ref(),
            &hostname,
            self.config.dns_timeout(),
        )
        .await
        {
            Ok(ip) => ip,
            Err(e) => {
                warn!(%hostname, %mode, error = %e, "SSRF blocked: DNS resolution failed");
                return BlockReason::ResolutionFailed.into();
            }
        };
        let resolved_ip = canonical_ip(resolved);

        debug!(%hostname, %resolved_ip, %mode, "DNS resolved for SSRF check");

        if is_cloud_metadata_ip(resolved) {
            warn!(
                %hostname,
                %resolved_ip,
                %mode,
                "SSRF blocked: hostname resolves to cloud metadata endpoint"
            );
            return BlockReason::ResolvesToCloudMetadata.into();
        }

        let localhost = is_localhost(&hostname) || is_localhost(&resolved_ip);

        match decide(mode, localhost, &resolved_ip) {
            Decision::Allowed => {
                debug!(%hostname, %resolved_ip, %mode, "SSRF check passed");
                ValidationResult::allowed()
            }
            Decision::PermissiveBypass => {
                warn!(
                    %hostname,
                    %resolved_ip,
                    %mode,
                    "SSRF protection in permissive mode (localhost and private IPs allowed)"
                );
                ValidationResult::allowed()
            }
            Decision::LocalhostAllowed => {
                info!(%hostname, %resolved_ip, %mode, "Localhost target allowed (moderate mode)");
                ValidationResult::allowed()
            }
            Decision::Blocked(reason) => {
                let range = private_ipv4_range(&resolved_ip).unwrap_or("-");
                warn!(%hostname, %resolved_ip, %mode, %reason, range, "SSRF blocked");
                reason.into()
            }
        }
    }
}

impl std::fmt::Debug for UrlGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Textual form used for classification.
///
/// IPv4-mapped IPv6 addresses keep their `::ffff:` form so the reserved IPv6
/// rules still see them.
fn canonical_ip(ip: IpAddr) -> String {
    ip.to_string().to_lowercase()
}
