//! Guard configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::GuardError;

/// Environment variable selecting the startup (sync) check mode.
pub const API_SECURITY_MODE_ENV: &str = "API_SECURITY_MODE";

/// Environment variable selecting the request-time (async) check mode.
pub const WEBHOOK_SECURITY_MODE_ENV: &str = "WEBHOOK_SECURITY_MODE";

/// Environment variable overriding the DNS timeout in milliseconds.
pub const DNS_TIMEOUT_ENV: &str = "SSRF_DNS_TIMEOUT_MS";

/// Environment variable overriding the verdict cache TTL in seconds.
pub const CACHE_TTL_ENV: &str = "SSRF_CACHE_TTL_SECS";

/// Trust mode for outbound requests.
///
/// | Mode       | Cloud metadata | Localhost | Private IP |
/// |------------|----------------|-----------|------------|
/// | strict     | blocked        | blocked   | blocked    |
/// | moderate   | blocked        | allowed   | blocked    |
/// | permissive | blocked        | allowed   | allowed    |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Block localhost and private ranges.
    #[default]
    Strict,

    /// Allow localhost, block private ranges.
    Moderate,

    /// Allow everything except cloud metadata.
    Permissive,
}

impl SecurityMode {
    /// Whether localhost targets are allowed.
    pub fn allows_localhost(&self) -> bool {
        !matches!(self, SecurityMode::Strict)
    }

    /// Whether private ranges are allowed.
    pub fn allows_private(&self) -> bool {
        matches!(self, SecurityMode::Permissive)
    }
}

impl std::fmt::Display for SecurityMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecurityMode::Strict => write!(f, "strict"),
            SecurityMode::Moderate => write!(f, "moderate"),
            SecurityMode::Permissive => write!(f, "permissive"),
        }
    }
}

impl std::str::FromStr for SecurityMode {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(SecurityMode::Strict),
            "moderate" => Ok(SecurityMode::Moderate),
            "permissive" => Ok(SecurityMode::Permissive),
            _ => Err(GuardError::InvalidMode(s.to_string())),
        }
    }
}

/// Configuration for the outbound request guard.
///
/// The two modes are independent: a lenient startup check can be paired
/// with a strict request-time guard. The startup check defaults to
/// permissive, the request-time check to strict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Mode for the DNS-free startup check.
    #[serde(default = "default_api_mode")]
    pub api_mode: SecurityMode,

    /// Mode for the DNS-resolving request-time check.
    #[serde(default)]
    pub webhook_mode: SecurityMode,

    /// Upper bound on a single name resolution.
    #[serde(default = "default_dns_timeout_ms")]
    pub dns_timeout_ms: u64,

    /// Lifetime of a cached verdict.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached verdicts.
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

fn default_api_mode() -> SecurityMode {
    SecurityMode::Permissive
}

fn default_dns_timeout_ms() -> u64 {
    5_000
}

fn default_cache_ttl_secs() -> u64 {
    300 // 5 minutes
}

fn default_cache_max_entries() -> usize {
    256
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            api_mode: default_api_mode(),
            webhook_mode: SecurityMode::default(),
            dns_timeout_ms: default_dns_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

impl GuardConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for configuration.
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::new()
    }

    /// DNS timeout as a duration.
    pub fn dns_timeout(&self) -> Duration {
        Duration::from_millis(self.dns_timeout_ms)
    }

    /// Cache TTL as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load from environment variables.
    pub fn from_env() -> super::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    ///
    /// Unset keys keep their defaults. A set but unparseable value is an
    /// error rather than a silent fallback.
    pub fn from_lookup<F>(lookup: F) -> super::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(mode) = lookup(API_SECURITY_MODE_ENV) {
            config.api_mode = mode.parse()?;
        }

        if let Some(mode) = lookup(WEBHOOK_SECURITY_MODE_ENV) {
            config.webhook_mode = mode.parse()?;
        }

        if let Some(timeout) = lookup(DNS_TIMEOUT_ENV) {
            config.dns_timeout_ms = parse_number(DNS_TIMEOUT_ENV, &timeout)?;
        }

        if let Some(ttl) = lookup(CACHE_TTL_ENV) {
            config.cache_ttl_secs = parse_number(CACHE_TTL_ENV, &ttl)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the config for values that would disable the guard.
    pub fn validate(&self) -> super::Result<()> {
        if self.dns_timeout_ms == 0 {
            return Err(GuardError::Config(
                "dns_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(key: &str, value: &str) -> super::Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| GuardError::Config(format!("{} must be a number, got {:?}", key, value)))
}

/// Builder for GuardConfig.
#[derive(Debug, Default)]
pub struct GuardConfigBuilder {
    config: GuardConfig,
}

impl GuardConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: GuardConfig::new(),
        }
    }

    /// Set the startup check mode.
    pub fn api_mode(mut self, mode: SecurityMode) -> Self {
        self.config.api_mode = mode;
        self
    }

    /// Set the request-time check mode.
    pub fn webhook_mode(mut self, mode: SecurityMode) -> Self {
        self.config.webhook_mode = mode;
        self
    }

    /// Set the DNS timeout, rounded to whole milliseconds and at least 1 ms.
    pub fn dns_timeout(mut self, timeout: Duration) -> Self {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.config.dns_timeout_ms = millis.max(1);
        self
    }

    /// Set the cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl_secs = ttl.as_secs();
        self
    }

    /// Set the cache capacity.
    pub fn cache_max_entries(mut self, max: usize) -> Self {
        self.config.cache_max_entries = max;
        self
    }

    /// Build the config.
    pub fn build(self) -> GuardConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_security_mode_parse() {
        assert_eq!("strict".parse::<SecurityMode>().unwrap(), SecurityMode::Strict);
        assert_eq!("Moderate".parse::<SecurityMode>().unwrap(), SecurityMode::Moderate);
        assert_eq!(
            " PERMISSIVE ".parse::<SecurityMode>().unwrap(),
            SecurityMode::Permissive
        );
        assert!(matches!(
            "open".parse::<SecurityMode>(),
            Err(GuardError::InvalidMode(_))
        ));
    }

    #[test]
    fn test_security_mode_permissions() {
        assert!(!SecurityMode::Strict.allows_localhost());
        assert!(!SecurityMode::Strict.allows_private());
        assert!(SecurityMode::Moderate.allows_localhost());
        assert!(!SecurityMode::Moderate.allows_private());
        assert!(SecurityMode::Permissive.allows_localhost());
        assert!(SecurityMode::Permissive.allows_private());
    }

    #[test]
    fn test_default_modes() {
        let config = GuardConfig::default();
        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Strict);
        assert_eq!(config.dns_timeout(), Duration::from_secs(5));

        let config = GuardConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Strict);

        let config: GuardConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Strict);
    }

    #[test]
    fn test_builder_dns_timeout_clamped() {
        let config = GuardConfig::builder()
            .dns_timeout(Duration::from_micros(200))
            .build();
        assert_eq!(config.dns_timeout_ms, 1);
        assert!(config.validate().is_ok());

        let config = GuardConfig::builder().dns_timeout(Duration::MAX).build();
        assert_eq!(config.dns_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_from_lookup() {
        let config = GuardConfig::from_lookup(lookup_from(&[
            (API_SECURITY_MODE_ENV, "permissive"),
            (WEBHOOK_SECURITY_MODE_ENV, "moderate"),
            (DNS_TIMEOUT_ENV, "250"),
        ]))
        .unwrap();

        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Moderate);
        assert_eq!(config.dns_timeout_ms, 250);
        assert_eq!(config.cache_ttl_secs, 300);
    }

    #[test]
    fn test_from_lookup_rejects_unknown_mode() {
        let result = GuardConfig::from_lookup(lookup_from(&[(WEBHOOK_SECURITY_MODE_ENV, "off")]));
        assert!(matches!(result, Err(GuardError::InvalidMode(_))));
    }

    #[test]
    fn test_from_lookup_rejects_zero_timeout() {
        let result = GuardConfig::from_lookup(lookup_from(&[(DNS_TIMEOUT_ENV, "0")]));
        assert!(matches!(result, Err(GuardError::Config(_))));
    }

    #[test]
    fn test_config_builder() {
        let config = GuardConfig::builder()
            .api_mode(SecurityMode::Permissive)
            .webhook_mode(SecurityMode::Strict)
            .dns_timeout(Duration::from_millis(750))
            .cache_ttl(Duration::from_secs(30))
            .cache_max_entries(8)
            .build();

        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Strict);
        assert_eq!(config.dns_timeout_ms, 750);
        assert_eq!(config.cache_ttl_secs, 30);
        assert_eq!(config.cache_max_entries, 8);
    }

    #[test]
    fn test_config_deserialize() {
        let config: GuardConfig = toml::from_str(
            r#"
api_mode = "permissive"
webhook_mode = "moderate"
"#,
        )
        .unwrap();

        assert_eq!(config.api_mode, SecurityMode::Permissive);
        assert_eq!(config.webhook_mode, SecurityMode::Moderate);
        assert_eq!(config.dns_timeout_ms, 5_000);
        assert_eq!(config.cache_max_entries, 256);
    }
}
