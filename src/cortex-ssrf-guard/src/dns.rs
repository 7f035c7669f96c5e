//! Name resolution for the request-time check.
//!
//! The guard resolves a hostname exactly once per validation and checks the
//! address it gets back. Whatever the resolver returns is the address the
//! policy decides on; caching, retries and resolver selection belong to the
//! resolver itself.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;

/// Resolves a hostname to its primary address.
#[async_trait]
pub trait NameResolver: Send + Sync {
    /// Resolve `host` to the first address the platform returns.
    async fn resolve(&self, host: &str) -> io::Result<IpAddr>;
}

/// Resolver backed by the system resolver (`getaddrinfo` via tokio).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl SystemResolver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NameResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> io::Result<IpAddr> {
        // Literal IPs never hit the resolver
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let mut addrs = tokio::net::lookup_host((host, 0)).await?;
        addrs.next().map(|addr| addr.ip()).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses returned for {}", host),
            )
        })
    }
}

/// Resolver with a fixed host table.
///
/// Hosts missing from the table fail to resolve. Literal IPs resolve to
/// themselves, matching [`SystemResolver`].
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `host` to `ip`.
    pub fn with_entry(mut self, host: impl Into<String>, ip: IpAddr) -> Self {
        self.entries.insert(host.into().to_lowercase(), ip);
        self
    }
}

#[async_trait]
impl NameResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> io::Result<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        self.entries
            .get(&host.to_lowercase())
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("{} not found", host)))
    }
}

/// Resolve with an upper bound on the time spent.
///
/// An elapsed timeout is reported as an error, so callers treat it exactly
/// like a failed lookup.
pub async fn resolve_with_timeout(
    resolver: &dyn NameResolver,
    host: &str,
    timeout: Duration,
) -> io::Result<IpAddr> {
    tokio::time::timeout(timeout, resolver.resolve(host))
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("resolving {} timed out after {:?}", host, timeout),
            )
        })?
}
