//! Address classification for SSRF protection.
//!
//! All checks take a normalized hostname or literal IP (see
//! [`normalize_hostname`](crate::host::normalize_hostname)) and are purely
//! textual. A malformed string matches nothing and is treated as public; the
//! URL parser and protocol check upstream reject what cannot be contacted.

use std::collections::HashSet;
use std::net::{IpAddr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;

/// Cloud metadata hosts and IPs. Blocked in every mode.
static CLOUD_METADATA: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "169.254.169.254",          // AWS / Azure
        "169.254.170.2",            // AWS ECS task metadata
        "metadata.google.internal", // GCP
        "metadata",                 // GCP short alias
        "100.100.100.200",          // Alibaba Cloud
        "192.0.0.192",              // Oracle Cloud
    ])
});

/// Localhost aliases.
static LOCALHOST_ALIASES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "localhost",
        "127.0.0.1",
        "::1",
        "0.0.0.0",
        "localhost.localdomain",
    ])
});

/// Private IPv4 ranges, in match order.
static PRIVATE_IPV4_RANGES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("10.0.0.0/8", r"^10\."),
        ("192.168.0.0/16", r"^192\.168\."),
        ("172.16.0.0/12", r"^172\.(1[6-9]|2[0-9]|3[0-1])\."),
        ("169.254.0.0/16", r"^169\.254\."),
        ("127.0.0.0/8", r"^127\."),
        ("0.0.0.0/8", r"^0\."),
    ]
    .into_iter()
    .map(|(name, pattern)| {
        let regex = Regex::new(pattern).expect("private IPv4 range pattern must compile");
        (name, regex)
    })
    .collect()
});

/// Reserved IPv6 prefixes (loopback and unspecified are exact matches).
const RESERVED_IPV6_PREFIXES: &[&str] = &[
    "fe80:",   // link-local
    "fc00:",   // unique local (fc00::/7)
    "fd00:",   // unique local (fd00::/8)
    "::ffff:", // IPv4-mapped
];

/// Check if an address is a cloud metadata endpoint.
pub fn is_cloud_metadata(addr: &str) -> bool {
    CLOUD_METADATA.contains(addr)
}

/// Check if a hostname or literal IP reaches a cloud metadata endpoint.
///
/// An IPv4-mapped IPv6 literal (`::ffff:a9fe:a9fe`) is checked by its IPv4
/// form as well, since a dual-stack socket connects to that address.
pub fn is_cloud_metadata_host(addr: &str) -> bool {
    is_cloud_metadata(addr)
        || addr
            .parse::<Ipv6Addr>()
            .ok()
            .and_then(|ip| ip.to_ipv4_mapped())
            .is_some_and(|v4| is_cloud_metadata(&v4.to_string()))
}

/// Check if a resolved address is a cloud metadata endpoint.
pub fn is_cloud_metadata_ip(ip: IpAddr) -> bool {
    is_cloud_metadata(&ip.to_string()) || is_cloud_metadata(&ip.to_canonical().to_string())
}

/// Check if an address is a localhost alias or in 127.0.0.0/8.
pub fn is_localhost(addr: &str) -> bool {
    LOCALHOST_ALIASES.contains(addr) || addr == "::1" || addr.starts_with("127.")
}

/// Check if an address textually falls in a private IPv4 range.
pub fn is_private_ipv4(addr: &str) -> bool {
    private_ipv4_range(addr).is_some()
}

/// Name of the private IPv4 range an address falls in, if any.
pub fn private_ipv4_range(addr: &str) -> Option<&'static str> {
    PRIVATE_IPV4_RANGES
        .iter()
        .find(|(_, regex)| regex.is_match(addr))
        .map(|(name, _)| *name)
}

/// Check if an address is a reserved IPv6 literal.
pub fn is_reserved_ipv6(addr: &str) -> bool {
    addr == "::1"
        || addr == "::"
        || RESERVED_IPV6_PREFIXES
            .iter()
            .any(|prefix| addr.starts_with(prefix))
}

/// Typed counterpart of [`is_reserved_ipv6`] for resolved addresses.
///
/// Covers the full fc00::/7 and fe80::/10 blocks, which the textual
/// prefixes only sample (`fd12::1` has no `fd00:` prefix).
pub fn is_reserved_ipv6_addr(ip: &Ipv6Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()                                      // ::1
        || ip.is_unspecified()                            // ::
        || (octets[0] & 0xfe) == 0xfc                     // fc00::/7
        || (octets[0] == 0xfe && (octets[1] & 0xc0) == 0x80) // fe80::/10
        || ip.to_ipv4_mapped().is_some() // ::ffff:0:0/96
}
