//! Target specification parsing and expansion.
//!
//! Supports:
//! - Single IP addresses (IPv4 and IPv6)
//! - Hostnames (resolved to their first address)
//! - Dashed last-octet ranges (`192.168.1.10-20`)
//! - IPv4 CIDR blocks (`192.168.1.0/24`)
//!
//! Expansion is always truncated to [`MAX_HOSTS`] addresses.

use ipnetwork::Ipv4Network;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Upper bound on the number of hosts a single target may expand to.
pub const MAX_HOSTS: usize = 254;

/// Error type for target parsing and resolution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("invalid target format: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("malformed address range '{0}': {1}")]
    MalformedRange(String, &'static str),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IP addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// A parsed target expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A hostname to be resolved.
    Hostname(String),
    /// `a.b.c.start-end`, inclusive, within one /24.
    Range {
        base: [u8; 3],
        start: u8,
        end: u8,
    },
    /// An IPv4 network; host bits in the written address are ignored.
    Cidr(Ipv4Network),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    ///
    /// A `/` selects CIDR parsing and a `-` selects range parsing, so
    /// `"not-an-ip"` is rejected as a malformed range.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        if s.contains('/') {
            let network: Ipv4Network = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Cidr(network));
        }

        if s.contains('-') {
            return parse_range(s);
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(TargetError::InvalidFormat(s.to_string()))
    }

    /// Expand this specification into an ordered host list of at most
    /// [`MAX_HOSTS`] entries.
    ///
    /// Hostnames are resolved through DNS; every other form is expanded
    /// locally without I/O.
    pub async fn resolve(&self) -> Result<Vec<IpAddr>, TargetError> {
        match self {
            Self::Hostname(hostname) => resolve_hostname(hostname).await.map(|ip| vec![ip]),
            _ => Ok(self.expand_literal()),
        }
    }

    fn expand_literal(&self) -> Vec<IpAddr> {
        match self {
            Self::Single(ip) => vec![*ip],
            Self::Hostname(_) => Vec::new(),
            Self::Range { base, start, end } => (*start..=*end)
                .map(|octet| IpAddr::V4(Ipv4Addr::new(base[0], base[1], base[2], octet)))
                .take(MAX_HOSTS)
                .collect(),
            Self::Cidr(network) => {
                let (first, last) = usable_bounds(network);
                (first..=last)
                    .map(|raw| IpAddr::V4(Ipv4Addr::from(raw)))
                    .take(MAX_HOSTS)
                    .collect()
            }
        }
    }
}

/// First and last usable host of a network as raw integers.
///
/// /31 and /32 have no network or broadcast address to exclude.
fn usable_bounds(network: &Ipv4Network) -> (u32, u32) {
    let first = u32::from(network.network());
    let last = u32::from(network.broadcast());
    if network.prefix() >= 31 {
        (first, last)
    } else {
        (first + 1, last - 1)
    }
}

fn parse_range(s: &str) -> Result<TargetSpec, TargetError> {
    let malformed = |why| TargetError::MalformedRange(s.to_string(), why);

    let (start_ip, end) = s.split_once('-').ok_or_else(|| malformed("missing '-'"))?;
    let start_ip: Ipv4Addr = start_ip
        .trim()
        .parse()
        .map_err(|_| malformed("start is not an IPv4 address"))?;
    let end: u8 = end
        .trim()
        .parse()
        .map_err(|_| malformed("end is not an octet"))?;

    let [a, b, c, start] = start_ip.octets();
    if end < start {
        return Err(malformed("end precedes start"));
    }

    Ok(TargetSpec::Range {
        base: [a, b, c],
        start,
        end,
    })
}

async fn resolve_hostname(hostname: &str) -> Result<IpAddr, TargetError> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());

    let response = resolver
        .lookup_ip(hostname)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(hostname.to_string(), e.to_string()))?;

    response
        .iter()
        .next()
        .ok_or_else(|| TargetError::NoAddressesFound(hostname.to_string()))
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
            Self::Range { base, start, end } => {
                write!(f, "{}.{}.{}.{}-{}", base[0], base[1], base[2], start, end)
            }
            Self::Cidr(network) => write!(f, "{}", network),
        }
    }
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    // A dotted all-numeric string that failed IP parsing is a bad address,
    // not a hostname.
    if s.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        return false;
    }

    s.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_ascii_alphanumeric())
    })
}
