//! Scan profiles and the port policy they select.
//!
//! A profile fixes the port set probed on each live host, the per-connection
//! timeout and the maximum number of probes in flight:
//!
//! | profile   | ports     | timeout | concurrency |
//! |-----------|-----------|---------|-------------|
//! | `quick`   | 1-1024    | 800 ms  | 30          |
//! | `full`    | 1-65535   | 300 ms  | 100         |
//! | `range`   | 1-10000   | 500 ms  | 50          |
//! | `default` | 1-1024    | 800 ms  | 30          |

use crate::types::{Port, PortRange, PortSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Named bundle of port set, timeout and concurrency defaults.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ScanProfile {
    /// Well-known ports 1-1024
    #[default]
    Quick,
    /// Every TCP port, with a short timeout
    Full,
    /// Ports 1-10000
    Range,
    /// Fallback policy, same as quick
    Default,
}

impl ScanProfile {
    /// Highest port of the profile's contiguous port set.
    pub const fn last_port(self) -> u16 {
        match self {
            Self::Quick | Self::Default => 1024,
            Self::Full => 65535,
            Self::Range => 10000,
        }
    }

    /// Per-connection timeout.
    pub const fn timeout(self) -> Duration {
        match self {
            Self::Quick | Self::Default => Duration::from_millis(800),
            Self::Full => Duration::from_millis(300),
            Self::Range => Duration::from_millis(500),
        }
    }

    /// Maximum port probes in flight for one host.
    pub const fn max_concurrency(self) -> usize {
        match self {
            Self::Quick | Self::Default => 30,
            Self::Full => 100,
            Self::Range => 50,
        }
    }

    /// Every built-in profile.
    pub const fn all() -> [ScanProfile; 4] {
        [Self::Quick, Self::Full, Self::Range, Self::Default]
    }
}

impl fmt::Display for ScanProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quick => write!(f, "quick"),
            Self::Full => write!(f, "full"),
            Self::Range => write!(f, "range"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl FromStr for ScanProfile {
    type Err = std::convert::Infallible;

    /// Unrecognised names select [`ScanProfile::Default`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "quick" => Self::Quick,
            "full" => Self::Full,
            "range" => Self::Range,
            _ => Self::Default,
        })
    }
}

/// The effective probing policy for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPolicy {
    /// Ports probed on every live host, ascending.
    pub ports: Vec<Port>,
    /// Bound on each connect attempt.
    pub timeout: Duration,
    /// Bound on concurrent probes per host.
    pub max_concurrency: usize,
}

impl PortPolicy {
    /// Derive the policy for a profile and an optional explicit port list.
    ///
    /// An explicit list that yields at least one port replaces the profile's
    /// port set; timeout and concurrency always come from the profile.
    pub fn select(profile: ScanProfile, explicit_ports: Option<&str>) -> Self {
        let explicit = explicit_ports
            .map(PortSpec::parse_lenient)
            .map(|spec| spec.to_ports())
            .filter(|ports| !ports.is_empty());

        let ports = explicit
            .unwrap_or_else(|| PortRange::up_to(profile.last_port()).iter().collect());

        Self {
            ports,
            timeout: profile.timeout(),
            max_concurrency: profile.max_concurrency(),
        }
    }

    /// Number of ports probed per live host.
    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}
