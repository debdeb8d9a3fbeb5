//! Result types and the probing seams of the engine.
//!
//! The engine never talks to the network directly: port probes go through a
//! [`PortProber`] and liveness checks through a [`Pinger`], which lets tests
//! drive the scheduler with in-process fakes.

use crate::error::ScanResult;
use crate::types::Port;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a single port probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortStatus {
    /// Connection established.
    Open,
    /// Refused, timed out, or otherwise unreachable.
    Closed,
    /// The probe itself failed unexpectedly.
    Error,
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of probing a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    /// The port number that was probed.
    pub port: Port,
    /// Status determined by the probe.
    pub status: PortStatus,
    /// Service name, set for open ports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    /// Failure description, set for error results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PortResult {
    /// An open port with its service name.
    pub fn open(port: Port, service: impl Into<String>) -> Self {
        Self {
            port,
            status: PortStatus::Open,
            service: Some(service.into()),
            error: None,
        }
    }

    /// A closed or unreachable port.
    pub fn closed(port: Port) -> Self {
        Self {
            port,
            status: PortStatus::Closed,
            service: None,
            error: None,
        }
    }

    /// A probe that failed for an unexpected reason.
    pub fn error(port: Port, error: impl Into<String>) -> Self {
        Self {
            port,
            status: PortStatus::Error,
            service: None,
            error: Some(error.into()),
        }
    }

    /// Check if the port is open.
    pub fn is_open(&self) -> bool {
        self.status == PortStatus::Open
    }
}

/// Liveness of a scanned host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostStatus {
    Up,
    Down,
    Error,
}

impl fmt::Display for HostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Result of scanning one host.
///
/// `ports` is non-empty only for hosts that are [`HostStatus::Up`]. It holds
/// open ports (and any probe errors) in the order the probes completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostResult {
    pub host: IpAddr,
    pub status: HostStatus,
    #[serde(default)]
    pub ports: Vec<PortResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl HostResult {
    /// A reachable host with the port results collected for it.
    pub fn up(host: IpAddr, ports: Vec<PortResult>) -> Self {
        Self {
            host,
            status: HostStatus::Up,
            ports,
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A host that did not answer the reachability probe.
    pub fn down(host: IpAddr) -> Self {
        Self {
            host,
            status: HostStatus::Down,
            ports: Vec::new(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// A host whose scan failed as a whole.
    pub fn error(host: IpAddr, error: impl Into<String>) -> Self {
        Self {
            host,
            status: HostStatus::Error,
            ports: Vec::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn is_up(&self) -> bool {
        self.status == HostStatus::Up
    }

    /// Open ports only.
    pub fn open_ports(&self) -> impl Iterator<Item = &PortResult> {
        self.ports.iter().filter(|p| p.is_open())
    }

    /// Sort `ports` by port number; completion order is otherwise arbitrary.
    pub fn sort_ports(&mut self) {
        self.ports.sort_by_key(|p| p.port);
    }
}

/// Attempts a single TCP connection.
///
/// Implementations classify every outcome into a [`PortResult`]; they do
/// not return errors.
#[async_trait]
pub trait PortProber: Send + Sync {
    async fn probe(&self, host: IpAddr, port: Port, timeout: Duration) -> PortResult;
}

/// Checks whether a host answers a liveness probe.
///
/// `Ok(false)` means no reply; `Err` means the probe could not be performed.
/// The host scanner treats both as a down host.
#[async_trait]
pub trait Pinger: Send + Sync {
    async fn is_alive(&self, host: IpAddr) -> ScanResult<bool>;
}

pub type SharedProber = Arc<dyn PortProber>;
pub type SharedPinger = Arc<dyn Pinger>;
