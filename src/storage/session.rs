//! Session records and the store contract the engine writes through.

use crate::config::ScanProfile;
use crate::error::StorageResult;
use crate::scanner::{HostResult, HostStatus};
use crate::types::SessionId;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;

/// Lifecycle state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Stopped,
    Error,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Running)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Stopped => write!(f, "stopped"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Counters written on a terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_hosts: usize,
    pub hosts_up: usize,
}

/// Persistence contract consumed by the scan engine.
///
/// The engine calls `create_session` once per run, `save_result` once per
/// recorded host, and `update_session` once on the terminal transition.
/// Failures of the latter two are logged by the engine and never abort a run.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(
        &self,
        target: &str,
        profile: ScanProfile,
        ports: Option<&str>,
    ) -> StorageResult<SessionId>;

    async fn save_result(&self, id: &SessionId, result: &HostResult) -> StorageResult<()>;

    async fn update_session(
        &self,
        id: &SessionId,
        status: RunStatus,
        totals: SessionTotals,
    ) -> StorageResult<()>;
}

/// A persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub target: String,
    pub profile: ScanProfile,
    #[serde(default)]
    pub ports: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub total_hosts: usize,
    #[serde(default)]
    pub hosts_up: usize,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: Vec<HostResult>,
}

impl SessionRecord {
    /// A fresh record in the `running` state.
    pub fn new(target: impl Into<String>, profile: ScanProfile, ports: Option<&str>) -> Self {
        Self {
            id: SessionId::new(),
            target: target.into(),
            profile,
            ports: ports.map(str::to_string),
            status: RunStatus::Running,
            total_hosts: 0,
            hosts_up: 0,
            created_at: Utc::now(),
            completed_at: None,
            results: Vec::new(),
        }
    }

    /// Apply a status transition; terminal states stamp `completed_at`.
    pub fn apply_update(&mut self, status: RunStatus, totals: SessionTotals) {
        self.status = status;
        self.total_hosts = totals.total_hosts;
        self.hosts_up = totals.hosts_up;
        self.completed_at = status.is_terminal().then(Utc::now);
    }

    /// Number of host results recorded.
    pub fn hosts_scanned(&self) -> usize {
        self.results.len()
    }

    /// Open ports across every host.
    pub fn open_port_count(&self) -> usize {
        self.results.iter().map(|r| r.open_ports().count()).sum()
    }

    /// One-line description for listings.
    pub fn summary(&self) -> String {
        format!(
            "{} [{}] {} - {}/{} hosts up, {} open ports",
            self.target,
            self.profile,
            self.status,
            self.hosts_up,
            self.total_hosts,
            self.open_port_count()
        )
    }
}

/// A host found by [`search_records`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostMatch {
    pub host: IpAddr,
    pub status: HostStatus,
    pub scanned_at: DateTime<Utc>,
    pub session_id: SessionId,
    pub target: String,
    pub profile: ScanProfile,
}

/// Aggregate figures over stored sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStatistics {
    pub total_sessions: usize,
    /// Distinct hosts with at least one result.
    pub total_hosts: usize,
    /// Distinct hosts seen up at least once.
    pub hosts_up: usize,
    /// Sessions created in the last 7 days.
    pub recent_sessions: usize,
    /// Most frequently open ports, most common first.
    pub top_ports: Vec<PortCount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortCount {
    pub port: u16,
    pub count: usize,
}

/// Window counted by [`StoreStatistics::recent_sessions`].
pub const RECENT_WINDOW_DAYS: i64 = 7;

/// Number of entries in [`StoreStatistics::top_ports`].
pub const TOP_PORTS: usize = 10;

/// Prefix hosts are grouped by in a network map, IPv4 and IPv6.
pub const MAP_PREFIX_V4: u8 = 24;
pub const MAP_PREFIX_V6: u8 = 64;

/// One session's hosts grouped by enclosing network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkMap {
    pub session_id: SessionId,
    pub target: String,
    pub created_at: DateTime<Utc>,
    /// Networks in order of first appearance in the host list.
    pub networks: Vec<NetworkSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub network: IpNetwork,
    pub hosts: usize,
    pub active_hosts: usize,
}

/// Host results whose address contains `query`, newest first.
pub fn search_records(records: &[SessionRecord], query: &str, limit: usize) -> Vec<HostMatch> {
    let mut matches: Vec<HostMatch> = records
        .iter()
        .flat_map(|record| {
            record
                .results
                .iter()
                .filter(move |r| r.host.to_string().contains(query))
                .map(move |r| HostMatch {
                    host: r.host,
                    status: r.status,
                    scanned_at: r.timestamp,
                    session_id: record.id,
                    target: record.target.clone(),
                    profile: record.profile,
                })
        })
        .collect();

    matches.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
    matches.truncate(limit);
    matches
}

/// Compute [`StoreStatistics`] relative to `now`.
pub fn statistics(records: &[SessionRecord], now: DateTime<Utc>) -> StoreStatistics {
    let cutoff = now - Duration::days(RECENT_WINDOW_DAYS);

    let mut hosts = HashSet::new();
    let mut hosts_up = HashSet::new();
    let mut port_counts: HashMap<u16, usize> = HashMap::new();

    for result in records.iter().flat_map(|r| r.results.iter()) {
        hosts.insert(result.host);
        if result.is_up() {
            hosts_up.insert(result.host);
        }
        for port in result.open_ports() {
            *port_counts.entry(port.port.as_u16()).or_default() += 1;
        }
    }

    let mut top_ports: Vec<PortCount> = port_counts
        .into_iter()
        .map(|(port, count)| PortCount { port, count })
        .collect();
    top_ports.sort_by(|a, b| b.count.cmp(&a.count).then(a.port.cmp(&b.port)));
    top_ports.truncate(TOP_PORTS);

    StoreStatistics {
        total_sessions: records.len(),
        total_hosts: hosts.len(),
        hosts_up: hosts_up.len(),
        recent_sessions: records.iter().filter(|r| r.created_at >= cutoff).count(),
        top_ports,
    }
}

/// Group a session's host results into /24 (IPv4) or /64 (IPv6) networks.
pub fn network_map(record: &SessionRecord) -> NetworkMap {
    let mut networks: Vec<NetworkSummary> = Vec::new();

    for result in &record.results {
        let Some(network) = enclosing_network(result.host) else {
            continue;
        };
        let index = match networks.iter().position(|n| n.network == network) {
            Some(index) => index,
            None => {
                networks.push(NetworkSummary {
                    network,
                    hosts: 0,
                    active_hosts: 0,
                });
                networks.len() - 1
            }
        };

        let entry = &mut networks[index];
        entry.hosts += 1;
        if result.is_up() {
            entry.active_hosts += 1;
        }
    }

    NetworkMap {
        session_id: record.id,
        target: record.target.clone(),
        created_at: record.created_at,
        networks,
    }
}

/// The newest session that ran to completion.
pub fn latest_completed(records: &[SessionRecord]) -> Option<&SessionRecord> {
    records
        .iter()
        .filter(|r| r.status == RunStatus::Completed)
        .max_by_key(|r| r.created_at)
}

fn enclosing_network(host: IpAddr) -> Option<IpNetwork> {
    let prefix = match host {
        IpAddr::V4(_) => MAP_PREFIX_V4,
        IpAddr::V6(_) => MAP_PREFIX_V6,
    };
    let network = IpNetwork::new(host, prefix).ok()?.network();
    IpNetwork::new(network, prefix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::PortResult;
    use crate::types::Port;

    fn host_up(host: &str, open: &[u16]) -> HostResult {
        HostResult::up(
            host.parse().unwrap(),
            open.iter()
                .map(|&p| PortResult::open(Port::new(p).unwrap(), "svc"))
                .collect(),
        )
    }

    #[test]
    fn test_apply_update_stamps_completion() {
        let mut record = SessionRecord::new("10.0.0.0/30", ScanProfile::Quick, None);
        assert!(record.completed_at.is_none());

        record.apply_update(
            RunStatus::Completed,
            SessionTotals {
                total_hosts: 2,
                hosts_up: 1,
            },
        );

        assert_eq!(record.status, RunStatus::Completed);
        assert_eq!(record.total_hosts, 2);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn test_search_records() {
        let mut first = SessionRecord::new("10.0.0.0/24", ScanProfile::Quick, None);
        first.results.push(host_up("10.0.0.5", &[22]));
        first.results.push(HostResult::down("10.0.0.6".parse().unwrap()));
        let mut second = SessionRecord::new("192.168.1.5", ScanProfile::Full, None);
        second.results.push(host_up("192.168.1.5", &[]));

        let records = vec![first, second];
        let found = search_records(&records, "10.0.0.", 10);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|m| m.target == "10.0.0.0/24"));

        assert_eq!(search_records(&records, "10.0.0.", 1).len(), 1);
        assert!(search_records(&records, "172.", 10).is_empty());
    }

    #[test]
    fn test_statistics() {
        let mut first = SessionRecord::new("a", ScanProfile::Quick, None);
        first.results.push(host_up("10.0.0.5", &[22, 80]));
        first.results.push(HostResult::down("10.0.0.6".parse().unwrap()));
        let mut second = SessionRecord::new("b", ScanProfile::Quick, None);
        second.results.push(host_up("10.0.0.5", &[80]));
        second.created_at = Utc::now() - Duration::days(30);

        let stats = statistics(&[first, second], Utc::now());
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_hosts, 2);
        assert_eq!(stats.hosts_up, 1);
        assert_eq!(stats.recent_sessions, 1);
        assert_eq!(
            stats.top_ports,
            vec![PortCount { port: 80, count: 2 }, PortCount { port: 22, count: 1 }]
        );
    }

    #[test]
    fn test_network_map_groups_by_slash_24() {
        let mut record = SessionRecord::new("10.0.0.0/23", ScanProfile::Quick, None);
        record.results.push(host_up("10.0.0.5", &[22]));
        record.results.push(HostResult::down("10.0.1.9".parse().unwrap()));
        record.results.push(HostResult::down("10.0.0.6".parse().unwrap()));
        record.results.push(host_up("10.0.1.10", &[]));
        record.results.push(host_up("10.0.0.7", &[]));

        let map = network_map(&record);
        assert_eq!(map.session_id, record.id);
        assert_eq!(
            map.networks,
            vec![
                NetworkSummary {
                    network: "10.0.0.0/24".parse().unwrap(),
                    hosts: 3,
                    active_hosts: 2,
                },
                NetworkSummary {
                    network: "10.0.1.0/24".parse().unwrap(),
                    hosts: 2,
                    active_hosts: 1,
                },
            ]
        );
    }

    #[test]
    fn test_network_map_ipv6_and_empty() {
        let mut record = SessionRecord::new("example.com", ScanProfile::Quick, None);
        assert!(network_map(&record).networks.is_empty());

        record.results.push(host_up("2001:db8::1", &[443]));
        let map = network_map(&record);
        assert_eq!(map.networks.len(), 1);
        assert_eq!(map.networks[0].network.to_string(), "2001:db8::/64");
        assert_eq!(map.networks[0].active_hosts, 1);
    }

    #[test]
    fn test_latest_completed_skips_other_states() {
        let mut old = SessionRecord::new("old", ScanProfile::Quick, None);
        old.status = RunStatus::Completed;
        old.created_at = Utc::now() - Duration::hours(2);
        let mut newer = SessionRecord::new("newer", ScanProfile::Quick, None);
        newer.status = RunStatus::Completed;
        newer.created_at = Utc::now() - Duration::hours(1);
        let mut stopped = SessionRecord::new("stopped", ScanProfile::Quick, None);
        stopped.status = RunStatus::Stopped;

        let records = vec![old, stopped, newer];
        assert_eq!(latest_completed(&records).map(|r| r.target.as_str()), Some("newer"));
        assert!(latest_completed(&records[1..2]).is_none());
    }
}
