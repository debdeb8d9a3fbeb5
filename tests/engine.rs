//! End-to-end runs of the scan engine against scripted probes.

use async_trait::async_trait;
use netsweep::config::ScanProfile;
use netsweep::error::{ScanResult, StorageError, StorageResult};
use netsweep::events::{EventBus, ScanEvent};
use netsweep::scanner::{
    HostResult, HostScanner, HostStatus, Pinger, PortProber, PortResult, PortStatus, ScanEngine,
    ScanRequest, TcpConnectProber, BATCH_SIZE,
};
use netsweep::services::service_or_unknown;
use netsweep::storage::{MemorySessionStore, RunStatus, SessionStore, SessionTotals};
use netsweep::types::{Port, SessionId};
use netsweep::ScanError;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

/// Answers for a fixed set of hosts and records every host it was asked about.
#[derive(Default)]
struct ScriptedPinger {
    alive: HashSet<IpAddr>,
    all_alive: bool,
    pinged: Mutex<Vec<IpAddr>>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    /// Fires the token on the n-th ping.
    cancel_on: Option<(usize, CancellationToken)>,
    /// Later octets answer sooner, so completion order inverts list order.
    staggered: bool,
    /// Panics when asked about this host.
    panic_on: Option<IpAddr>,
}

impl ScriptedPinger {
    fn alive(hosts: &[&str]) -> Self {
        Self {
            alive: hosts.iter().map(|h| h.parse().unwrap()).collect(),
            ..Self::default()
        }
    }

    fn everyone() -> Self {
        Self {
            all_alive: true,
            ..Self::default()
        }
    }

    fn pinged(&self) -> Vec<IpAddr> {
        self.pinged.lock().unwrap().clone()
    }
}

#[async_trait]
impl Pinger for ScriptedPinger {
    async fn is_alive(&self, host: IpAddr) -> ScanResult<bool> {
        let count = {
            let mut pinged = self.pinged.lock().unwrap();
            pinged.push(host);
            pinged.len()
        };
        if let Some((n, token)) = &self.cancel_on {
            if count == *n {
                token.cancel();
            }
        }
        if self.panic_on == Some(host) {
            panic!("boom");
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = match (self.staggered, host) {
            (true, IpAddr::V4(v4)) => 40u64.saturating_sub(u64::from(v4.octets()[3])),
            _ => 1,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(self.all_alive || self.alive.contains(&host))
    }
}

/// Opens the same ports on every host.
struct OpenPorts(HashSet<u16>);

impl OpenPorts {
    fn new(ports: &[u16]) -> Arc<Self> {
        Arc::new(Self(ports.iter().copied().collect()))
    }
}

#[async_trait]
impl PortProber for OpenPorts {
    async fn probe(&self, _host: IpAddr, port: Port, _timeout: Duration) -> PortResult {
        if self.0.contains(&port.as_u16()) {
            PortResult::open(port, service_or_unknown(port.as_u16()))
        } else {
            PortResult::closed(port)
        }
    }
}

/// Wraps the memory store with switchable failures.
#[derive(Default)]
struct FlakyStore {
    inner: MemorySessionStore,
    fail_create: bool,
    fail_save: bool,
    /// Fires the token once the n-th result has been saved.
    cancel_after_saves: Option<(usize, CancellationToken)>,
    saves: AtomicUsize,
    updates: AtomicUsize,
}

#[async_trait]
impl SessionStore for FlakyStore {
    async fn create_session(
        &self,
        target: &str,
        profile: ScanProfile,
        ports: Option<&str>,
    ) -> StorageResult<SessionId> {
        if self.fail_create {
            return Err(StorageError::SaveFailed("disk full".to_string()));
        }
        self.inner.create_session(target, profile, ports).await
    }

    async fn save_result(&self, id: &SessionId, result: &HostResult) -> StorageResult<()> {
        if self.fail_save {
            return Err(StorageError::SaveFailed("disk full".to_string()));
        }
        self.inner.save_result(id, result).await?;

        let saved = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, token)) = &self.cancel_after_saves {
            if saved == *n {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn update_session(
        &self,
        id: &SessionId,
        status: RunStatus,
        totals: SessionTotals,
    ) -> StorageResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_session(id, status, totals).await
    }
}

fn engine(
    prober: Arc<dyn PortProber>,
    pinger: Arc<dyn Pinger>,
    store: Arc<dyn SessionStore>,
) -> (ScanEngine, UnboundedReceiver<ScanEvent>) {
    let bus = EventBus::new();
    let rx = bus.subscribe();
    (ScanEngine::new(HostScanner::new(prober, pinger), store, bus), rx)
}

fn drain(rx: &mut UnboundedReceiver<ScanEvent>) -> Vec<ScanEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn kinds(events: &[ScanEvent]) -> Vec<&'static str> {
    events.iter().map(ScanEvent::kind).collect()
}

fn host_results(events: &[ScanEvent]) -> Vec<HostResult> {
    events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::HostResult { result, .. } => Some(result.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn single_live_host_reports_open_ports() {
    let store = Arc::new(MemorySessionStore::new());
    let (engine, mut rx) = engine(
        OpenPorts::new(&[22, 80]),
        Arc::new(ScriptedPinger::alive(&["10.0.0.5"])),
        store.clone(),
    );

    let summary = engine
        .run(&ScanRequest::new("10.0.0.5", ScanProfile::Quick), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!((summary.hosts_total, summary.hosts_scanned, summary.hosts_up), (1, 1, 1));

    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec!["scan_started", "host_result", "scan_completed"]);

    let mut result = host_results(&events).remove(0);
    result.sort_ports();
    assert_eq!(result.status, HostStatus::Up);
    assert_eq!(
        result.ports,
        vec![
            PortResult::open(Port::new(22).unwrap(), "ssh"),
            PortResult::open(Port::new(80).unwrap(), "http"),
        ]
    );

    match &events[2] {
        ScanEvent::ScanCompleted {
            total_scanned,
            hosts_up,
            ..
        } => assert_eq!((*total_scanned, *hosts_up), (1, 1)),
        other => panic!("unexpected {other:?}"),
    }

    let record = store.get(&summary.session_id).unwrap();
    assert_eq!(record.status, RunStatus::Completed);
    assert_eq!(record.total_hosts, 1);
    assert_eq!(record.results.len(), 1);
}

#[tokio::test]
async fn down_hosts_complete_with_nothing_up() {
    let prober = OpenPorts::new(&[22]);
    let (engine, mut rx) = engine(
        prober,
        Arc::new(ScriptedPinger::alive(&[])),
        Arc::new(MemorySessionStore::new()),
    );

    let summary = engine
        .run(&ScanRequest::new("10.0.0.0/30", ScanProfile::Quick), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    let events = drain(&mut rx);
    let results = host_results(&events);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.status == HostStatus::Down && r.ports.is_empty()));

    assert_eq!(
        events.last(),
        Some(&ScanEvent::ScanCompleted {
            session_id: summary.session_id,
            total_scanned: 2,
            hosts_up: 0,
        })
    );
}

#[tokio::test]
async fn invalid_target_emits_only_scan_error() {
    let store = Arc::new(MemorySessionStore::new());
    let pinger = Arc::new(ScriptedPinger::everyone());
    let (engine, mut rx) = engine(OpenPorts::new(&[]), pinger.clone(), store.clone());

    let err = engine
        .run(&ScanRequest::new("not-an-ip", ScanProfile::Quick), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::InvalidTarget(_)));
    let events = drain(&mut rx);
    assert_eq!(kinds(&events), vec!["scan_error"]);
    assert!(matches!(
        events[0],
        ScanEvent::ScanError {
            session_id: None,
            scanned: 0,
            hosts_up: 0,
            ..
        }
    ));
    assert!(store.sessions().is_empty());
    assert!(pinger.pinged().is_empty());
}

#[tokio::test]
async fn cancelled_before_start_stops_without_results() {
    let store = Arc::new(MemorySessionStore::new());
    let pinger = Arc::new(ScriptedPinger::everyone());
    let (engine, mut rx) = engine(OpenPorts::new(&[22]), pinger.clone(), store.clone());

    let cancel = CancellationToken::new();
    cancel.cancel();
    let summary = engine
        .run(&ScanRequest::new("10.0.0.1-20", ScanProfile::Quick), cancel)
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Stopped);
    assert_eq!(summary.hosts_scanned, 0);
    assert_eq!(kinds(&drain(&mut rx)), vec!["scan_started", "scan_stopped"]);
    assert!(pinger.pinged().is_empty());
    assert_eq!(
        store.get(&summary.session_id).map(|r| r.status),
        Some(RunStatus::Stopped)
    );
}

#[tokio::test]
async fn stop_during_first_batch_skips_the_rest() {
    let cancel = CancellationToken::new();
    let pinger = Arc::new(ScriptedPinger {
        cancel_on: Some((1, cancel.clone())),
        ..ScriptedPinger::default()
    });
    let (engine, mut rx) = engine(
        OpenPorts::new(&[]),
        pinger.clone(),
        Arc::new(MemorySessionStore::new()),
    );

    let summary = engine
        .run(&ScanRequest::new("10.0.0.1-25", ScanProfile::Quick), cancel)
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Stopped);
    assert_eq!(summary.hosts_total, 25);
    assert!(pinger.pinged().len() <= BATCH_SIZE);

    let events = drain(&mut rx);
    assert!(host_results(&events).is_empty());
    assert_eq!(
        events.last(),
        Some(&ScanEvent::ScanStopped {
            session_id: summary.session_id,
            scanned: 0,
            hosts_up: 0,
        })
    );
}

#[tokio::test]
async fn stop_between_batches_keeps_first_batch() {
    let cancel = CancellationToken::new();
    let store = Arc::new(FlakyStore {
        cancel_after_saves: Some((BATCH_SIZE, cancel.clone())),
        ..FlakyStore::default()
    });
    let pinger = Arc::new(ScriptedPinger::everyone());
    let (engine, mut rx) = engine(OpenPorts::new(&[]), pinger.clone(), store.clone());

    let summary = engine
        .run(&ScanRequest::new("10.0.0.1-25", ScanProfile::Quick).with_ports("22"), cancel)
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Stopped);
    assert_eq!((summary.hosts_scanned, summary.hosts_up), (BATCH_SIZE, BATCH_SIZE));
    assert_eq!(pinger.pinged().len(), BATCH_SIZE);

    let events = drain(&mut rx);
    let mut expected = vec!["scan_started"];
    expected.extend(std::iter::repeat("host_result").take(BATCH_SIZE));
    expected.push("scan_stopped");
    assert_eq!(kinds(&events), expected);
    assert_eq!(
        events.last(),
        Some(&ScanEvent::ScanStopped {
            session_id: summary.session_id,
            scanned: BATCH_SIZE,
            hosts_up: BATCH_SIZE,
        })
    );

    let record = store.inner.get(&summary.session_id).unwrap();
    assert_eq!(record.status, RunStatus::Stopped);
    assert_eq!(record.results.len(), BATCH_SIZE);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn panicking_host_is_reported_and_run_continues() {
    let pinger = Arc::new(ScriptedPinger {
        all_alive: true,
        panic_on: Some("10.0.0.2".parse().unwrap()),
        ..ScriptedPinger::default()
    });
    let store = Arc::new(MemorySessionStore::new());
    let (engine, mut rx) = engine(OpenPorts::new(&[22]), pinger, store.clone());

    let summary = engine
        .run(
            &ScanRequest::new("10.0.0.1-3", ScanProfile::Quick).with_ports("22"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!((summary.hosts_scanned, summary.hosts_up), (3, 2));

    let events = drain(&mut rx);
    let results = host_results(&events);
    let statuses: Vec<_> = results.iter().map(|r| r.status).collect();
    assert_eq!(statuses, vec![HostStatus::Up, HostStatus::Error, HostStatus::Up]);
    assert_eq!(results[1].host, "10.0.0.2".parse::<IpAddr>().unwrap());
    assert_eq!(results[1].error.as_deref(), Some("boom"));
    assert!(results[1].ports.is_empty());
    assert_eq!(kinds(&events).last(), Some(&"scan_completed"));

    let record = store.get(&summary.session_id).unwrap();
    assert_eq!(record.results.len(), 3);
    assert_eq!(record.results[1].status, HostStatus::Error);
}

#[tokio::test]
async fn results_follow_list_order_across_batches() {
    let store = Arc::new(MemorySessionStore::new());
    let pinger = Arc::new(ScriptedPinger {
        all_alive: true,
        staggered: true,
        ..ScriptedPinger::default()
    });
    let (engine, mut rx) = engine(
        OpenPorts::new(&[443]),
        pinger.clone(),
        store.clone(),
    );

    let summary = engine
        .run(
            &ScanRequest::new("10.0.0.1-25", ScanProfile::Quick).with_ports("443"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!((summary.hosts_scanned, summary.hosts_up), (25, 25));
    assert!(pinger.peak.load(Ordering::SeqCst) <= BATCH_SIZE);

    let expected: Vec<IpAddr> = (1..=25)
        .map(|n| format!("10.0.0.{n}").parse().unwrap())
        .collect();

    let events = drain(&mut rx);
    let announced: Vec<_> = host_results(&events).iter().map(|r| r.host).collect();
    assert_eq!(announced, expected);

    let progress: Vec<f64> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::HostResult { progress, .. } => Some(*progress),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] < w[1]));
    assert!((progress[24] - 100.0).abs() < 1e-9);

    let record = store.get(&summary.session_id).unwrap();
    let stored: Vec<_> = record.results.iter().map(|r| r.host).collect();
    assert_eq!(stored, expected);
    assert!(record.results.iter().all(|r| r.open_ports().count() == 1));
}

#[tokio::test]
async fn failed_session_creation_is_a_run_error() {
    let store = Arc::new(FlakyStore {
        fail_create: true,
        ..FlakyStore::default()
    });
    let pinger = Arc::new(ScriptedPinger::everyone());
    let (engine, mut rx) = engine(OpenPorts::new(&[]), pinger.clone(), store);

    let err = engine
        .run(&ScanRequest::new("10.0.0.5", ScanProfile::Quick), CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, ScanError::Storage(_)));
    assert_eq!(kinds(&drain(&mut rx)), vec!["scan_error"]);
    assert!(pinger.pinged().is_empty());
}

#[tokio::test]
async fn failed_result_writes_do_not_abort_the_run() {
    let store = Arc::new(FlakyStore {
        fail_save: true,
        ..FlakyStore::default()
    });
    let (engine, mut rx) = engine(
        OpenPorts::new(&[22]),
        Arc::new(ScriptedPinger::everyone()),
        store.clone(),
    );

    let summary = engine
        .run(
            &ScanRequest::new("10.0.0.1-3", ScanProfile::Quick).with_ports("22"),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.hosts_up, 3);
    assert_eq!(host_results(&drain(&mut rx)).len(), 3);
    assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn tcp_connect_finds_a_loopback_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    let (engine, mut rx) = engine(
        Arc::new(TcpConnectProber),
        Arc::new(ScriptedPinger::everyone()),
        Arc::new(MemorySessionStore::new()),
    );

    let summary = engine
        .run(
            &ScanRequest::new("127.0.0.1", ScanProfile::Quick).with_ports(port.to_string()),
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(summary.hosts_up, 1);
    let result = host_results(&drain(&mut rx)).remove(0);
    assert_eq!(result.ports.len(), 1);
    assert_eq!(result.ports[0].port.as_u16(), port);
    assert_eq!(result.ports[0].status, PortStatus::Open);
}
