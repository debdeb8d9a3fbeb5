//! Batch scheduler: drives the host scanner over a resolved target.
//!
//! A run moves from `running` to exactly one of `completed`, `stopped` or
//! `error`. Hosts are scanned in fixed-size batches, strictly in list
//! order; hosts inside a batch run concurrently but their results are
//! persisted and announced in list order.

use crate::config::{PortPolicy, ScanProfile};
use crate::error::{ScanError, ScanResult};
use crate::events::{EventBus, ScanEvent};
use crate::scanner::host::{panic_message, HostScanner};
use crate::scanner::traits::HostResult;
use crate::storage::{RunStatus, SessionStore, SessionTotals};
use crate::types::{SessionId, TargetSpec};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::net::IpAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Hosts scanned concurrently per batch.
pub const BATCH_SIZE: usize = 10;

/// What to scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRequest {
    pub target: String,
    pub profile: ScanProfile,
    /// Explicit port list overriding the profile's port set.
    pub ports: Option<String>,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, profile: ScanProfile) -> Self {
        Self {
            target: target.into(),
            profile,
            ports: None,
        }
    }

    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = Some(ports.into());
        self
    }
}

/// Counters of one run. Owned and mutated only by the scheduler.
#[derive(Debug, Clone)]
pub struct ScanRun {
    pub session_id: SessionId,
    pub target: String,
    pub profile: ScanProfile,
    pub started_at: DateTime<Utc>,
    pub hosts_total: usize,
    pub hosts_scanned: usize,
    pub hosts_up: usize,
}

impl ScanRun {
    fn new(session_id: SessionId, request: &ScanRequest, hosts_total: usize) -> Self {
        Self {
            session_id,
            target: request.target.clone(),
            profile: request.profile,
            started_at: Utc::now(),
            hosts_total,
            hosts_scanned: 0,
            hosts_up: 0,
        }
    }

    fn record(&mut self, result: &HostResult) {
        debug_assert!(self.hosts_scanned < self.hosts_total);
        if result.is_up() {
            self.hosts_up += 1;
        }
        self.hosts_scanned += 1;
    }

    /// Share of hosts scanned, 0-100.
    pub fn progress_percent(&self) -> f64 {
        if self.hosts_total == 0 {
            return 100.0;
        }
        self.hosts_scanned as f64 / self.hosts_total as f64 * 100.0
    }

    fn totals(&self) -> SessionTotals {
        SessionTotals {
            total_hosts: self.hosts_total,
            hosts_up: self.hosts_up,
        }
    }

    fn summary(&self, status: RunStatus) -> RunSummary {
        RunSummary {
            session_id: self.session_id,
            status,
            hosts_total: self.hosts_total,
            hosts_scanned: self.hosts_scanned,
            hosts_up: self.hosts_up,
        }
    }
}

/// Final state of a run that ended in `completed` or `stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub session_id: SessionId,
    pub status: RunStatus,
    pub hosts_total: usize,
    pub hosts_scanned: usize,
    pub hosts_up: usize,
}

/// The scan engine.
#[derive(Clone)]
pub struct ScanEngine {
    scanner: HostScanner,
    store: Arc<dyn SessionStore>,
    events: EventBus,
}

impl ScanEngine {
    pub fn new(scanner: HostScanner, store: Arc<dyn SessionStore>, events: EventBus) -> Self {
        Self {
            scanner,
            store,
            events,
        }
    }

    /// Handle for subscribing to this engine's events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Execute one run.
    ///
    /// The target is resolved before anything else; a bad target emits
    /// `scan_error` and returns [`ScanError::InvalidTarget`] without creating
    /// a session. `cancel` is checked before each batch, before each port
    /// probe and before each host result is recorded.
    pub async fn run(
        &self,
        request: &ScanRequest,
        cancel: CancellationToken,
    ) -> ScanResult<RunSummary> {
        let hosts = match resolve(&request.target).await {
            Ok(hosts) => hosts,
            Err(e) => {
                warn!(target = %request.target, error = %e, "target rejected");
                self.publish_error(None, &e, 0, 0);
                return Err(e);
            }
        };

        let session_id = match self
            .store
            .create_session(&request.target, request.profile, request.ports.as_deref())
            .await
        {
            Ok(id) => id,
            Err(e) => {
                let e = ScanError::from(e);
                self.publish_error(None, &e, 0, 0);
                return Err(e);
            }
        };

        let policy = Arc::new(PortPolicy::select(request.profile, request.ports.as_deref()));
        let mut run = ScanRun::new(session_id, request, hosts.len());

        info!(
            session = %session_id,
            target = %request.target,
            profile = %request.profile,
            hosts = hosts.len(),
            ports = policy.port_count(),
            "scan started"
        );
        self.events.publish(ScanEvent::ScanStarted {
            session_id,
            target: request.target.clone(),
            total_hosts: hosts.len(),
        });

        match self.drive(&hosts, &policy, &mut run, &cancel).await {
            Ok(status) => {
                self.finish(&run, status).await;
                match status {
                    RunStatus::Stopped => self.events.publish(ScanEvent::ScanStopped {
                        session_id,
                        scanned: run.hosts_scanned,
                        hosts_up: run.hosts_up,
                    }),
                    _ => self.events.publish(ScanEvent::ScanCompleted {
                        session_id,
                        total_scanned: run.hosts_scanned,
                        hosts_up: run.hosts_up,
                    }),
                }
                Ok(run.summary(status))
            }
            Err(e) => Err(self.fail(&run, e).await),
        }
    }

    /// The batch loop. Returns the terminal status reached.
    async fn drive(
        &self,
        hosts: &[IpAddr],
        policy: &Arc<PortPolicy>,
        run: &mut ScanRun,
        cancel: &CancellationToken,
    ) -> ScanResult<RunStatus> {
        for batch in hosts.chunks(BATCH_SIZE) {
            if cancel.is_cancelled() {
                debug!(session = %run.session_id, "stop observed before batch");
                return Ok(RunStatus::Stopped);
            }

            let tasks = batch.iter().map(|&host| {
                let scanner = self.scanner.clone();
                let policy = Arc::clone(policy);
                let cancel = cancel.clone();
                let events = self.events.clone();
                tokio::spawn(async move { scanner.scan(host, &policy, &cancel, &events).await })
            });
            let joined = join_all(tasks).await;

            for (&host, outcome) in batch.iter().zip(joined) {
                let result = match outcome {
                    Ok(result) => result,
                    Err(e) if e.is_panic() => {
                        let reason = panic_message(e.into_panic().as_ref());
                        warn!(host = %host, error = %reason, "host scan panicked");
                        HostResult::error(host, reason)
                    }
                    Err(e) => return Err(ScanError::TaskAborted(e.to_string())),
                };

                if cancel.is_cancelled() {
                    debug!(session = %run.session_id, "stop observed mid-batch");
                    return Ok(RunStatus::Stopped);
                }

                if let Err(e) = self.store.save_result(&run.session_id, &result).await {
                    warn!(session = %run.session_id, host = %host, error = %e, "failed to persist host result");
                }

                run.record(&result);
                self.events.publish(ScanEvent::HostResult {
                    session_id: run.session_id,
                    result,
                    progress: run.progress_percent(),
                });
            }
        }

        Ok(RunStatus::Completed)
    }

    async fn finish(&self, run: &ScanRun, status: RunStatus) {
        info!(
            session = %run.session_id,
            status = %status,
            scanned = run.hosts_scanned,
            up = run.hosts_up,
            "scan finished"
        );
        if let Err(e) = self
            .store
            .update_session(&run.session_id, status, run.totals())
            .await
        {
            warn!(session = %run.session_id, error = %e, "failed to update session");
        }
    }

    /// Close a run that hit an unexpected error. The counts reached so far
    /// are kept on the session and reported with `scan_error`.
    async fn fail(&self, run: &ScanRun, error: ScanError) -> ScanError {
        warn!(session = %run.session_id, error = %error, "scan failed");
        self.finish(run, RunStatus::Error).await;
        self.publish_error(
            Some(run.session_id),
            &error,
            run.hosts_scanned,
            run.hosts_up,
        );
        error
    }

    fn publish_error(
        &self,
        session_id: Option<SessionId>,
        error: &ScanError,
        scanned: usize,
        hosts_up: usize,
    ) {
        self.events.publish(ScanEvent::ScanError {
            session_id,
            error: error.to_string(),
            scanned,
            hosts_up,
        });
    }
}

async fn resolve(target: &str) -> ScanResult<Vec<IpAddr>> {
    let spec = TargetSpec::parse(target)?;
    Ok(spec.resolve().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{SystemPinger, TcpConnectProber};
    use crate::storage::MemorySessionStore;

    fn request() -> ScanRequest {
        ScanRequest::new("10.0.0.0/30", ScanProfile::Quick)
    }

    fn up(host: &str) -> HostResult {
        HostResult::up(host.parse().unwrap(), Vec::new())
    }

    #[test]
    fn test_run_counters() {
        let mut run = ScanRun::new(SessionId::new(), &request(), 4);
        run.record(&up("10.0.0.1"));
        run.record(&HostResult::down("10.0.0.2".parse().unwrap()));

        assert_eq!(run.hosts_scanned, 2);
        assert_eq!(run.hosts_up, 1);
        assert!((run.progress_percent() - 50.0).abs() < f64::EPSILON);
        assert_eq!(
            run.totals(),
            SessionTotals {
                total_hosts: 4,
                hosts_up: 1
            }
        );
    }

    #[test]
    fn test_summary_carries_counts() {
        let mut run = ScanRun::new(SessionId::new(), &request(), 1);
        run.record(&up("10.0.0.1"));
        let summary = run.summary(RunStatus::Completed);
        assert_eq!(summary.hosts_total, 1);
        assert_eq!(summary.hosts_scanned, 1);
        assert_eq!(summary.hosts_up, 1);
        assert_eq!(summary.session_id, run.session_id);
    }

    #[test]
    fn test_request_builder() {
        let req = ScanRequest::new("10.0.0.5", ScanProfile::Full).with_ports("22,80");
        assert_eq!(req.ports.as_deref(), Some("22,80"));
        assert_eq!(req.profile, ScanProfile::Full);
    }

    #[tokio::test]
    async fn test_failed_run_keeps_partial_counts() {
        let store = Arc::new(MemorySessionStore::new());
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let engine = ScanEngine::new(
            HostScanner::new(Arc::new(TcpConnectProber), Arc::new(SystemPinger::default())),
            store.clone(),
            events,
        );

        let request = ScanRequest::new("10.0.0.1-5", ScanProfile::Quick);
        let id = store
            .create_session(&request.target, request.profile, None)
            .await
            .unwrap();
        let mut run = ScanRun::new(id, &request, 5);
        run.record(&up("10.0.0.1"));
        run.record(&HostResult::down("10.0.0.2".parse().unwrap()));
        run.record(&up("10.0.0.3"));

        let err = engine
            .fail(&run, ScanError::TaskAborted("cancelled".to_string()))
            .await;
        assert!(matches!(err, ScanError::TaskAborted(_)));

        match rx.try_recv().unwrap() {
            ScanEvent::ScanError {
                session_id,
                scanned,
                hosts_up,
                ..
            } => {
                assert_eq!(session_id, Some(id));
                assert_eq!((scanned, hosts_up), (3, 2));
            }
            other => panic!("unexpected {other:?}"),
        }

        let record = store.get(&id).unwrap();
        assert_eq!(record.status, RunStatus::Error);
        assert_eq!(record.total_hosts, 5);
        assert_eq!(record.hosts_up, 2);
        assert!(record.completed_at.is_some());
    }
}
