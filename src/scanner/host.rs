//! Per-host scanning: reachability first, then bounded-concurrency port
//! probing.

use crate::config::PortPolicy;
use crate::events::{EventBus, ScanEvent};
use crate::scanner::traits::{
    HostResult, PortResult, PortStatus, SharedPinger, SharedProber,
};
use crate::types::Port;
use futures::future::{self, FutureExt};
use futures::stream::{self, StreamExt};
use std::any::Any;
use std::net::IpAddr;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Port sets larger than this report intra-host progress.
pub const PROGRESS_PORT_THRESHOLD: usize = 1000;

/// Progress is reported once per this many windows of `max_concurrency`
/// completed probes.
pub const PROGRESS_EVERY_WINDOWS: usize = 5;

/// Scans one host with a shared prober and pinger.
///
/// Cheap to clone; the batch scheduler hands a clone to every host task.
#[derive(Clone)]
pub struct HostScanner {
    prober: SharedProber,
    pinger: SharedPinger,
}

impl HostScanner {
    pub fn new(prober: SharedProber, pinger: SharedPinger) -> Self {
        Self { prober, pinger }
    }

    /// Scan `host` under `policy`.
    ///
    /// Down hosts are returned immediately with no ports. For live hosts at
    /// most `policy.max_concurrency` probes are in flight; once `cancel`
    /// fires no further probe starts and the ports found so far are
    /// returned with the host still marked up.
    pub async fn scan(
        &self,
        host: IpAddr,
        policy: &PortPolicy,
        cancel: &CancellationToken,
        events: &EventBus,
    ) -> HostResult {
        match self.pinger.is_alive(host).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(host = %host, "no echo reply");
                return HostResult::down(host);
            }
            Err(e) => {
                debug!(host = %host, error = %e, "reachability probe failed");
                return HostResult::down(host);
            }
        }

        let total = policy.port_count();
        let window = policy.max_concurrency.max(1);
        let progress_every = window * PROGRESS_EVERY_WINDOWS;
        let report_progress = total > PROGRESS_PORT_THRESHOLD;

        let mut probes = stream::iter(policy.ports.iter().copied())
            .take_while(|_| future::ready(!cancel.is_cancelled()))
            .map(|port| self.probe_isolated(host, port, policy.timeout))
            .buffer_unordered(window);

        let mut collected = Vec::new();
        let mut found = 0;
        let mut scanned = 0;

        while let Some(result) = probes.next().await {
            scanned += 1;
            match result.status {
                PortStatus::Open => {
                    found += 1;
                    collected.push(result);
                }
                PortStatus::Error => {
                    warn!(
                        host = %host,
                        port = %result.port,
                        error = result.error.as_deref().unwrap_or_default(),
                        "port probe failed"
                    );
                    collected.push(result);
                }
                PortStatus::Closed => {}
            }

            if report_progress && scanned % progress_every == 0 {
                events.publish(ScanEvent::PortProgress {
                    host,
                    scanned,
                    total,
                    found,
                });
            }
        }

        if scanned < total {
            debug!(host = %host, scanned, total, "port scan cut short by stop request");
        }

        HostResult::up(host, collected)
    }

    /// Run one probe, converting a panic into an error result for that
    /// port alone.
    async fn probe_isolated(&self, host: IpAddr, port: Port, limit: Duration) -> PortResult {
        let prober = Arc::clone(&self.prober);
        let attempt = async move { prober.probe(host, port, limit).await };

        match AssertUnwindSafe(attempt).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => PortResult::error(port, panic_message(payload.as_ref())),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}
