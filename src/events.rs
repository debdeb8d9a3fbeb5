//! Lifecycle events and their fan-out to listeners.
//!
//! Every listener owns an independent unbounded channel. Publishing never
//! blocks and never fails: a listener whose receiver has been dropped is
//! pruned on the next publish.

use crate::scanner::HostResult;
use crate::types::SessionId;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// An event emitted by the scan engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    ScanStarted {
        session_id: SessionId,
        target: String,
        total_hosts: usize,
    },
    /// Best-effort intra-host progress for large port sets.
    PortProgress {
        host: IpAddr,
        scanned: usize,
        total: usize,
        found: usize,
    },
    HostResult {
        session_id: SessionId,
        result: HostResult,
        progress: f64,
    },
    ScanStopped {
        session_id: SessionId,
        scanned: usize,
        hosts_up: usize,
    },
    ScanCompleted {
        session_id: SessionId,
        total_scanned: usize,
        hosts_up: usize,
    },
    ScanError {
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<SessionId>,
        error: String,
        scanned: usize,
        hosts_up: usize,
    },
}

impl ScanEvent {
    /// Wire name of the event, as in the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ScanStarted { .. } => "scan_started",
            Self::PortProgress { .. } => "port_progress",
            Self::HostResult { .. } => "host_result",
            Self::ScanStopped { .. } => "scan_stopped",
            Self::ScanCompleted { .. } => "scan_completed",
            Self::ScanError { .. } => "scan_error",
        }
    }

    /// Whether this event ends a run.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ScanStopped { .. } | Self::ScanCompleted { .. } | Self::ScanError { .. }
        )
    }
}

/// Publish/subscribe hub for [`ScanEvent`]s.
///
/// Cloning yields another handle onto the same subscriber set.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<UnboundedSender<ScanEvent>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> UnboundedReceiver<ScanEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Deliver `event` to every live listener.
    pub fn publish(&self, event: ScanEvent) {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());

        let pruned = before - subscribers.len();
        if pruned > 0 {
            tracing::debug!(pruned, event = event.kind(), "dropped closed event listeners");
        }
    }

    /// Number of registered listeners.
    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UnboundedSender<ScanEvent>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
