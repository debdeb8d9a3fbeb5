//! Scanner module - the scan engine.
//!
//! Layered leaves first: a [`PortProber`] attempts one TCP connect, a
//! [`Pinger`] answers whether a host is reachable, the [`HostScanner`]
//! drives both over one host, and the [`ScanEngine`] schedules hosts in
//! batches and emits lifecycle events.

mod host;
mod ping;
mod scheduler;
mod tcp;
mod traits;

pub use host::{HostScanner, PROGRESS_EVERY_WINDOWS, PROGRESS_PORT_THRESHOLD};
pub use ping::SystemPinger;
pub use scheduler::{RunSummary, ScanEngine, ScanRequest, ScanRun, BATCH_SIZE};
pub use tcp::TcpConnectProber;
pub use traits::{
    HostResult, HostStatus, Pinger, PortProber, PortResult, PortStatus, SharedPinger,
    SharedProber,
};
