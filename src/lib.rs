//! # netsweep - host discovery and TCP port sweeping
//!
//! netsweep expands a target expression into a bounded list of hosts,
//! checks each for reachability, and probes the live ones with TCP
//! connects under a per-profile timeout and concurrency bound. Runs are
//! observable through lifecycle events and cancellable at any point.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use netsweep::config::ScanProfile;
//! use netsweep::events::EventBus;
//! use netsweep::scanner::{HostScanner, ScanEngine, ScanRequest, SystemPinger, TcpConnectProber};
//! use netsweep::storage::MemorySessionStore;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let scanner = HostScanner::new(Arc::new(TcpConnectProber), Arc::new(SystemPinger::default()));
//!     let engine = ScanEngine::new(scanner, Arc::new(MemorySessionStore::new()), EventBus::new());
//!
//!     let request = ScanRequest::new("192.168.1.0/28", ScanProfile::Quick);
//!     let summary = engine.run(&request, CancellationToken::new()).await.unwrap();
//!
//!     println!("{} of {} hosts up", summary.hosts_up, summary.hosts_total);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Targets, ports and session IDs with newtype validation
//! - [`config`] - Scan profiles, the port policy they select, and settings
//! - [`scanner`] - Port prober, pinger, host scanner and batch scheduler
//! - [`events`] - Lifecycle events and their fan-out
//! - [`storage`] - Session and bookmark persistence
//! - [`interfaces`] - Local IPv4 networks available as targets
//! - [`output`] - Plain, JSON and CSV rendering
//! - [`cli`] - Command-line front end
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod interfaces;
pub mod output;
pub mod scanner;
pub mod services;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use events::{EventBus, ScanEvent};
pub use scanner::{HostResult, PortResult, ScanEngine, ScanRequest};
pub use types::{Port, PortSpec, SessionId, TargetSpec};
