//! TCP connect prober.
//!
//! Performs a full TCP handshake using the operating system's socket API.
//! No elevated privileges are needed.

use crate::scanner::traits::{PortProber, PortResult};
use crate::services::service_or_unknown;
use crate::types::Port;
use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// TCP connect prober.
///
/// The socket is owned by the connect future or the resulting stream, so it
/// is closed on every exit path: success, failure, timeout, or the probe
/// future being dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnectProber;

impl TcpConnectProber {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PortProber for TcpConnectProber {
    async fn probe(&self, host: IpAddr, port: Port, limit: Duration) -> PortResult {
        let addr = SocketAddr::new(host, port.as_u16());

        match timeout(limit, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                PortResult::open(port, service_or_unknown(port.as_u16()))
            }
            Ok(Err(e)) if is_local_exhaustion(&e) => PortResult::error(port, e.to_string()),
            Ok(Err(_)) | Err(_) => PortResult::closed(port),
        }
    }
}

/// Failures caused by the scanning machine rather than the target.
fn is_local_exhaustion(e: &io::Error) -> bool {
    if e.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }

    #[cfg(unix)]
    {
        matches!(
            e.raw_os_error(),
            Some(libc::EMFILE) | Some(libc::ENFILE) | Some(libc::ENOBUFS) | Some(libc::ENOMEM)
        )
    }
    #[cfg(not(unix))]
    {
        false
    }
}
