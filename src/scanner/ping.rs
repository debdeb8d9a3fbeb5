//! ICMP echo reachability probe via the system `ping` utility.
//!
//! Shelling out avoids the raw-socket privileges an in-process ICMP sender
//! would need.

use crate::error::{ScanError, ScanResult};
use crate::scanner::traits::Pinger;
use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Extra time granted to the child process beyond its own reply deadline.
const SPAWN_GRACE: Duration = Duration::from_secs(1);

/// Sends one echo request and waits up to `wait` for the reply.
#[derive(Debug, Clone)]
pub struct SystemPinger {
    wait: Duration,
}

impl SystemPinger {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }

    fn command(&self, host: IpAddr) -> Command {
        // Linux iputils dropped the separate ping6 binary; macOS still needs
        // it and its ping6 has no -W, so the spawn timeout bounds the wait.
        let legacy_v6 = host.is_ipv6() && cfg!(target_os = "macos");

        let mut cmd = Command::new(if legacy_v6 { "ping6" } else { "ping" });
        if host.is_ipv6() && !legacy_v6 {
            cmd.arg("-6");
        }
        cmd.arg("-c").arg("1");
        if !legacy_v6 {
            cmd.arg("-W").arg(wait_arg(self.wait));
        }
        cmd.arg(host.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for SystemPinger {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// `-W` is whole seconds on Linux and milliseconds on macOS.
fn wait_arg(wait: Duration) -> String {
    if cfg!(target_os = "macos") {
        wait.as_millis().max(1).to_string()
    } else {
        wait.as_secs().max(1).to_string()
    }
}

#[async_trait]
impl Pinger for SystemPinger {
    async fn is_alive(&self, host: IpAddr) -> ScanResult<bool> {
        let mut child = self.command(host).spawn()?;

        match timeout(self.wait + SPAWN_GRACE, child.wait()).await {
            Ok(status) => Ok(status?.success()),
            Err(_) => Err(ScanError::Probe(format!("ping {} did not exit in time", host))),
        }
    }
}
