//! Local network interfaces.
//!
//! Lists the IPv4 networks this machine sits on so one can be picked as a
//! scan target.

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::{IpNetwork, Ipv4Network};
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::debug;

/// One IPv4 address assigned to a local interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalInterface {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// Enclosing network in CIDR form, usable directly as a target.
    pub network: String,
}

impl LocalInterface {
    fn new(name: &str, net: Ipv4Network) -> Self {
        Self {
            name: name.to_string(),
            address: net.ip(),
            netmask: net.mask(),
            network: format!("{}/{}", net.network(), net.prefix()),
        }
    }
}

/// Every non-loopback IPv4 address on the machine, in interface order.
pub fn list_interfaces() -> Vec<LocalInterface> {
    let interfaces = datalink::interfaces();
    debug!(count = interfaces.len(), "enumerated network interfaces");

    interfaces
        .iter()
        .filter(|iface| !iface.is_loopback())
        .flat_map(|iface: &NetworkInterface| ipv4_entries(&iface.name, &iface.ips))
        .collect()
}

fn ipv4_entries(name: &str, ips: &[IpNetwork]) -> Vec<LocalInterface> {
    ips.iter()
        .filter_map(|ip| match ip {
            IpNetwork::V4(net) if !net.ip().is_loopback() => Some(LocalInterface::new(name, *net)),
            _ => None,
        })
        .collect()
}
