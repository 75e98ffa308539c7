//! Network interface enumeration and local identity lookup

use arpspoof_core::{Error, LocalIdentity, MacAddr, Result};
use pnet_datalink::{self, NetworkInterface};
use std::net::{IpAddr, Ipv4Addr};

/// Information about a network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "eth0", "wlan0")
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// MAC address if available
    pub mac: Option<MacAddr>,
    /// List of IP addresses assigned to this interface
    pub ips: Vec<IpAddr>,
    /// Whether the interface is up
    pub is_up: bool,
    /// Whether the interface is a loopback
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let mac = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]));

        let ips: Vec<IpAddr> = iface.ips.iter().map(|network| network.ip()).collect();

        InterfaceInfo {
            name: iface.name.clone(),
            description: iface.description.clone(),
            mac,
            ips,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl InterfaceInfo {
    /// Check if the interface can carry the attack (up, not loopback)
    pub fn is_capture_capable(&self) -> bool {
        self.is_up && !self.is_loopback
    }

    /// Get the primary IPv4 address if available
    pub fn primary_ipv4(&self) -> Option<Ipv4Addr> {
        self.ips.iter().find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
    }

    /// Hardware and IPv4 address of this interface
    pub fn identity(&self) -> Result<LocalIdentity> {
        let mac = self
            .mac
            .filter(|mac| !mac.is_zero())
            .ok_or_else(|| Error::Interface(format!("{} has no hardware address", self.name)))?;
        let ip = self
            .primary_ipv4()
            .ok_or_else(|| Error::Interface(format!("{} has no IPv4 address", self.name)))?;

        Ok(LocalIdentity::new(mac, ip))
    }
}

/// List all available network interfaces
pub fn list_interfaces() -> Result<Vec<InterfaceInfo>> {
    let interfaces = pnet_datalink::interfaces();

    if interfaces.is_empty() {
        return Err(Error::Capture(
            "No network interfaces found. Are you running with sufficient privileges?".to_string(),
        ));
    }

    Ok(interfaces.iter().map(InterfaceInfo::from).collect())
}

/// Get information about a specific interface by name
pub fn get_interface(name: &str) -> Result<InterfaceInfo> {
    find_network_interface(name).map(|iface| InterfaceInfo::from(&iface))
}

/// This host's hardware and IPv4 address on `name`
pub fn lookup_identity(name: &str) -> Result<LocalIdentity> {
    get_interface(name)?.identity()
}

pub(crate) fn find_network_interface(name: &str) -> Result<NetworkInterface> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}
