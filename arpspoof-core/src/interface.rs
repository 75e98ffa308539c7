//! Local interface identity

use crate::MacAddr;
use std::fmt;
use std::net::Ipv4Addr;

/// This host's addresses on the attack interface.
///
/// Looked up once at startup and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalIdentity {
    /// Hardware address of the interface
    pub mac: MacAddr,
    /// First IPv4 address assigned to the interface
    pub ip: Ipv4Addr,
}

impl LocalIdentity {
    pub fn new(mac: MacAddr, ip: Ipv4Addr) -> Self {
        Self { mac, ip }
    }
}

impl fmt::Display for LocalIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.ip, self.mac)
    }
}
