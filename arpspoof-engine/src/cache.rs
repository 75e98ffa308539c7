//! IPv4 to hardware address cache
//!
//! Shared by every session of a run. Entries are never evicted.

use arpspoof_core::MacAddr;
use dashmap::DashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Concurrent address cache; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct AddressCache {
    entries: Arc<DashMap<Ipv4Addr, MacAddr>>,
}

impl AddressCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(&ip).map(|entry| *entry.value())
    }

    /// Record `ip` at `mac`. A different value for a known address replaces it.
    pub fn insert(&self, ip: Ipv4Addr, mac: MacAddr) {
        match self.entries.insert(ip, mac) {
            Some(previous) if previous != mac => {
                warn!(ip = %ip, old = %previous, new = %mac, "Cached hardware address changed");
            }
            Some(_) => {}
            None => debug!(ip = %ip, mac = %mac, "Cached hardware address"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
