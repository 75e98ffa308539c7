//! Session types and statistics

use crate::{Error, MacAddr, Result};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use uuid::Uuid;

/// One (sender, target) pair taken from the command line.
///
/// The sender is the victim whose ARP cache is poisoned; the target is the
/// host being impersonated towards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTarget {
    pub sender: Ipv4Addr,
    pub target: Ipv4Addr,
}

impl SessionTarget {
    pub fn new(sender: Ipv4Addr, target: Ipv4Addr) -> Self {
        Self { sender, target }
    }

    /// Group a flat `sender target sender target ...` list into pairs
    pub fn from_pairs(addresses: &[Ipv4Addr]) -> Result<Vec<Self>> {
        if addresses.is_empty() || addresses.len() % 2 != 0 {
            return Err(Error::invalid_parameter(
                "addresses".to_string(),
                format!(
                    "expected sender/target pairs, got {} address(es)",
                    addresses.len()
                ),
            ));
        }

        Ok(addresses
            .chunks_exact(2)
            .map(|pair| Self::new(pair[0], pair[1]))
            .collect())
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.sender, self.target)
    }
}

/// A fully resolved poisoning session.
///
/// Only constructed once both hardware addresses are known, so the
/// addresses can never change for the life of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackSession {
    /// Session identifier (UUID v7 for time-ordered tracking)
    pub id: Uuid,
    /// Victim address
    pub sender_ip: Ipv4Addr,
    /// Victim hardware address
    pub sender_mac: MacAddr,
    /// Impersonated address
    pub target_ip: Ipv4Addr,
    /// Real hardware address of the impersonated host
    pub target_mac: MacAddr,
}

impl AttackSession {
    pub fn new(id: Uuid, target: SessionTarget, sender_mac: MacAddr, target_mac: MacAddr) -> Self {
        Self {
            id,
            sender_ip: target.sender,
            sender_mac,
            target_ip: target.target,
            target_mac,
        }
    }
}

impl fmt::Display for AttackSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) -> {} ({})",
            self.sender_ip, self.sender_mac, self.target_ip, self.target_mac
        )
    }
}

/// Session statistics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Frames read from the transport while relaying
    pub frames_seen: u64,
    /// Frames too short to decode
    pub malformed_frames: u64,
    /// Forged replies injected (initial, triggered and periodic)
    pub spoofs_sent: u64,
    /// ARP requests that triggered a re-spoof
    pub respoofs: u64,
    /// IPv4 frames forwarded to the real target
    pub frames_relayed: u64,
    /// Failed injections
    pub send_errors: u64,
    /// When the session was launched
    pub started_at: Option<SystemTime>,
}

/// Thread-safe session statistics counters
#[derive(Debug, Default)]
pub struct SessionStatsCounters {
    pub frames_seen: AtomicU64,
    pub malformed_frames: AtomicU64,
    pub spoofs_sent: AtomicU64,
    pub respoofs: AtomicU64,
    pub frames_relayed: AtomicU64,
    pub send_errors: AtomicU64,
}

impl SessionStatsCounters {
    pub fn record_frame(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.malformed_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_spoof(&self) {
        self.spoofs_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_respoof(&self) {
        self.respoofs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_relayed(&self) {
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn to_stats(&self, started_at: SystemTime) -> SessionStats {
        SessionStats {
            frames_seen: self.frames_seen.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            spoofs_sent: self.spoofs_sent.load(Ordering::Relaxed),
            respoofs: self.respoofs.load(Ordering::Relaxed),
            frames_relayed: self.frames_relayed.load(Ordering::Relaxed),
            send_errors: self.send_errors.load(Ordering::Relaxed),
            started_at: Some(started_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs() {
        let addrs = [
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 3),
            Ipv4Addr::new(10, 0, 0, 1),
        ];
        let pairs = SessionTarget::from_pairs(&addrs).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].sender, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(pairs[1].sender, Ipv4Addr::new(10, 0, 0, 3));
        assert_eq!(pairs[1].target, Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn test_from_pairs_rejects_odd_count() {
        let addrs = [Ipv4Addr::new(10, 0, 0, 2)];
        assert!(matches!(
            SessionTarget::from_pairs(&addrs),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(SessionTarget::from_pairs(&[]).is_err());
    }

    #[test]
    fn test_counters_snapshot() {
        let counters = SessionStatsCounters::default();
        counters.record_spoof();
        counters.record_spoof();
        counters.record_relayed();
        counters.record_send_error();

        let stats = counters.to_stats(SystemTime::now());
        assert_eq!(stats.spoofs_sent, 2);
        assert_eq!(stats.frames_relayed, 1);
        assert_eq!(stats.send_errors, 1);
        assert_eq!(stats.frames_seen, 0);
    }
}
