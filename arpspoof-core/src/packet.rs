//! Packet types

use bytes::Bytes;
use std::time::SystemTime;

/// A captured frame
#[derive(Debug, Clone)]
pub struct Packet {
    /// When the frame was captured
    pub timestamp: SystemTime,
    /// Interface the frame was received on
    pub interface: String,
    /// Frame data (including the Ethernet header)
    pub data: Bytes,
    /// Length on the wire (may differ from data.len() if truncated by the snaplen)
    pub wire_len: usize,
}

impl Packet {
    /// Create a new packet
    pub fn new(interface: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let wire_len = data.len();
        Self {
            timestamp: SystemTime::now(),
            interface: interface.into(),
            data,
            wire_len,
        }
    }

    /// Get packet data as slice
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Get captured length
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if packet is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when the capture kept fewer bytes than were on the wire
    pub fn is_truncated(&self) -> bool {
        self.data.len() < self.wire_len
    }
}
