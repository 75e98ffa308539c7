//! Ethernet II header parsing and construction

use arpspoof_core::{Error, MacAddr, Result};
use bytes::BufMut;
use std::fmt;

/// Ethernet header size (dst + src + type)
pub const ETHERNET_HEADER_LEN: usize = 14;

/// EtherType values the engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    Ipv4,
    /// ARP (0x0806)
    Arp,
    /// Anything else, kept verbatim
    Other(u16),
}

impl EtherType {
    /// Convert EtherType to u16 value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
            EtherType::Other(val) => val,
        }
    }

    /// Create EtherType from u16 value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::Ipv4,
            0x0806 => EtherType::Arp,
            val => EtherType::Other(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::Ipv4 => write!(f, "IPv4"),
            EtherType::Arp => write!(f, "ARP"),
            EtherType::Other(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType
    pub ethertype: EtherType,
}

impl EthernetHeader {
    pub fn new(destination: MacAddr, source: MacAddr, ethertype: EtherType) -> Self {
        Self {
            destination,
            source,
            ethertype,
        }
    }

    /// Parse the header at the start of a captured frame
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ETHERNET_HEADER_LEN {
            return Err(Error::malformed(ETHERNET_HEADER_LEN, data.len()));
        }

        let mut destination = [0u8; 6];
        destination.copy_from_slice(&data[0..6]);
        let mut source = [0u8; 6];
        source.copy_from_slice(&data[6..12]);
        let ethertype = u16::from_be_bytes([data[12], data[13]]);

        Ok(Self {
            destination: MacAddr(destination),
            source: MacAddr(source),
            ethertype: EtherType::from_u16(ethertype),
        })
    }

    /// Append the header in wire order
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(self.destination.as_bytes());
        buf.put_slice(self.source.as_bytes());
        buf.put_u16(self.ethertype.to_u16());
    }
}

/// Copy a captured frame with new source and destination hardware addresses.
///
/// Everything from the EtherType onwards is left untouched.
pub fn rewrite_addresses(frame: &[u8], source: MacAddr, destination: MacAddr) -> Result<Vec<u8>> {
    if frame.len() < ETHERNET_HEADER_LEN {
        return Err(Error::malformed(ETHERNET_HEADER_LEN, frame.len()));
    }

    let mut rewritten = frame.to_vec();
    rewritten[0..6].copy_from_slice(destination.as_bytes());
    rewritten[6..12].copy_from_slice(source.as_bytes());
    Ok(rewritten)
}
