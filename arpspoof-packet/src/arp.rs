//! ARP frame structure and codec

use crate::ethernet::{EtherType, EthernetHeader, ETHERNET_HEADER_LEN};
use arpspoof_core::{Error, MacAddr, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::net::Ipv4Addr;

/// ARP header size for Ethernet/IPv4
pub const ARP_HEADER_LEN: usize = 28;

/// Ethernet header followed by an ARP header, no padding
pub const ARP_FRAME_LEN: usize = ETHERNET_HEADER_LEN + ARP_HEADER_LEN;

/// Hardware type for Ethernet
pub const ARP_HTYPE_ETHERNET: u16 = 1;

/// Protocol type for IPv4
pub const ARP_PTYPE_IPV4: u16 = 0x0800;

const MAC_LEN: u8 = 6;
const IPV4_LEN: u8 = 4;

/// ARP Operation Codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOperation {
    /// ARP Request (1)
    Request,
    /// ARP Reply (2)
    Reply,
    /// Any other opcode, kept verbatim
    Other(u16),
}

impl ArpOperation {
    pub fn to_u16(self) -> u16 {
        match self {
            ArpOperation::Request => 1,
            ArpOperation::Reply => 2,
            ArpOperation::Other(val) => val,
        }
    }

    pub fn from_u16(val: u16) -> Self {
        match val {
            1 => ArpOperation::Request,
            2 => ArpOperation::Reply,
            val => ArpOperation::Other(val),
        }
    }
}

/// ARP header (Ethernet hardware, IPv4 protocol addresses)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpHeader {
    /// Hardware type (1 for Ethernet)
    pub htype: u16,
    /// Protocol type (0x0800 for IPv4)
    pub ptype: u16,
    /// Hardware address length
    pub hlen: u8,
    /// Protocol address length
    pub plen: u8,
    /// Operation
    pub operation: ArpOperation,
    /// Sender hardware address
    pub sender_hw_addr: MacAddr,
    /// Sender protocol address
    pub sender_proto_addr: Ipv4Addr,
    /// Target hardware address
    pub target_hw_addr: MacAddr,
    /// Target protocol address
    pub target_proto_addr: Ipv4Addr,
}

impl ArpHeader {
    fn ethernet_ipv4(
        operation: ArpOperation,
        sender_hw_addr: MacAddr,
        sender_proto_addr: Ipv4Addr,
        target_hw_addr: MacAddr,
        target_proto_addr: Ipv4Addr,
    ) -> Self {
        Self {
            htype: ARP_HTYPE_ETHERNET,
            ptype: ARP_PTYPE_IPV4,
            hlen: MAC_LEN,
            plen: IPV4_LEN,
            operation,
            sender_hw_addr,
            sender_proto_addr,
            target_hw_addr,
            target_proto_addr,
        }
    }

    /// Parse an ARP header from the bytes following the Ethernet header
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_HEADER_LEN {
            return Err(Error::malformed(ARP_HEADER_LEN, data.len()));
        }

        let htype = u16::from_be_bytes([data[0], data[1]]);
        let ptype = u16::from_be_bytes([data[2], data[3]]);
        let hlen = data[4];
        let plen = data[5];
        let operation = ArpOperation::from_u16(u16::from_be_bytes([data[6], data[7]]));

        let mut sender_hw_addr = [0u8; 6];
        sender_hw_addr.copy_from_slice(&data[8..14]);
        let sender_proto_addr = Ipv4Addr::new(data[14], data[15], data[16], data[17]);

        let mut target_hw_addr = [0u8; 6];
        target_hw_addr.copy_from_slice(&data[18..24]);
        let target_proto_addr = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

        Ok(Self {
            htype,
            ptype,
            hlen,
            plen,
            operation,
            sender_hw_addr: MacAddr(sender_hw_addr),
            sender_proto_addr,
            target_hw_addr: MacAddr(target_hw_addr),
            target_proto_addr,
        })
    }

    /// Append the header in wire order
    pub fn write<B: BufMut>(&self, buf: &mut B) {
        buf.put_u16(self.htype);
        buf.put_u16(self.ptype);
        buf.put_u8(self.hlen);
        buf.put_u8(self.plen);
        buf.put_u16(self.operation.to_u16());
        buf.put_slice(self.sender_hw_addr.as_bytes());
        buf.put_slice(&self.sender_proto_addr.octets());
        buf.put_slice(self.target_hw_addr.as_bytes());
        buf.put_slice(&self.target_proto_addr.octets());
    }

    pub fn is_request(&self) -> bool {
        self.operation == ArpOperation::Request
    }
}

/// Complete Ethernet + ARP frame (42 bytes on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpFrame {
    pub ethernet: EthernetHeader,
    pub arp: ArpHeader,
}

impl ArpFrame {
    /// Broadcast request asking who owns `target_ip`
    pub fn request(local_mac: MacAddr, local_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        Self {
            ethernet: EthernetHeader::new(MacAddr::BROADCAST, local_mac, EtherType::Arp),
            arp: ArpHeader::ethernet_ipv4(
                ArpOperation::Request,
                local_mac,
                local_ip,
                MacAddr::ZERO,
                target_ip,
            ),
        }
    }

    /// Unicast reply claiming `sender_ip` is at `sender_mac`
    pub fn reply(
        eth_source: MacAddr,
        eth_destination: MacAddr,
        sender_mac: MacAddr,
        sender_ip: Ipv4Addr,
        target_mac: MacAddr,
        target_ip: Ipv4Addr,
    ) -> Self {
        Self {
            ethernet: EthernetHeader::new(eth_destination, eth_source, EtherType::Arp),
            arp: ArpHeader::ethernet_ipv4(
                ArpOperation::Reply,
                sender_mac,
                sender_ip,
                target_mac,
                target_ip,
            ),
        }
    }

    /// Decode the first 42 bytes of a captured buffer.
    ///
    /// Trailing bytes (minimum-size padding added by the link) are ignored.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < ARP_FRAME_LEN {
            return Err(Error::malformed(ARP_FRAME_LEN, data.len()));
        }

        Ok(Self {
            ethernet: EthernetHeader::parse(&data[..ETHERNET_HEADER_LEN])?,
            arp: ArpHeader::parse(&data[ETHERNET_HEADER_LEN..ARP_FRAME_LEN])?,
        })
    }

    /// Encode to exactly [`ARP_FRAME_LEN`] bytes
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(ARP_FRAME_LEN);
        self.ethernet.write(&mut buf);
        self.arp.write(&mut buf);
        buf.freeze()
    }

    /// The Ethernet header announces an ARP payload
    pub fn is_arp(&self) -> bool {
        self.ethernet.ethertype == EtherType::Arp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOCAL_MAC: MacAddr = MacAddr([0x11, 0x11, 0x11, 0x11, 0x11, 0x11]);

    #[test]
    fn test_request_layout() {
        let frame = ArpFrame::request(
            LOCAL_MAC,
            Ipv4Addr::new(10, 0, 0, 5),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let bytes = frame.encode();

        assert_eq!(bytes.len(), ARP_FRAME_LEN);
        assert_eq!(&bytes[0..6], &[0xff; 6]);
        assert_eq!(&bytes[6..12], LOCAL_MAC.as_bytes());
        assert_eq!(&bytes[12..14], &[0x08, 0x06]);
        assert_eq!(&bytes[14..16], &[0x00, 0x01]); // hrd
        assert_eq!(&bytes[16..18], &[0x08, 0x00]); // pro
        assert_eq!(bytes[18], 6);
        assert_eq!(bytes[19], 4);
        assert_eq!(&bytes[20..22], &[0x00, 0x01]); // op request
        assert_eq!(&bytes[22..28], LOCAL_MAC.as_bytes());
        assert_eq!(&bytes[28..32], &[10, 0, 0, 5]);
        assert_eq!(&bytes[32..38], &[0u8; 6]);
        assert_eq!(&bytes[38..42], &[10, 0, 0, 2]);
    }

    #[test]
    fn test_reply_creation() {
        let frame = ArpFrame::reply(
            LOCAL_MAC,
            MacAddr([0x22; 6]),
            LOCAL_MAC,
            Ipv4Addr::new(10, 0, 0, 1),
            MacAddr([0x22; 6]),
            Ipv4Addr::new(10, 0, 0, 2),
        );

        assert_eq!(frame.arp.operation, ArpOperation::Reply);
        assert!(!frame.arp.is_request());
        assert!(frame.is_arp());
        assert_eq!(frame.ethernet.destination, MacAddr([0x22; 6]));
        assert_eq!(&frame.encode()[20..22], &[0x00, 0x02]);
    }

    #[test]
    fn test_decode_preserves_every_byte() {
        // Unknown opcodes, foreign EtherTypes and odd header values survive decode/encode
        let opcodes = [0x0001u16, 0x0002, 0x0003, 0xffff];
        let ethertypes = [0x0806u16, 0x0800, 0x1234, 0x86dd];

        for seed in 0u8..8 {
            for (k, &opcode) in opcodes.iter().enumerate() {
                let ethertype = ethertypes[(k + seed as usize) % ethertypes.len()];
                let mut raw = [0u8; ARP_FRAME_LEN];
                for (i, b) in raw.iter_mut().enumerate() {
                    *b = (i as u8).wrapping_mul(seed.wrapping_mul(2).wrapping_add(37)).wrapping_add(seed);
                }
                raw[12..14].copy_from_slice(&ethertype.to_be_bytes());
                raw[20..22].copy_from_slice(&opcode.to_be_bytes());

                let frame = ArpFrame::decode(&raw).unwrap();
                assert_eq!(
                    &frame.encode()[..],
                    &raw[..],
                    "seed {} opcode {:#06x} ethertype {:#06x}",
                    seed,
                    opcode,
                    ethertype
                );
            }
        }
    }

    #[test]
    fn test_decode_ignores_padding() {
        let frame = ArpFrame::request(
            LOCAL_MAC,
            Ipv4Addr::new(10, 0, 0, 5),
            Ipv4Addr::new(10, 0, 0, 1),
        );
        let mut padded = frame.encode().to_vec();
        padded.resize(60, 0);

        assert_eq!(ArpFrame::decode(&padded).unwrap(), frame);
    }

    #[test]
    fn test_decode_short_buffer() {
        let result = ArpFrame::decode(&[0u8; ARP_FRAME_LEN - 1]);
        assert!(matches!(
            result,
            Err(Error::MalformedFrame {
                expected: ARP_FRAME_LEN,
                actual: 41
            })
        ));

        assert!(ArpHeader::parse(&[0u8; 27]).is_err());
    }

    #[test]
    fn test_decode_fields() {
        let bytes = ArpFrame::reply(
            MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            LOCAL_MAC,
            MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]),
            Ipv4Addr::new(192, 168, 0, 2),
            LOCAL_MAC,
            Ipv4Addr::new(192, 168, 0, 5),
        )
        .encode();

        let frame = ArpFrame::decode(&bytes).unwrap();
        assert_eq!(frame.arp.operation, ArpOperation::Reply);
        assert_eq!(frame.arp.sender_proto_addr, Ipv4Addr::new(192, 168, 0, 2));
        assert_eq!(
            frame.arp.sender_hw_addr,
            MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF])
        );
        assert_eq!(frame.arp.htype, ARP_HTYPE_ETHERNET);
        assert_eq!(frame.arp.ptype, ARP_PTYPE_IPV4);
    }
}
