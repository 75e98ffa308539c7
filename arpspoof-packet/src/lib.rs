//! Ethernet and ARP frame codec for arpspoof
//!
//! Every frame the engine forges has the same fixed layout: an Ethernet II
//! header immediately followed by an Ethernet/IPv4 ARP header, 42 bytes in
//! total, all multi-byte fields big-endian.
//!
//! ## ARP Packet Format
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Hardware Type (HTYPE)    |       Protocol Type (PTYPE)   |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  HW Addr Len  |Proto Addr Len |         Operation (OPER)      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Sender Hardware Address (SHA)               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       SHA (cont.)             |  Sender Protocol Address (SPA)|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       SPA (cont.)             |  Target Hardware Address (THA)|
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        THA (cont.)                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   Target Protocol Address (TPA)               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::net::Ipv4Addr;
//! use arpspoof_core::MacAddr;
//! use arpspoof_packet::{ArpFrame, ARP_FRAME_LEN};
//!
//! let local = MacAddr::new([0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
//! let request = ArpFrame::request(
//!     local,
//!     Ipv4Addr::new(192, 168, 0, 5),
//!     Ipv4Addr::new(192, 168, 0, 1),
//! );
//!
//! let bytes = request.encode();
//! assert_eq!(bytes.len(), ARP_FRAME_LEN);
//! assert_eq!(ArpFrame::decode(&bytes).unwrap(), request);
//! ```

pub mod arp;
pub mod ethernet;

pub use arp::{
    ArpFrame, ArpHeader, ArpOperation, ARP_FRAME_LEN, ARP_HEADER_LEN, ARP_HTYPE_ETHERNET,
    ARP_PTYPE_IPV4,
};
pub use ethernet::{rewrite_addresses, EtherType, EthernetHeader, ETHERNET_HEADER_LEN};
