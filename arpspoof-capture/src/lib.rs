//! Live frame transport for arpspoof
//!
//! This crate binds the engine's [`FrameTransport`](arpspoof_core::FrameTransport)
//! contract to a real interface: pcap for capture, a pnet datalink channel
//! for injection.
//!
//! ## Features
//!
//! - **Interface Management**: List interfaces and look up the local MAC/IPv4 identity
//! - **BPF Filters**: Filters that keep only ARP and IPv4 frames not sent by this host
//! - **Statistics**: Capture and injection counters
//! - **Shared Capture**: Any number of subscribers read from one capture handle
//!
//! ## Example
//!
//! ```no_run
//! use arpspoof_capture::{CaptureConfig, PcapTransport};
//! use arpspoof_core::FrameTransport;
//!
//! # async fn run() -> arpspoof_core::Result<()> {
//! let transport = PcapTransport::open("eth0", CaptureConfig::default())?;
//! let mut frames = transport.subscribe();
//!
//! let packet = frames.recv().await?;
//! println!("Got frame: {} bytes", packet.len());
//!
//! transport.close();
//! # Ok(())
//! # }
//! ```

pub mod capture;
pub mod filters;
pub mod interface;
pub mod stats;

// Re-export main types
pub use capture::{CaptureConfig, PcapTransport};
pub use interface::{get_interface, list_interfaces, lookup_identity, InterfaceInfo};
pub use stats::{CaptureStats, StatsAccumulator};
