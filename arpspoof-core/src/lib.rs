//! arpspoof core library
//!
//! This crate provides the shared types, error handling and the frame
//! transport contract used by every other arpspoof crate.

pub mod error;
pub mod interface;
pub mod packet;
pub mod session;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use interface::LocalIdentity;
pub use packet::Packet;
pub use session::{AttackSession, SessionStats, SessionStatsCounters, SessionTarget};
pub use transport::{FrameFanout, FrameReceiver, FrameTransport};
pub use types::MacAddr;
