//! Resolution, poisoning and relay engine for arpspoof
//!
//! This crate drives ARP cache poisoning sessions over any
//! [`FrameTransport`](arpspoof_core::FrameTransport). It includes:
//!
//! - `AddressResolver`: ARP request/reply resolution with a shared `AddressCache`
//! - `SpoofController`: forged replies, and genuine ones to undo them
//! - `RelayEngine`: the per-session state machine and frame relay
//! - `SessionManager`: one tokio task per (sender, target) pair
//!
//! # Example
//!
//! ```no_run
//! use arpspoof_core::{FrameTransport, LocalIdentity, SessionTarget};
//! use arpspoof_engine::{AddressCache, EngineConfig, RelayEngine, SessionManager};
//! use std::sync::Arc;
//!
//! # async fn run(transport: Arc<dyn FrameTransport>, local: LocalIdentity) {
//! let engine = RelayEngine::new(transport, local, AddressCache::new(), EngineConfig::default());
//! let manager = SessionManager::new(engine);
//!
//! let target = SessionTarget::new("10.0.0.2".parse().unwrap(), "10.0.0.1".parse().unwrap());
//! manager.launch(target).unwrap();
//!
//! tokio::signal::ctrl_c().await.unwrap();
//! for outcome in manager.stop_all().await {
//!     println!("{}: {:?}", outcome.target, outcome.result);
//! }
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod context;
pub mod executor;
pub mod manager;
pub mod relay;
pub mod resolver;
pub mod spoof;

#[cfg(test)]
mod testing;

pub use cache::AddressCache;
pub use config::EngineConfig;
pub use context::{RelayState, SessionContext};
pub use executor::{SessionExecutor, SessionHandle};
pub use manager::{SessionInfo, SessionManager, SessionOutcome};
pub use relay::{classify, FrameAction, RelayEngine};
pub use resolver::AddressResolver;
pub use spoof::SpoofController;
