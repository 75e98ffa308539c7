//! Engine configuration

use std::time::Duration;

/// Default wait for an ARP reply per resolution attempt
pub const DEFAULT_RESOLVE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Default number of ARP requests sent before giving up on an address
pub const DEFAULT_RESOLVE_ATTEMPTS: u32 = 3;

/// Default delay between an observed ARP request and the re-spoof.
///
/// The genuine reply is usually on the wire by then, so ours lands last.
pub const DEFAULT_RESPOOF_DELAY: Duration = Duration::from_millis(300);

/// Default upper bound on how long a session waits before checking for cancellation
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default number of genuine replies sent when a session restores its victim
pub const DEFAULT_RESTORE_COUNT: u32 = 3;

/// Tunables shared by every session of an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Wait for a reply per resolution attempt
    pub resolve_timeout: Duration,
    /// Requests sent before resolution fails
    pub resolve_attempts: u32,
    /// Delay before answering an observed ARP request with a forged reply
    pub respoof_delay: Duration,
    /// Re-send the forged reply this often; `None` disables the refresh
    pub refresh_interval: Option<Duration>,
    /// Longest uninterrupted wait before the running flag is checked again
    pub poll_interval: Duration,
    /// Send genuine replies when a session stops
    pub restore_on_exit: bool,
    /// Genuine replies sent per restore
    pub restore_count: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolve_timeout: DEFAULT_RESOLVE_TIMEOUT,
            resolve_attempts: DEFAULT_RESOLVE_ATTEMPTS,
            respoof_delay: DEFAULT_RESPOOF_DELAY,
            refresh_interval: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            restore_on_exit: true,
            restore_count: DEFAULT_RESTORE_COUNT,
        }
    }
}

impl EngineConfig {
    pub fn with_resolve_timeout(mut self, timeout: Duration) -> Self {
        self.resolve_timeout = timeout;
        self
    }

    pub fn with_resolve_attempts(mut self, attempts: u32) -> Self {
        self.resolve_attempts = attempts.max(1);
        self
    }

    pub fn with_respoof_delay(mut self, delay: Duration) -> Self {
        self.respoof_delay = delay;
        self
    }

    /// A zero interval disables the refresh
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = if interval.is_zero() {
            None
        } else {
            Some(interval)
        };
        self
    }

    pub fn with_restore(mut self, restore_on_exit: bool) -> Self {
        self.restore_on_exit = restore_on_exit;
        self
    }
}
