//! Per-session runtime state
//!
//! A [`SessionContext`] is shared between the task driving a session and
//! the manager that launched it. The manager only ever flips the running
//! flag and reads counters; the task owns every state transition.

use arpspoof_core::{SessionStats, SessionStatsCounters, SessionTarget};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::sleep;
use uuid::Uuid;

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Waiting for both hardware addresses
    Resolving,
    /// First forged reply sent
    Spoofed,
    /// Forwarding the victim's traffic
    Relaying,
    /// Cancelled, failed, or transport closed
    Stopped,
}

impl fmt::Display for RelayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelayState::Resolving => "resolving",
            RelayState::Spoofed => "spoofed",
            RelayState::Relaying => "relaying",
            RelayState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Session identifier (UUID v7 for time-ordered tracking)
    pub id: Uuid,
    /// Addresses this session works on
    pub target: SessionTarget,
    /// Running flag (session should stop when this is false)
    pub running: Arc<AtomicBool>,
    /// Statistics counters
    pub stats: Arc<SessionStatsCounters>,
    /// When the session was created
    pub started_at: SystemTime,
    state: Arc<RwLock<RelayState>>,
    /// Set once the driving task has ended, however it ended
    finished: Arc<AtomicBool>,
}

impl SessionContext {
    pub fn new(target: SessionTarget) -> Self {
        Self {
            id: Uuid::now_v7(),
            target,
            running: Arc::new(AtomicBool::new(true)),
            stats: Arc::new(SessionStatsCounters::default()),
            started_at: SystemTime::now(),
            state: Arc::new(RwLock::new(RelayState::Resolving)),
            finished: Arc::new(AtomicBool::new(false)),
        }
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Ask the session to stop at its next check
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    pub(crate) fn mark_finished(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn state(&self) -> RelayState {
        *self.state.read()
    }

    pub fn set_state(&self, state: RelayState) {
        *self.state.write() = state;
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.to_stats(self.started_at)
    }

    /// Sleep for `duration` in slices of at most `slice`.
    ///
    /// Returns `false` as soon as the session is stopped.
    pub async fn sleep_while_running(&self, duration: Duration, slice: Duration) -> bool {
        let slice = slice.max(Duration::from_millis(1));
        let mut remaining = duration;

        while !remaining.is_zero() {
            if !self.is_running() {
                return false;
            }
            let step = remaining.min(slice);
            sleep(step).await;
            remaining -= step;
        }

        self.is_running()
    }
}
