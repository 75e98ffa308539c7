//! Session manager for running several poisoning sessions at once
//!
//! The `SessionManager` is the main entry point of the engine. It provides:
//!
//! - One tokio task per (sender, target) pair
//! - Thread-safe session tracking with DashMap
//! - Statistics collection
//! - Graceful shutdown

use arpspoof_core::{Error, Result, SessionStats, SessionTarget};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::{RelayState, SessionContext};
use crate::executor::{stop_and_wait, wait_for_session, SessionExecutor, SessionHandle};
use crate::relay::RelayEngine;

/// Information about a running session
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Unique session ID
    pub id: Uuid,
    /// Sender and target addresses
    pub target: SessionTarget,
    /// Lifecycle state
    pub state: RelayState,
    /// When the session started
    pub started_at: SystemTime,
    /// Is the session running?
    pub is_running: bool,
    /// Current statistics
    pub stats: SessionStats,
}

/// How a session ended
#[derive(Debug)]
pub struct SessionOutcome {
    pub id: Uuid,
    pub target: SessionTarget,
    pub result: Result<SessionStats>,
}

/// Session manager that orchestrates concurrent sessions
pub struct SessionManager {
    executor: SessionExecutor,
    /// Map of tracked sessions (UUID -> SessionHandle)
    sessions: Arc<DashMap<Uuid, SessionHandle>>,
    /// Is the manager shutting down?
    shutting_down: Arc<AtomicBool>,
}

impl SessionManager {
    pub fn new(engine: RelayEngine) -> Self {
        debug!("Creating new SessionManager");
        Self {
            executor: SessionExecutor::new(engine),
            sessions: Arc::new(DashMap::new()),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Launch a session for one pair and return its ID
    pub fn launch(&self, target: SessionTarget) -> Result<Uuid> {
        if self.shutting_down.load(Ordering::Relaxed) {
            return Err(Error::ExecutionFailed(
                "Manager is shutting down".to_string(),
            ));
        }

        let handle = self.executor.execute(SessionContext::new(target));
        let id = handle.id();
        self.sessions.insert(id, handle);

        info!(session = %id, pair = %target, "Session launched");
        Ok(id)
    }

    /// Launch one session per pair, in order
    pub fn launch_all(&self, targets: &[SessionTarget]) -> Result<Vec<Uuid>> {
        targets.iter().map(|target| self.launch(*target)).collect()
    }

    /// Stop a session and wait for it to finish
    pub async fn stop(&self, id: Uuid) -> Result<SessionOutcome> {
        debug!(session = %id, "Stopping session");

        if let Some((_, mut handle)) = self.sessions.remove(&id) {
            let result = stop_and_wait(&mut handle).await;
            Ok(SessionOutcome {
                id,
                target: handle.context.target,
                result,
            })
        } else {
            warn!(session = %id, "Session not found");
            Err(Error::NotFound(format!("Session {} not found", id)))
        }
    }

    /// Stop every session and collect how each one ended
    pub async fn stop_all(&self) -> Vec<SessionOutcome> {
        info!(count = self.sessions.len(), "Stopping all sessions");
        self.shutting_down.store(true, Ordering::Relaxed);

        // Signal everyone first so restores run concurrently
        for entry in self.sessions.iter() {
            entry.value().stop();
        }

        let mut outcomes = Vec::new();
        for id in self.session_ids() {
            match self.stop(id).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => debug!(session = %id, error = %e, "Session already removed"),
            }
        }
        outcomes
    }

    /// Wait until every session has ended on its own.
    ///
    /// Sessions stay tracked until all of them are done, so dropping this
    /// future early (e.g. in `tokio::select!`) loses nothing.
    pub async fn wait_all(&self) -> Vec<SessionOutcome> {
        let mut finished = self.executor.finished();
        loop {
            finished.borrow_and_update();
            if self.sessions.iter().all(|entry| entry.value().is_finished()) {
                break;
            }
            if finished.changed().await.is_err() {
                break;
            }
        }

        let mut outcomes = Vec::new();
        for id in self.session_ids() {
            if let Some((_, mut handle)) = self.sessions.remove(&id) {
                let result = wait_for_session(&mut handle).await;
                outcomes.push(SessionOutcome {
                    id,
                    target: handle.context.target,
                    result,
                });
            }
        }
        outcomes
    }

    /// List all tracked sessions
    pub fn list_active(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self
            .sessions
            .iter()
            .map(|entry| {
                let context = &entry.value().context;
                SessionInfo {
                    id: context.id,
                    target: context.target,
                    state: context.state(),
                    started_at: context.started_at,
                    is_running: context.is_running(),
                    stats: context.stats(),
                }
            })
            .collect();
        sessions.sort_by_key(|info| info.id);
        sessions
    }

    /// Get statistics for a specific session
    pub fn get_stats(&self, id: Uuid) -> Result<SessionStats> {
        self.sessions
            .get(&id)
            .map(|handle| handle.stats())
            .ok_or_else(|| Error::NotFound(format!("Session {} not found", id)))
    }

    pub fn state(&self, id: Uuid) -> Option<RelayState> {
        self.sessions.get(&id).map(|handle| handle.context.state())
    }

    /// Get the number of tracked sessions
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Check if a session is running
    pub fn is_running(&self, id: Uuid) -> bool {
        self.sessions
            .get(&id)
            .map(|handle| handle.context.is_running())
            .unwrap_or(false)
    }

    /// Tracked IDs in launch order (UUID v7 sorts by creation time)
    fn session_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.sessions.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.shutting_down.store(true, Ordering::Relaxed);

        for entry in self.sessions.iter() {
            entry.value().stop();
        }
    }
}
