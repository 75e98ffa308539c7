//! Session executor that runs sessions on the tokio runtime
//!
//! This module provides the `SessionExecutor` which is responsible for:
//! - Spawning one task per session
//! - Logging how each session ended
//! - Announcing each task's end to anyone waiting on [`SessionExecutor::finished`]
//! - Joining tasks and turning panics into errors

use arpspoof_core::{Error, Result, SessionStats};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::context::SessionContext;
use crate::relay::RelayEngine;

/// Handle to a spawned session
pub struct SessionHandle {
    /// Shared session state
    pub context: SessionContext,
    task_handle: Option<JoinHandle<Result<SessionStats>>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.context.id
    }

    /// Signal the session to stop
    pub fn stop(&self) {
        self.context.stop();
    }

    /// True once the task has ended, or was already joined
    pub fn is_finished(&self) -> bool {
        self.task_handle.is_none() || self.context.is_finished()
    }

    pub fn stats(&self) -> SessionStats {
        self.context.stats()
    }
}

/// Marks a session finished when the task holding it goes away.
///
/// Dropped on return, on panic, and when the task is cancelled before it
/// ever ran.
struct FinishGuard {
    context: SessionContext,
    finished: Arc<watch::Sender<u64>>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.context.mark_finished();
        self.finished.send_modify(|count| *count = count.wrapping_add(1));
    }
}

/// Spawns sessions against one engine
#[derive(Clone)]
pub struct SessionExecutor {
    engine: RelayEngine,
    /// Bumped every time a session task ends
    finished: Arc<watch::Sender<u64>>,
}

impl SessionExecutor {
    pub fn new(engine: RelayEngine) -> Self {
        let (finished, _) = watch::channel(0);
        Self {
            engine,
            finished: Arc::new(finished),
        }
    }

    /// Receiver that changes whenever a session spawned here ends
    pub fn finished(&self) -> watch::Receiver<u64> {
        self.finished.subscribe()
    }

    /// Spawn a task driving `context` and return its handle.
    ///
    /// Must be called from within a tokio runtime.
    pub fn execute(&self, context: SessionContext) -> SessionHandle {
        let engine = self.engine.clone();
        let task_context = context.clone();
        let guard = FinishGuard {
            context: context.clone(),
            finished: Arc::clone(&self.finished),
        };

        info!(
            session = %context.id,
            sender = %context.target.sender,
            impersonated = %context.target.target,
            "Starting session"
        );

        let task_handle = tokio::spawn(async move {
            let _guard = guard;
            let result = engine.run(&task_context).await;

            match &result {
                Ok(stats) => {
                    info!(
                        session = %task_context.id,
                        spoofs = stats.spoofs_sent,
                        relayed = stats.frames_relayed,
                        "Session finished"
                    );
                }
                Err(e) => {
                    error!(
                        session = %task_context.id,
                        error = %e,
                        "Session failed"
                    );
                }
            }

            result
        });

        SessionHandle {
            context,
            task_handle: Some(task_handle),
        }
    }
}

/// Wait for a session task to complete
pub async fn wait_for_session(handle: &mut SessionHandle) -> Result<SessionStats> {
    if let Some(task_handle) = handle.task_handle.take() {
        match task_handle.await {
            Ok(result) => result,
            Err(e) => {
                if e.is_panic() {
                    error!(session = %handle.id(), "Session task panicked");
                    Err(Error::ExecutionFailed("Session task panicked".to_string()))
                } else {
                    error!(session = %handle.id(), error = %e, "Failed to join session task");
                    Err(Error::ExecutionFailed(format!(
                        "Failed to join session task: {}",
                        e
                    )))
                }
            }
        }
    } else {
        warn!(session = %handle.id(), "Session task already joined");
        Ok(handle.stats())
    }
}

/// Stop a session and wait for it to complete
pub async fn stop_and_wait(handle: &mut SessionHandle) -> Result<SessionStats> {
    debug!(session = %handle.id(), "Stopping session");

    handle.stop();
    wait_for_session(handle).await
}
