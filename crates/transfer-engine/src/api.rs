//! Supervisor and admin API facades
//!
//! Thin, cloneable wrappers over `Arc<TransferEngine>` that split the call
//! surface by audience: supervisors get read-only monitoring queries, admins
//! additionally get the destructive development-only operations. The
//! transport/HTTP layer binds to these rather than the engine directly.

use std::sync::Arc;

use crate::agent::Agent;
use crate::error::Result;
use crate::orchestrator::{OrchestratorStats, SystemHealth, TransferEngine};
use crate::queue::{QueueLengths, QueueSnapshotEntry};
use crate::session::{Session, SessionId};

/// Read-only monitoring surface.
#[derive(Clone)]
pub struct SupervisorApi {
    engine: Arc<TransferEngine>,
}

impl SupervisorApi {
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        Self { engine }
    }

    pub async fn stats(&self) -> OrchestratorStats {
        self.engine.stats().await
    }

    pub async fn health(&self) -> SystemHealth {
        self.engine.health().await
    }

    pub async fn queue_lengths(&self) -> QueueLengths {
        self.engine.queue_lengths().await
    }

    pub async fn queue_snapshot(&self) -> Vec<QueueSnapshotEntry> {
        self.engine.queue_snapshot().await
    }

    pub async fn position_of(&self, session_id: &SessionId) -> usize {
        self.engine.position_of(session_id).await
    }

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.engine.list_agents().await
    }

    pub async fn find_available_agent(&self) -> Option<Agent> {
        self.engine.find_available_agent().await
    }

    pub fn get_session(&self, session_id: &SessionId) -> Option<Session> {
        self.engine.get_session(session_id)
    }
}

/// Administrative surface: everything supervisors can do, plus destructive
/// debug operations.
#[derive(Clone)]
pub struct AdminApi {
    engine: Arc<TransferEngine>,
}

impl AdminApi {
    pub fn new(engine: Arc<TransferEngine>) -> Self {
        Self { engine }
    }

    /// Empty the transfer queue. Refused (returns 0) outside a development
    /// environment; see [`TransferEngine::clear_queue`].
    pub async fn clear_queue(&self) -> Result<usize> {
        self.engine.clear_queue().await
    }

    /// Force-run the closed-session retention sweep.
    pub async fn sweep_closed_sessions(&self) -> usize {
        self.engine.sweep_closed_sessions().await
    }
}
