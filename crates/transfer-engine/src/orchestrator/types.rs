//! Shared orchestrator types: derived stats and health views.

use serde::{Deserialize, Serialize};

use crate::queue::QueueLengths;

/// Point-in-time view of the whole engine, for monitoring and supervisor
/// surfaces. All counts are derived reads; nothing here is authoritative.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStats {
    pub total_sessions: usize,
    pub bot_sessions: usize,
    pub waiting_sessions: usize,
    /// Sessions currently with an agent.
    pub active_sessions: usize,
    pub closed_sessions: usize,
    pub queued: QueueLengths,
    pub registered_agents: usize,
    pub available_agents: usize,
    pub average_wait_seconds: f64,
    pub longest_wait_seconds: i64,
}

/// Health flags consumed by an external `/health` endpoint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SystemHealth {
    /// Analytics ledger reachable (true when no ledger is configured).
    pub ledger_ok: bool,
    /// Queue store reachable. The queue is in-process memory, so this only
    /// goes false if a future durable queue backend is wired in and lost.
    pub queue_ok: bool,
    pub healthy: bool,
}

impl SystemHealth {
    pub fn new(ledger_ok: bool, queue_ok: bool) -> Self {
        Self {
            ledger_ok,
            queue_ok,
            healthy: ledger_ok && queue_ok,
        }
    }
}
