//! Main transfer engine: session state transitions, queue membership, and
//! agent workload, kept consistent under concurrent callers.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentId, AgentRegistry, AgentStatus};
use crate::config::{EngineConfig, Environment};
use crate::database::{LedgerEventKind, SqliteLedger, TransferLedger};
use crate::error::{Result, TransferEngineError};
use crate::events::{EngineEvent, EventPublisher};
use crate::orchestrator::types::{OrchestratorStats, SystemHealth};
use crate::queue::{
    QueueLengths, QueueSnapshotEntry, QueuedTransfer, TransferPriority, TransferQueue,
};
use crate::session::{Session, SessionId, SessionStatus, SessionStore};

/// Reason attached to entries re-queued when their agent's connection drops.
pub const AGENT_DISCONNECTED_REASON: &str = "agent disconnected";

/// Queue and registry state serialized behind the orchestrator lock.
struct CoreState {
    queue: TransferQueue,
    agents: AgentRegistry,
}

/// The transfer queue and session orchestrator.
///
/// Construct once (usually via [`TransferEngine::new`]) and share as
/// `Arc<TransferEngine>`; every connection handler and background task calls
/// into the same instance. All mutating operations take `&self` and
/// serialize internally, so callers never coordinate locking themselves.
///
/// Storage strategy: the lock-protected in-memory structures are the source
/// of truth for all invariants. The optional SQLite ledger is a best-effort
/// analytics mirror written after each mutation; its failures are logged,
/// never surfaced to mutating callers.
pub struct TransferEngine {
    config: EngineConfig,
    sessions: SessionStore,
    state: RwLock<CoreState>,
    events: EventPublisher,
    ledger: Option<Arc<dyn TransferLedger>>,
}

impl TransferEngine {
    /// Create an engine, connecting the analytics ledger when configured.
    ///
    /// An unreachable ledger fails construction: better to refuse startup
    /// than to run silently without the audit trail the deployment asked
    /// for. Pass `ledger_url: None` to run purely in memory.
    pub async fn new(config: EngineConfig) -> Result<Arc<Self>> {
        let ledger: Option<Arc<dyn TransferLedger>> = match &config.database.ledger_url {
            Some(url) => Some(Arc::new(SqliteLedger::connect(url).await?)),
            None => None,
        };
        Ok(Self::build(config, ledger))
    }

    /// Create an engine with an injected ledger port (tests, alternative
    /// backends).
    pub fn with_ledger(config: EngineConfig, ledger: Arc<dyn TransferLedger>) -> Arc<Self> {
        Self::build(config, Some(ledger))
    }

    fn build(config: EngineConfig, ledger: Option<Arc<dyn TransferLedger>>) -> Arc<Self> {
        info!(
            "🎛️ Transfer engine initialized for domain '{}' ({:?})",
            config.general.domain, config.general.environment
        );
        Arc::new(Self {
            config,
            sessions: SessionStore::new(),
            state: RwLock::new(CoreState {
                queue: TransferQueue::new(),
                agents: AgentRegistry::new(),
            }),
            events: EventPublisher::new(),
            ledger,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe to engine events. Receivers that fall behind miss events
    /// (broadcast semantics); the transport layer is expected to re-query.
    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ========== Session lifecycle ==========

    /// Create a session on first customer contact. Starts in `Bot` status.
    pub async fn create_session(
        &self,
        customer_id: &str,
        bot_context: serde_json::Value,
    ) -> Session {
        let session = self.sessions.create(customer_id, bot_context);
        debug!("Session {} created for customer {}", session.id, customer_id);
        self.mirror_session(&session.id).await;
        self.ledger_event(
            LedgerEventKind::SessionCreated,
            &session.id.0,
            None,
            None,
            None,
        )
        .await;
        session
    }

    pub fn get_session(&self, session_id: &SessionId) -> Option<Session> {
        self.sessions.get(session_id)
    }

    /// Escalate a session into the waiting queue.
    ///
    /// Requires status `Bot` or `Waiting`. Re-escalating a waiting session
    /// updates its existing entry's reason/priority in place rather than
    /// pushing a duplicate. Escalating a closed session is reported as
    /// [`TransferEngineError::SessionClosed`].
    pub async fn escalate(
        &self,
        session_id: &SessionId,
        reason: &str,
        priority: TransferPriority,
    ) -> Result<()> {
        let (old_status, lengths, snapshot) = {
            let mut state = self.state.write().await;
            let session = self
                .sessions
                .get(session_id)
                .ok_or_else(|| TransferEngineError::SessionNotFound(session_id.clone()))?;

            match session.status {
                SessionStatus::Closed => {
                    return Err(TransferEngineError::SessionClosed(session_id.clone()));
                }
                SessionStatus::WithAgent => {
                    return Err(TransferEngineError::InvalidTransition {
                        session: session_id.clone(),
                        from: SessionStatus::WithAgent,
                        to: SessionStatus::Waiting,
                    });
                }
                SessionStatus::Waiting => {
                    state.queue.update_in_place(session_id, reason, priority)?;
                }
                SessionStatus::Bot => {
                    self.sessions
                        .set_status(session_id, SessionStatus::Waiting, None)?;
                    state
                        .queue
                        .push(QueuedTransfer::new(session_id.clone(), priority, reason))?;
                }
            }

            let now = Utc::now();
            (session.status, state.queue.len(), state.queue.snapshot(now))
        };

        info!(
            "📥 Session {} escalated to queue ({:?}): {}",
            session_id, priority, reason
        );
        self.mirror_session(session_id).await;
        self.ledger_event(
            LedgerEventKind::Escalated,
            &session_id.0,
            None,
            Some(priority),
            Some(reason),
        )
        .await;
        self.events.publish(EngineEvent::SessionStatusChanged {
            session_id: session_id.clone(),
            old_status,
            new_status: SessionStatus::Waiting,
            reason: Some(reason.to_string()),
        });
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(())
    }

    /// Claim the highest-priority waiting session for an agent.
    ///
    /// Returns `Ok(None)` immediately on an empty queue. Fails with
    /// `AgentAtCapacity` before touching the queue, so a full agent can
    /// never cause an entry to be popped and lost. If the assignment cannot
    /// complete after the pop, the entry is pushed back to the front of its
    /// lane so its pop order is preserved.
    pub async fn claim_next(&self, agent_id: &AgentId) -> Result<Option<SessionId>> {
        let claimed = {
            let mut state = self.state.write().await;
            let agent_name = self.check_claimable(&state, agent_id)?;

            loop {
                let Some(entry) = state.queue.pop_next() else {
                    break None;
                };
                match self.sessions.get(&entry.session_id) {
                    Some(session) if session.status == SessionStatus::Waiting => {
                        let session_id = entry.session_id.clone();
                        self.sessions.set_status(
                            &session_id,
                            SessionStatus::WithAgent,
                            Some(agent_id.clone()),
                        )?;
                        if let Err(e) = state.agents.assign(agent_id, &session_id) {
                            // Compensate: the pop and the assign must land
                            // together or not at all.
                            self.sessions
                                .set_status(&session_id, SessionStatus::Waiting, None)?;
                            state.queue.push_front(entry)?;
                            return Err(e);
                        }
                        let now = Utc::now();
                        break Some((
                            session_id,
                            agent_name,
                            state.queue.len(),
                            state.queue.snapshot(now),
                        ));
                    }
                    _ => {
                        // Last-resort consistency guard: an entry whose
                        // session vanished or left Waiting is dropped, not
                        // handed to an agent.
                        warn!(
                            "🧹 Dropping stale queue entry for {} during claim",
                            entry.session_id
                        );
                        continue;
                    }
                }
            }
        };

        let Some((session_id, agent_name, lengths, snapshot)) = claimed else {
            return Ok(None);
        };

        info!("✅ Session {} claimed by agent {}", session_id, agent_id);
        self.mirror_session(&session_id).await;
        self.ledger_event(
            LedgerEventKind::Assigned,
            &session_id.0,
            Some(agent_id),
            None,
            None,
        )
        .await;
        self.events.publish(EngineEvent::SessionAssigned {
            session_id: session_id.clone(),
            agent_id: agent_id.clone(),
            agent_name,
        });
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(Some(session_id))
    }

    /// Claim one specific queued session for an agent.
    pub async fn claim_specific(&self, agent_id: &AgentId, session_id: &SessionId) -> Result<()> {
        let (agent_name, lengths, snapshot) = {
            let mut state = self.state.write().await;
            let agent_name = self.check_claimable(&state, agent_id)?;

            let Some(entry) = state.queue.take(session_id) else {
                return Err(TransferEngineError::NotInQueue(session_id.clone()));
            };

            match self.sessions.get(session_id) {
                Some(session) if session.status == SessionStatus::Waiting => {
                    self.sessions.set_status(
                        session_id,
                        SessionStatus::WithAgent,
                        Some(agent_id.clone()),
                    )?;
                    if let Err(e) = state.agents.assign(agent_id, session_id) {
                        self.sessions
                            .set_status(session_id, SessionStatus::Waiting, None)?;
                        state.queue.push_front(entry)?;
                        return Err(e);
                    }
                }
                Some(session) => {
                    warn!(
                        "🧹 Dropping stale queue entry for {} (status {:?})",
                        session_id, session.status
                    );
                    return Err(TransferEngineError::NotInQueue(session_id.clone()));
                }
                None => {
                    warn!("🧹 Dropping stale queue entry for missing session {}", session_id);
                    return Err(TransferEngineError::SessionNotFound(session_id.clone()));
                }
            }

            let now = Utc::now();
            (agent_name, state.queue.len(), state.queue.snapshot(now))
        };

        info!("✅ Session {} claimed (targeted) by agent {}", session_id, agent_id);
        self.mirror_session(session_id).await;
        self.ledger_event(
            LedgerEventKind::Assigned,
            &session_id.0,
            Some(agent_id),
            None,
            None,
        )
        .await;
        self.events.publish(EngineEvent::SessionAssigned {
            session_id: session_id.clone(),
            agent_id: agent_id.clone(),
            agent_name,
        });
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(())
    }

    /// Hand a `WithAgent` session back to the waiting queue.
    ///
    /// Used for manual hand-back and by [`agent_disconnect`](Self::agent_disconnect).
    /// Priority defaults to `Normal` when not specified.
    pub async fn release_to_queue(
        &self,
        session_id: &SessionId,
        reason: &str,
        priority: Option<TransferPriority>,
    ) -> Result<()> {
        let priority = priority.unwrap_or(TransferPriority::Normal);
        let (lengths, snapshot) = {
            let mut state = self.state.write().await;
            let session = self
                .sessions
                .get(session_id)
                .ok_or_else(|| TransferEngineError::SessionNotFound(session_id.clone()))?;

            if session.status != SessionStatus::WithAgent {
                return Err(TransferEngineError::InvalidTransition {
                    session: session_id.clone(),
                    from: session.status,
                    to: SessionStatus::Waiting,
                });
            }

            if let Some(agent_id) = &session.assigned_agent {
                state.agents.release(agent_id, session_id);
            }
            self.sessions
                .set_status(session_id, SessionStatus::Waiting, None)?;
            state
                .queue
                .push(QueuedTransfer::new(session_id.clone(), priority, reason))?;

            let now = Utc::now();
            (state.queue.len(), state.queue.snapshot(now))
        };

        info!("↩️ Session {} returned to queue: {}", session_id, reason);
        self.mirror_session(session_id).await;
        self.ledger_event(
            LedgerEventKind::ReturnedToQueue,
            &session_id.0,
            None,
            Some(priority),
            Some(reason),
        )
        .await;
        self.events.publish(EngineEvent::SessionStatusChanged {
            session_id: session_id.clone(),
            old_status: SessionStatus::WithAgent,
            new_status: SessionStatus::Waiting,
            reason: Some(reason.to_string()),
        });
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(())
    }

    /// Close a session from any state. Idempotent: closing an unknown or
    /// already-closed session reports success, and the queue/workload
    /// removal happens exactly once.
    pub async fn close(&self, session_id: &SessionId) -> Result<()> {
        let outcome = {
            let mut state = self.state.write().await;
            let Some(session) = self.sessions.get(session_id) else {
                debug!("Close for unknown session {} (already cleaned up)", session_id);
                return Ok(());
            };
            if session.status == SessionStatus::Closed {
                return Ok(());
            }

            let removed_from_queue = match session.status {
                SessionStatus::Waiting => state.queue.remove(session_id),
                _ => false,
            };
            if session.status == SessionStatus::WithAgent {
                if let Some(agent_id) = &session.assigned_agent {
                    state.agents.release(agent_id, session_id);
                }
            }
            self.sessions.close(session_id);

            let now = Utc::now();
            (removed_from_queue, state.queue.len(), state.queue.snapshot(now))
        };
        let (removed_from_queue, lengths, snapshot) = outcome;

        info!("🔚 Session {} closed", session_id);
        self.mirror_session(session_id).await;
        self.ledger_event(LedgerEventKind::Closed, &session_id.0, None, None, None)
            .await;
        self.events.publish(EngineEvent::SessionClosed {
            session_id: session_id.clone(),
        });
        if removed_from_queue {
            self.events
                .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        }
        Ok(())
    }

    // ========== Agent lifecycle ==========

    /// Register a newly connected agent with the configured default
    /// capacity.
    pub async fn register_agent(&self, connection_ref: &str, display_name: &str) -> Agent {
        let mut state = self.state.write().await;
        let agent = state.agents.register(
            connection_ref,
            display_name,
            self.config.agents.default_max_concurrent_sessions,
        );
        info!("👤 Agent registered: {} ({})", display_name, agent.id);
        agent
    }

    pub async fn get_agent(&self, agent_id: &AgentId) -> Option<Agent> {
        self.state.read().await.agents.get(agent_id).cloned()
    }

    pub async fn list_agents(&self) -> Vec<Agent> {
        self.state.read().await.agents.list()
    }

    /// First available agent with spare capacity, in registration order.
    /// Used by dispatch layers that prompt an agent to claim.
    pub async fn find_available_agent(&self) -> Option<Agent> {
        self.state.read().await.agents.find_available().cloned()
    }

    /// Toggle an agent's manual offline flag.
    pub async fn set_agent_offline(&self, agent_id: &AgentId, offline: bool) -> Result<()> {
        self.state.write().await.agents.set_offline(agent_id, offline)
    }

    /// Handle an agent connection dropping: remove the agent and return
    /// every session from its workload to the queue with reason
    /// "agent disconnected", priority `Normal`.
    ///
    /// Idempotent: a second call for the same id drains nothing and
    /// re-queues nothing. The unregister and all re-queues happen inside one
    /// critical section, so no caller ever observes a `WithAgent` session
    /// pointing at an agent that no longer exists.
    pub async fn agent_disconnect(&self, agent_id: &AgentId) -> Result<Vec<SessionId>> {
        let (requeued, lengths, snapshot) = {
            let mut state = self.state.write().await;
            let drained = state.agents.unregister(agent_id);
            let mut requeued = Vec::with_capacity(drained.len());

            for session_id in drained {
                match self.sessions.get(&session_id) {
                    Some(session) if session.status == SessionStatus::WithAgent => {
                        self.sessions
                            .set_status(&session_id, SessionStatus::Waiting, None)?;
                        state.queue.push(QueuedTransfer::new(
                            session_id.clone(),
                            TransferPriority::Normal,
                            AGENT_DISCONNECTED_REASON,
                        ))?;
                        requeued.push(session_id);
                    }
                    _ => {
                        debug!(
                            "Drained session {} already left WithAgent; nothing to re-queue",
                            session_id
                        );
                    }
                }
            }

            let now = Utc::now();
            (requeued, state.queue.len(), state.queue.snapshot(now))
        };

        if requeued.is_empty() {
            debug!("Agent {} disconnect drained no sessions", agent_id);
            return Ok(requeued);
        }

        info!(
            "👋 Agent {} disconnected; {} sessions returned to queue",
            agent_id,
            requeued.len()
        );
        for session_id in &requeued {
            self.mirror_session(session_id).await;
            self.ledger_event(
                LedgerEventKind::ReturnedToQueue,
                &session_id.0,
                Some(agent_id),
                Some(TransferPriority::Normal),
                Some(AGENT_DISCONNECTED_REASON),
            )
            .await;
            self.events.publish(EngineEvent::SessionStatusChanged {
                session_id: session_id.clone(),
                old_status: SessionStatus::WithAgent,
                new_status: SessionStatus::Waiting,
                reason: Some(AGENT_DISCONNECTED_REASON.to_string()),
            });
        }
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(requeued)
    }

    // ========== Queue queries ==========

    pub async fn queue_lengths(&self) -> QueueLengths {
        self.state.read().await.queue.len()
    }

    /// 1-based queue position, 0 if the session is not queued.
    pub async fn position_of(&self, session_id: &SessionId) -> usize {
        self.state.read().await.queue.position_of(session_id)
    }

    /// Ordered queue view. Entries whose session record has vanished are
    /// filtered out as a last-resort read-path guard.
    pub async fn queue_snapshot(&self) -> Vec<QueueSnapshotEntry> {
        let snapshot = {
            let state = self.state.read().await;
            state.queue.snapshot(Utc::now())
        };
        snapshot
            .into_iter()
            .filter(|entry| self.sessions.get(&entry.session_id).is_some())
            .collect()
    }

    /// Development-only destructive operation: empty all queue lanes and
    /// hand the cleared sessions back to the assistant (`Bot`).
    ///
    /// Refused (returns 0) outside the `Development` environment.
    pub async fn clear_queue(&self) -> Result<usize> {
        if self.config.general.environment != Environment::Development {
            warn!("🚫 Queue clear refused: not a development environment");
            return Ok(0);
        }

        let (cleared_ids, count, lengths, snapshot) = {
            let mut state = self.state.write().await;
            let now = Utc::now();
            let cleared_ids: Vec<SessionId> = state
                .queue
                .snapshot(now)
                .into_iter()
                .map(|e| e.session_id)
                .collect();
            let count = state.queue.clear();
            for session_id in &cleared_ids {
                // Cleared sessions go back to automated handling so the
                // queue⇔Waiting pairing stays intact.
                self.sessions
                    .set_status(session_id, SessionStatus::Bot, None)?;
            }
            (cleared_ids, count, state.queue.len(), state.queue.snapshot(now))
        };

        warn!("🧨 Queue cleared: {} entries dropped", count);
        self.ledger_event(LedgerEventKind::QueueCleared, "*", None, None, None)
            .await;
        for session_id in &cleared_ids {
            self.mirror_session(session_id).await;
            self.events.publish(EngineEvent::SessionStatusChanged {
                session_id: session_id.clone(),
                old_status: SessionStatus::Waiting,
                new_status: SessionStatus::Bot,
                reason: Some("queue cleared".to_string()),
            });
        }
        self.events
            .publish(EngineEvent::QueueUpdated { lengths, snapshot });
        Ok(count)
    }

    // ========== Stats, health, maintenance ==========

    /// Derived view of sessions, queue, and agents for monitoring.
    pub async fn stats(&self) -> OrchestratorStats {
        let (queued, average_wait_seconds, longest_wait_seconds, registered, available) = {
            let state = self.state.read().await;
            let now = Utc::now();
            let longest = state
                .queue
                .snapshot(now)
                .iter()
                .map(|e| e.wait_seconds)
                .max()
                .unwrap_or(0);
            let agents = state.agents.list();
            let available = agents
                .iter()
                .filter(|a| a.status == AgentStatus::Available)
                .count();
            (
                state.queue.len(),
                state.queue.average_wait_seconds(now),
                longest,
                agents.len(),
                available,
            )
        };

        let sessions = self.sessions.all();
        let count_status =
            |status: SessionStatus| sessions.iter().filter(|s| s.status == status).count();

        OrchestratorStats {
            total_sessions: sessions.len(),
            bot_sessions: count_status(SessionStatus::Bot),
            waiting_sessions: count_status(SessionStatus::Waiting),
            active_sessions: count_status(SessionStatus::WithAgent),
            closed_sessions: count_status(SessionStatus::Closed),
            queued,
            registered_agents: registered,
            available_agents: available,
            average_wait_seconds,
            longest_wait_seconds,
        }
    }

    /// Health flags for the external `/health` endpoint.
    pub async fn health(&self) -> SystemHealth {
        let ledger_ok = match &self.ledger {
            Some(ledger) => ledger.ping().await,
            None => true,
        };
        // The queue lives in process memory behind the orchestrator lock.
        SystemHealth::new(ledger_ok, true)
    }

    /// Remove closed sessions older than the configured retention window.
    /// Returns how many records were dropped.
    pub async fn sweep_closed_sessions(&self) -> usize {
        let retention =
            chrono::Duration::seconds(self.config.general.closed_session_retention_secs);
        let cutoff = Utc::now() - retention;
        let mut removed = 0;
        for session in self.sessions.all() {
            if session.status == SessionStatus::Closed && session.updated_at < cutoff {
                if self.sessions.remove(&session.id) {
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            debug!("🧹 Retention sweep removed {} closed sessions", removed);
        }
        removed
    }

    // ========== Internal helpers ==========

    /// Verify the agent exists and has spare capacity; returns its display
    /// name for event payloads.
    fn check_claimable(&self, state: &CoreState, agent_id: &AgentId) -> Result<String> {
        let agent = state
            .agents
            .get(agent_id)
            .ok_or_else(|| TransferEngineError::AgentNotFound(agent_id.clone()))?;
        if !agent.is_under_capacity() {
            return Err(TransferEngineError::AgentAtCapacity {
                agent: agent_id.clone(),
                capacity: agent.max_concurrent_sessions,
            });
        }
        Ok(agent.display_name.clone())
    }

    /// Best-effort ledger activity row; failures are logged, never surfaced.
    async fn ledger_event(
        &self,
        kind: LedgerEventKind,
        session_id: &str,
        agent_id: Option<&AgentId>,
        priority: Option<TransferPriority>,
        reason: Option<&str>,
    ) {
        if let Some(ledger) = &self.ledger {
            if let Err(e) = ledger
                .record_event(kind, session_id, agent_id, priority, reason)
                .await
            {
                warn!("Ledger event write failed (non-fatal): {}", e);
            }
        }
    }

    /// Best-effort session mirror write.
    async fn mirror_session(&self, session_id: &SessionId) {
        if let Some(ledger) = &self.ledger {
            if let Some(session) = self.sessions.get(session_id) {
                if let Err(e) = ledger.upsert_session(&session).await {
                    warn!("Ledger session mirror failed (non-fatal): {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_engine() -> Arc<TransferEngine> {
        TransferEngine::new(EngineConfig::default()).await.unwrap()
    }

    #[tokio::test]
    async fn escalate_unknown_session_is_reported() {
        let engine = test_engine().await;
        let result = engine
            .escalate(&SessionId::from("ghost"), "help", TransferPriority::Normal)
            .await;
        assert!(matches!(
            result,
            Err(TransferEngineError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn claim_next_on_empty_queue_returns_none() {
        let engine = test_engine().await;
        let agent = engine.register_agent("conn-1", "Alice").await;
        assert!(engine.claim_next(&agent.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn claim_next_rejects_unknown_and_full_agents() {
        let engine = test_engine().await;

        let unknown = engine.claim_next(&AgentId::from("ghost")).await;
        assert!(matches!(
            unknown,
            Err(TransferEngineError::AgentNotFound(_))
        ));

        let agent = engine.register_agent("conn-1", "Alice").await;
        for _ in 0..3 {
            let session = engine.create_session("customer", serde_json::json!({})).await;
            engine
                .escalate(&session.id, "help", TransferPriority::Normal)
                .await
                .unwrap();
            engine.claim_next(&agent.id).await.unwrap();
        }

        let full = engine.claim_next(&agent.id).await;
        assert!(matches!(
            full,
            Err(TransferEngineError::AgentAtCapacity { capacity: 3, .. })
        ));
    }

    #[tokio::test]
    async fn clear_queue_refused_in_production() {
        let engine = test_engine().await;
        let session = engine.create_session("customer", serde_json::json!({})).await;
        engine
            .escalate(&session.id, "help", TransferPriority::High)
            .await
            .unwrap();

        assert_eq!(engine.clear_queue().await.unwrap(), 0);
        assert_eq!(engine.queue_lengths().await.total, 1);
    }
}
