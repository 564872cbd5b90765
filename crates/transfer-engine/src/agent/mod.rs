//! # Agent Registry
//!
//! Tracks connected human agents, their capacity, and their current
//! workload. Registration order is preserved so `find_available` hands new
//! work to the longest-registered free agent, keeping distribution
//! predictable.
//!
//! The registry owns the workload bookkeeping only; session status changes
//! that must pair with an `assign`/`release` are the orchestrator's job and
//! happen inside the same critical section.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, TransferEngineError};
use crate::session::SessionId;

/// Unique identifier for a registered agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new() -> Self {
        Self(format!("agent-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Derived agent availability.
///
/// `Available` iff the workload is empty and the agent has not gone
/// manually offline; `Busy` iff the workload is non-empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStatus {
    Available,
    Busy,
    Offline,
}

/// One connected agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub display_name: String,
    /// Opaque handle to the live transport connection; never interpreted.
    pub connection_ref: String,
    pub status: AgentStatus,
    /// Sessions currently assigned to this agent, in assignment order.
    pub workload: Vec<SessionId>,
    /// Workload cap, fixed at registration time.
    pub max_concurrent_sessions: usize,
    pub registered_at: DateTime<Utc>,
}

impl Agent {
    pub fn is_under_capacity(&self) -> bool {
        self.workload.len() < self.max_concurrent_sessions
    }

    fn recompute_status(&mut self) {
        // Manual offline sticks until the agent comes back online.
        if self.status == AgentStatus::Offline {
            return;
        }
        self.status = if self.workload.is_empty() {
            AgentStatus::Available
        } else {
            AgentStatus::Busy
        };
    }
}

/// In-memory registry of connected agents, insertion-ordered.
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: HashMap<AgentId, Agent>,
    /// Registration order, used by `find_available`.
    order: Vec<AgentId>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly connected agent: `Available`, empty workload.
    pub fn register(
        &mut self,
        connection_ref: &str,
        display_name: &str,
        max_concurrent_sessions: usize,
    ) -> Agent {
        let agent = Agent {
            id: AgentId::new(),
            display_name: display_name.to_string(),
            connection_ref: connection_ref.to_string(),
            status: AgentStatus::Available,
            workload: Vec::new(),
            max_concurrent_sessions,
            registered_at: Utc::now(),
        };
        self.order.push(agent.id.clone());
        self.agents.insert(agent.id.clone(), agent.clone());
        agent
    }

    /// Remove the agent and return the sessions that were in its workload so
    /// the orchestrator can re-queue them.
    ///
    /// Removal and the drained-set computation are one step: after this
    /// returns there is no agent record left for a session to point at.
    /// Calling again for the same id drains nothing.
    pub fn unregister(&mut self, agent_id: &AgentId) -> Vec<SessionId> {
        let Some(agent) = self.agents.remove(agent_id) else {
            return Vec::new();
        };
        self.order.retain(|id| id != agent_id);
        agent.workload
    }

    /// Add a session to the agent's workload and recompute its status.
    pub fn assign(&mut self, agent_id: &AgentId, session_id: &SessionId) -> Result<()> {
        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| TransferEngineError::AgentNotFound(agent_id.clone()))?;
        if !agent.workload.contains(session_id) {
            agent.workload.push(session_id.clone());
        }
        agent.recompute_status();
        Ok(())
    }

    /// Remove a session from the agent's workload. No-op if the agent is
    /// gone or the session was not assigned to it.
    pub fn release(&mut self, agent_id: &AgentId, session_id: &SessionId) {
        if let Some(agent) = self.agents.get_mut(agent_id) {
            agent.workload.retain(|id| id != session_id);
            agent.recompute_status();
        }
    }

    /// Toggle manual offline. An offline agent is skipped by
    /// `find_available` even with an empty workload.
    pub fn set_offline(&mut self, agent_id: &AgentId, offline: bool) -> Result<()> {
        let agent = self
            .agents
            .get_mut(agent_id)
            .ok_or_else(|| TransferEngineError::AgentNotFound(agent_id.clone()))?;
        if offline {
            agent.status = AgentStatus::Offline;
        } else {
            agent.status = AgentStatus::Available;
            agent.recompute_status();
        }
        Ok(())
    }

    /// First `Available` agent in registration order with spare capacity.
    pub fn find_available(&self) -> Option<&Agent> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .find(|agent| agent.status == AgentStatus::Available && agent.is_under_capacity())
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&Agent> {
        self.agents.get(agent_id)
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.agents.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// All agents in registration order.
    pub fn list(&self) -> Vec<Agent> {
        self.order
            .iter()
            .filter_map(|id| self.agents.get(id))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_starts_available_with_empty_workload() {
        let mut registry = AgentRegistry::new();
        let agent = registry.register("conn-1", "Alice", 3);
        assert_eq!(agent.status, AgentStatus::Available);
        assert!(agent.workload.is_empty());
        assert!(registry.contains(&agent.id));
    }

    #[test]
    fn assign_and_release_recompute_status() {
        let mut registry = AgentRegistry::new();
        let agent = registry.register("conn-1", "Alice", 3);
        let session = SessionId::from("s1");

        registry.assign(&agent.id, &session).unwrap();
        assert_eq!(registry.get(&agent.id).unwrap().status, AgentStatus::Busy);

        registry.release(&agent.id, &session);
        assert_eq!(
            registry.get(&agent.id).unwrap().status,
            AgentStatus::Available
        );
    }

    #[test]
    fn assign_unknown_agent_fails() {
        let mut registry = AgentRegistry::new();
        let result = registry.assign(&AgentId::from("ghost"), &SessionId::from("s1"));
        assert!(matches!(result, Err(TransferEngineError::AgentNotFound(_))));
    }

    #[test]
    fn unregister_drains_workload_once() {
        let mut registry = AgentRegistry::new();
        let agent = registry.register("conn-1", "Alice", 3);
        registry.assign(&agent.id, &SessionId::from("s1")).unwrap();
        registry.assign(&agent.id, &SessionId::from("s2")).unwrap();

        let drained = registry.unregister(&agent.id);
        assert_eq!(drained.len(), 2);
        assert!(!registry.contains(&agent.id));

        // Second unregister of a removed id drains nothing.
        assert!(registry.unregister(&agent.id).is_empty());
    }

    #[test]
    fn find_available_honors_registration_order_and_capacity() {
        let mut registry = AgentRegistry::new();
        let alice = registry.register("conn-1", "Alice", 1);
        let bob = registry.register("conn-2", "Bob", 1);

        assert_eq!(registry.find_available().unwrap().id, alice.id);

        registry.assign(&alice.id, &SessionId::from("s1")).unwrap();
        assert_eq!(registry.find_available().unwrap().id, bob.id);

        registry.assign(&bob.id, &SessionId::from("s2")).unwrap();
        assert!(registry.find_available().is_none());
    }

    #[test]
    fn offline_agent_is_skipped_until_back_online() {
        let mut registry = AgentRegistry::new();
        let agent = registry.register("conn-1", "Alice", 3);

        registry.set_offline(&agent.id, true).unwrap();
        assert!(registry.find_available().is_none());
        assert_eq!(
            registry.get(&agent.id).unwrap().status,
            AgentStatus::Offline
        );

        registry.set_offline(&agent.id, false).unwrap();
        assert_eq!(registry.find_available().unwrap().id, agent.id);
    }
}
