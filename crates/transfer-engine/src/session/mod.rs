//! # Session Store
//!
//! Durable record of each conversation: identity, lifecycle status, and the
//! agent it is assigned to (if any). The store itself is a plain field-level
//! store; it does not enforce queue membership or workload invariants. Those
//! belong to the orchestrator, which is the only component allowed to mutate
//! a session's `status`/`assigned_agent` pair (and only while holding the
//! orchestrator lock that serializes the operation touching that session).
//!
//! Sessions are created on first customer contact in [`SessionStatus::Bot`],
//! move through the `Bot -> Waiting -> WithAgent -> Closed` state machine,
//! and are removed from the store by the retention sweeper once they have
//! been `Closed` for longer than the configured retention window.

use std::fmt;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::error::{Result, TransferEngineError};

/// Unique identifier for one customer conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(format!("session-{}", Uuid::new_v4()))
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of a session. Exactly one at any time; `Closed` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Handled by the automated assistant.
    Bot,
    /// Escalated and waiting in the transfer queue.
    Waiting,
    /// Claimed by a human agent.
    WithAgent,
    /// Terminal; never queued and never in any workload.
    Closed,
}

/// One customer conversation.
///
/// Invariant (orchestrator-enforced): `assigned_agent` is `Some` iff
/// `status == WithAgent`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    /// Customer-side identifier (account id, phone number, device id...).
    pub customer_id: String,
    pub status: SessionStatus,
    pub assigned_agent: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Opaque assistant context blob, carried but never interpreted here.
    pub bot_context: serde_json::Value,
}

/// In-memory session store.
///
/// Individual records may be read concurrently; status mutations go through
/// the orchestrator's lock so a record's `status`/`assigned_agent` pair is
/// never torn across operations.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a new session in `Bot` status. Always succeeds.
    pub fn create(&self, customer_id: &str, bot_context: serde_json::Value) -> Session {
        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            customer_id: customer_id.to_string(),
            status: SessionStatus::Bot,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
            bot_context,
        };
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|s| s.value().clone())
    }

    /// Pure field update of `status`/`assigned_agent`. Fails if the session
    /// does not exist; does not check transition validity (the orchestrator
    /// does that before calling).
    pub fn set_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        assigned_agent: Option<AgentId>,
    ) -> Result<()> {
        let mut entry = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| TransferEngineError::SessionNotFound(id.clone()))?;
        entry.status = status;
        entry.assigned_agent = assigned_agent;
        entry.updated_at = entry.updated_at.max(Utc::now());
        Ok(())
    }

    /// Set `Closed` regardless of prior status. Idempotent; returns whether
    /// the session existed.
    pub fn close(&self, id: &SessionId) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.status = SessionStatus::Closed;
                entry.assigned_agent = None;
                entry.updated_at = entry.updated_at.max(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Remove a session record entirely (retention sweep). Returns whether
    /// anything was removed.
    pub fn remove(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Snapshot of all session records, for stats and the retention sweeper.
    pub fn all(&self) -> Vec<Session> {
        self.sessions.iter().map(|s| s.value().clone()).collect()
    }
}
