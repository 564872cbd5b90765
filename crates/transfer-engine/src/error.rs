//! Error types for transfer queue and session orchestration

use thiserror::Error;

use crate::agent::AgentId;
use crate::session::{SessionId, SessionStatus};

/// Errors surfaced by the transfer engine.
///
/// "Not found" style variants on cleanup paths (`close`, `remove`) are
/// treated as benign by the orchestrator and never reach callers; everywhere
/// else they carry the offending id so callers can log or display them.
#[derive(Debug, Error)]
pub enum TransferEngineError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Agent not found: {0}")]
    AgentNotFound(AgentId),

    #[error("Session is closed: {0}")]
    SessionClosed(SessionId),

    #[error("Session already queued: {0}")]
    DuplicateEntry(SessionId),

    #[error("Session not in queue: {0}")]
    NotInQueue(SessionId),

    #[error("Agent {agent} is at capacity ({capacity} concurrent sessions)")]
    AgentAtCapacity { agent: AgentId, capacity: usize },

    #[error("Invalid transition for session {session}: {from:?} -> {to:?}")]
    InvalidTransition {
        session: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Durable store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, TransferEngineError>;
