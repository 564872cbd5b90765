//! Engine event system
//!
//! Simple event fan-out using `tokio::sync::broadcast`, matching the event
//! patterns used by the session layer this engine plugs into. The transport
//! layer subscribes and forwards events to interested connections; the wire
//! format is its concern, which is why every event is serde-serializable.
//!
//! Events are published only after the in-memory mutation has completed and
//! the best-effort ledger write has been issued, so a subscriber never sees
//! a state it cannot read back.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

use crate::agent::AgentId;
use crate::queue::{QueueLengths, QueueSnapshotEntry};
use crate::session::{SessionId, SessionStatus};

/// Events emitted by every successful mutating orchestrator operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A session moved between lifecycle states.
    SessionStatusChanged {
        session_id: SessionId,
        old_status: SessionStatus,
        new_status: SessionStatus,
        reason: Option<String>,
    },

    /// Queue contents changed; carries the full ordered view so subscribers
    /// can refresh position/wait displays without a follow-up query.
    QueueUpdated {
        lengths: QueueLengths,
        snapshot: Vec<QueueSnapshotEntry>,
    },

    /// A session was claimed by an agent.
    SessionAssigned {
        session_id: SessionId,
        agent_id: AgentId,
        agent_name: String,
    },

    /// A session reached its terminal state.
    SessionClosed { session_id: SessionId },
}

/// Broadcast publisher handed to the orchestrator.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<EngineEvent>,
}

const EVENT_CHANNEL_CAPACITY: usize = 256;

impl EventPublisher {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers. A send error only means nobody is
    /// listening, which is normal at startup and in tests.
    pub fn publish(&self, event: EngineEvent) {
        if self.sender.send(event).is_err() {
            debug!("No event subscribers registered; event dropped");
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}
