//! Commonly used types, re-exported for convenient glob import.

pub use crate::agent::{Agent, AgentId, AgentStatus};
pub use crate::api::{AdminApi, SupervisorApi};
pub use crate::config::{AgentConfig, DatabaseConfig, EngineConfig, Environment, GeneralConfig};
pub use crate::database::{LedgerEventKind, SqliteLedger, TransferLedger};
pub use crate::error::{Result, TransferEngineError};
pub use crate::events::EngineEvent;
pub use crate::orchestrator::{OrchestratorStats, SystemHealth, TransferEngine};
pub use crate::queue::{QueueLengths, QueueSnapshotEntry, QueuedTransfer, TransferPriority};
pub use crate::server::{TransferServer, TransferServerBuilder};
pub use crate::session::{Session, SessionId, SessionStatus};
