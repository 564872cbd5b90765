//! Engine configuration
//!
//! Mirrors the sectioned configuration style used across the stack: one
//! top-level [`EngineConfig`] with nested section structs, all carrying
//! sensible defaults so tests and examples can start from
//! `EngineConfig::default()` and override individual fields.

use serde::{Deserialize, Serialize};

/// Deployment environment. Destructive debug operations (queue clear) are
/// refused outside of `Development`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

/// Top-level configuration for the transfer engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub general: GeneralConfig,
    pub agents: AgentConfig,
    pub database: DatabaseConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            agents: AgentConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

/// General engine settings.
#[derive(Debug, Clone)]
pub struct GeneralConfig {
    /// Logical domain this engine serves, used in log output only.
    pub domain: String,

    /// Deployment environment; gates destructive debug operations.
    pub environment: Environment,

    /// Interval between monitor loop status reports, in seconds.
    pub monitor_interval_secs: u64,

    /// How long closed sessions are retained in the store before the
    /// background sweeper removes them, in seconds.
    pub closed_session_retention_secs: i64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            domain: "support.local".to_string(),
            environment: Environment::Production,
            monitor_interval_secs: 10,
            closed_session_retention_secs: 3600,
        }
    }
}

/// Agent-related settings.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Capacity assigned to newly registered agents: the maximum number of
    /// sessions one agent can have in its workload at the same time.
    pub default_max_concurrent_sessions: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_max_concurrent_sessions: 3,
        }
    }
}

/// Ledger database settings.
#[derive(Debug, Clone, Default)]
pub struct DatabaseConfig {
    /// Connection URL for the analytics ledger (e.g. `sqlite::memory:` or
    /// `sqlite:transfer.db`). `None` disables the ledger entirely; the
    /// engine is fully functional without it.
    pub ledger_url: Option<String>,
}
