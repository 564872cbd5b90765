//! # Analytics Ledger
//!
//! Durable, best-effort mirror of orchestrator activity backed by SQLite via
//! sqlx. This is the slow persistence path of the engine's declared storage
//! strategy: the lock-protected in-memory structures are the source of truth
//! for every correctness-critical invariant, and the ledger receives an
//! eventually-consistent copy for analytics and audit.
//!
//! Ledger failures never fail a mutating operation; the orchestrator logs
//! them and moves on. Reachability is surfaced through [`TransferLedger::ping`]
//! and the engine's health query.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

use crate::agent::AgentId;
use crate::error::{Result, TransferEngineError};
use crate::queue::TransferPriority;
use crate::session::{Session, SessionStatus};

/// Kinds of ledger rows written by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerEventKind {
    SessionCreated,
    Escalated,
    Assigned,
    ReturnedToQueue,
    Closed,
    QueueCleared,
}

impl LedgerEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEventKind::SessionCreated => "session_created",
            LedgerEventKind::Escalated => "escalated",
            LedgerEventKind::Assigned => "assigned",
            LedgerEventKind::ReturnedToQueue => "returned_to_queue",
            LedgerEventKind::Closed => "closed",
            LedgerEventKind::QueueCleared => "queue_cleared",
        }
    }
}

fn priority_str(priority: TransferPriority) -> &'static str {
    match priority {
        TransferPriority::High => "high",
        TransferPriority::Normal => "normal",
        TransferPriority::Low => "low",
    }
}

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::Bot => "bot",
        SessionStatus::Waiting => "waiting",
        SessionStatus::WithAgent => "with_agent",
        SessionStatus::Closed => "closed",
    }
}

/// The ledger port. The engine only ever talks to this trait, so tests can
/// run without a database and deployments can swap the backing store.
#[async_trait]
pub trait TransferLedger: Send + Sync {
    /// Append one activity row.
    async fn record_event(
        &self,
        kind: LedgerEventKind,
        session_id: &str,
        agent_id: Option<&AgentId>,
        priority: Option<TransferPriority>,
        reason: Option<&str>,
    ) -> Result<()>;

    /// Upsert the session mirror row.
    async fn upsert_session(&self, session: &Session) -> Result<()>;

    /// Whether the backing store is reachable right now.
    async fn ping(&self) -> bool;
}

/// SQLite-backed ledger.
#[derive(Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Connect and create the schema if needed. `sqlite::memory:` is
    /// supported for tests and demos.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| TransferEngineError::StoreUnavailable(e.to_string()))?
            .create_if_missing(true);

        // A single connection keeps in-memory databases coherent and is
        // plenty for an append-mostly analytics path.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| TransferEngineError::StoreUnavailable(e.to_string()))?;

        let ledger = Self { pool };
        ledger.create_schema().await?;
        info!("💾 Transfer ledger connected ({})", url);
        Ok(ledger)
    }

    async fn create_schema(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS transfer_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event TEXT NOT NULL,
                session_id TEXT NOT NULL,
                agent_id TEXT,
                priority TEXT,
                reason TEXT,
                occurred_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                customer_id TEXT NOT NULL,
                status TEXT NOT NULL,
                assigned_agent TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Number of recorded events, for tests and reporting.
    pub async fn event_count(&self) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transfer_events")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}

#[async_trait]
impl TransferLedger for SqliteLedger {
    async fn record_event(
        &self,
        kind: LedgerEventKind,
        session_id: &str,
        agent_id: Option<&AgentId>,
        priority: Option<TransferPriority>,
        reason: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO transfer_events (event, session_id, agent_id, priority, reason, occurred_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(kind.as_str())
        .bind(session_id)
        .bind(agent_id.map(|a| a.0.clone()))
        .bind(priority.map(priority_str))
        .bind(reason)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("Ledger event recorded: {} for {}", kind.as_str(), session_id);
        Ok(())
    }

    async fn upsert_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "INSERT INTO sessions (session_id, customer_id, status, assigned_agent, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT(session_id) DO UPDATE SET
                 status = excluded.status,
                 assigned_agent = excluded.assigned_agent,
                 updated_at = excluded.updated_at",
        )
        .bind(session.id.0.clone())
        .bind(session.customer_id.clone())
        .bind(status_str(session.status))
        .bind(session.assigned_agent.as_ref().map(|a| a.0.clone()))
        .bind(session.created_at.to_rfc3339())
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn ledger_records_events_and_sessions() {
        let ledger = SqliteLedger::connect("sqlite::memory:").await.unwrap();
        assert!(ledger.ping().await);

        let store = SessionStore::new();
        let session = store.create("customer-1", serde_json::json!({}));

        ledger.upsert_session(&session).await.unwrap();
        ledger
            .record_event(
                LedgerEventKind::Escalated,
                &session.id.0,
                None,
                Some(TransferPriority::High),
                Some("billing dispute"),
            )
            .await
            .unwrap();

        assert_eq!(ledger.event_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn upsert_session_is_replayable() {
        let ledger = SqliteLedger::connect("sqlite::memory:").await.unwrap();
        let store = SessionStore::new();
        let session = store.create("customer-1", serde_json::json!({}));

        ledger.upsert_session(&session).await.unwrap();
        ledger.upsert_session(&session).await.unwrap();
    }
}
