//! # Transfer Engine
//!
//! Transfer queue and session orchestration for customer support systems
//! that route conversations between an automated assistant and human agents.
//!
//! A conversation ("session") starts in automated handling, can be escalated
//! into a durable, priority-ordered waiting queue, and is later claimed by
//! exactly one agent. The hard part is not the chat transport or the
//! assistant call; it is keeping session state, queue membership, and agent
//! workload consistent while escalations, claims, closes, and agent
//! disconnects interleave. That consistency problem is what this crate owns.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               TransferServer                  │
//! │        (lifecycle + background tasks)         │
//! ├───────────────────────────────────────────────┤
//! │      SupervisorApi        │      AdminApi     │
//! ├───────────────────────────────────────────────┤
//! │               TransferEngine                  │
//! │  SessionStore │ TransferQueue │ AgentRegistry │
//! ├───────────────────────────────────────────────┤
//! │   Events (broadcast)   │   Ledger (SQLite)    │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The engine serializes all mutating operations behind one lock, so each
//! operation is atomic from the caller's point of view; the in-memory state
//! is the source of truth and the SQLite ledger is a best-effort analytics
//! mirror. State-change notifications fan out on a broadcast channel for the
//! real-time transport layer to forward to subscribers.
//!
//! ## Example
//!
//! ```rust
//! use transfer_engine::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let engine = TransferEngine::new(EngineConfig::default()).await?;
//!
//! // Customer starts with the assistant, then gets escalated.
//! let session = engine.create_session("customer-42", serde_json::json!({})).await;
//! engine
//!     .escalate(&session.id, "billing dispute", TransferPriority::High)
//!     .await?;
//!
//! // An agent connects and claims the highest-priority waiting session.
//! let agent = engine.register_agent("conn-7", "Alice").await;
//! let claimed = engine.claim_next(&agent.id).await?;
//! assert_eq!(claimed, Some(session.id.clone()));
//!
//! engine.close(&session.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod prelude;
pub mod queue;
pub mod server;
pub mod session;

pub use config::EngineConfig;
pub use error::{Result, TransferEngineError};
pub use orchestrator::TransferEngine;
pub use server::{TransferServer, TransferServerBuilder};
