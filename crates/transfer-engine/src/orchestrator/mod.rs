//! # Transfer Orchestration Module
//!
//! The central coordination layer that ties the session store, transfer
//! queue, and agent registry together into one consistent state machine.
//! Every mutating operation here is atomic from the caller's point of view:
//! either all of its sub-steps (status transition, queue mutation, workload
//! update) land together, or none do.
//!
//! ## State machine
//!
//! ```text
//!   Bot ──escalate──▶ Waiting ──claim──▶ WithAgent
//!    │                  │  ▲                │
//!    │                  │  └──release───────┤
//!    └──────close───────┴────────close──────┴──▶ Closed (terminal)
//! ```
//!
//! ## Concurrency model
//!
//! One `tokio::sync::RwLock` serializes all mutating operations over the
//! queue and registry; session records live in a concurrent map but their
//! `status`/`assigned_agent` pair is only mutated while holding that lock.
//! Critical sections are short and never perform I/O: ledger writes and
//! event emission happen after the lock is released, with the in-memory
//! state already the committed source of truth.

pub mod core;
pub mod types;

pub use self::core::TransferEngine;
pub use types::{OrchestratorStats, SystemHealth};
