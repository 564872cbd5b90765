//! # Transfer Server Manager
//!
//! High-level lifecycle wrapper around the transfer engine: builds the
//! engine from configuration, exposes the supervisor/admin APIs, and owns
//! the background tasks (periodic status monitoring and the closed-session
//! retention sweeper). Deployments embed this in their process entrypoint;
//! tests usually talk to [`TransferEngine`] directly.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::info;

use crate::api::{AdminApi, SupervisorApi};
use crate::config::EngineConfig;
use crate::error::{Result, TransferEngineError};
use crate::orchestrator::TransferEngine;

const SWEEP_INTERVAL_SECS: u64 = 60;

/// A complete transfer server that manages engine lifecycle and provides
/// APIs.
pub struct TransferServer {
    engine: Arc<TransferEngine>,
    supervisor_api: SupervisorApi,
    admin_api: AdminApi,
    config: EngineConfig,
    monitor_handle: Option<JoinHandle<()>>,
    sweeper_handle: Option<JoinHandle<()>>,
}

impl TransferServer {
    /// Create a server with the given configuration. Connects the analytics
    /// ledger when one is configured.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let engine = TransferEngine::new(config.clone()).await?;
        info!("✅ Transfer engine initialized");

        let supervisor_api = SupervisorApi::new(engine.clone());
        let admin_api = AdminApi::new(engine.clone());

        Ok(Self {
            engine,
            supervisor_api,
            admin_api,
            config,
            monitor_handle: None,
            sweeper_handle: None,
        })
    }

    /// Start background tasks: the status monitor and the retention
    /// sweeper.
    pub async fn start(&mut self) -> Result<()> {
        let supervisor_api = self.supervisor_api.clone();
        let monitor_interval = self.config.general.monitor_interval_secs;
        self.monitor_handle = Some(tokio::spawn(async move {
            Self::monitor_loop(supervisor_api, monitor_interval).await;
        }));

        let engine = self.engine.clone();
        self.sweeper_handle = Some(tokio::spawn(async move {
            Self::sweeper_loop(engine).await;
        }));

        info!("🚀 Transfer server started for domain '{}'", self.config.general.domain);
        Ok(())
    }

    /// Stop the server gracefully.
    pub async fn stop(&mut self) -> Result<()> {
        info!("🛑 Stopping transfer server...");

        if let Some(handle) = self.monitor_handle.take() {
            handle.abort();
            let _ = handle.await;
        }
        if let Some(handle) = self.sweeper_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        info!("✅ Transfer server stopped");
        Ok(())
    }

    /// Run the server indefinitely, logging stats periodically.
    pub async fn run(&self) -> Result<()> {
        info!("📞 Transfer server is running");
        loop {
            sleep(Duration::from_secs(60)).await;
            let stats = self.supervisor_api.stats().await;
            info!(
                "📊 Stats - Waiting: {}, With agents: {}, Agents available: {}/{}",
                stats.waiting_sessions,
                stats.active_sessions,
                stats.available_agents,
                stats.registered_agents
            );
        }
    }

    pub fn engine(&self) -> &Arc<TransferEngine> {
        &self.engine
    }

    pub fn supervisor_api(&self) -> &SupervisorApi {
        &self.supervisor_api
    }

    pub fn admin_api(&self) -> &AdminApi {
        &self.admin_api
    }

    /// Internal monitoring loop.
    async fn monitor_loop(supervisor_api: SupervisorApi, interval_secs: u64) {
        info!("👀 Starting status monitor");
        let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;

            let stats = supervisor_api.stats().await;
            info!("📊 === Transfer Status Update ===");
            info!(
                "📥 Queue: {} waiting (high: {}, normal: {}, low: {}), avg wait {:.0}s",
                stats.queued.total,
                stats.queued.high,
                stats.queued.normal,
                stats.queued.low,
                stats.average_wait_seconds
            );
            info!(
                "👥 Agents: {} registered, {} available",
                stats.registered_agents, stats.available_agents
            );
            info!(
                "💬 Sessions: {} total ({} bot, {} waiting, {} with agent)",
                stats.total_sessions,
                stats.bot_sessions,
                stats.waiting_sessions,
                stats.active_sessions
            );

            let health = supervisor_api.health().await;
            if !health.healthy {
                info!(
                    "🚨 Health degraded (ledger: {}, queue: {})",
                    health.ledger_ok, health.queue_ok
                );
            }
        }
    }

    /// Internal retention sweeper loop.
    async fn sweeper_loop(engine: Arc<TransferEngine>) {
        let mut ticker = interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
        loop {
            ticker.tick().await;
            engine.sweep_closed_sessions().await;
        }
    }
}

/// Builder for [`TransferServer`] with a fluent API.
pub struct TransferServerBuilder {
    config: Option<EngineConfig>,
    ledger_url: Option<String>,
}

impl TransferServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            ledger_url: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Point the analytics ledger at a database URL (overrides the
    /// configured one).
    pub fn with_ledger_url(mut self, url: impl Into<String>) -> Self {
        self.ledger_url = Some(url.into());
        self
    }

    /// Run without a durable ledger.
    pub fn with_in_memory_state_only(mut self) -> Self {
        self.ledger_url = None;
        self
    }

    pub async fn build(self) -> Result<TransferServer> {
        let mut config = self.config.ok_or_else(|| {
            TransferEngineError::Configuration("Configuration not provided".to_string())
        })?;
        if self.ledger_url.is_some() {
            config.database.ledger_url = self.ledger_url;
        }
        TransferServer::new(config).await
    }
}

impl Default for TransferServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
