//! Main application state and service coordination
//!
//! This module contains the production AppState that wires the catalog,
//! provider directory, channel hub, notifier, assignment engine, and
//! booking manager together, and manages the health server task.

use crate::assignment::AssignmentEngine;
use crate::booking::BookingManager;
use crate::catalog::ServiceCatalog;
use crate::config::AppConfig;
use crate::directory::{InMemoryProviderDirectory, ProviderDirectory};
use crate::error::Result;
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector};
use crate::notify::{ChannelHub, InMemoryNotificationStore, Notifier};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Production application state
pub struct AppState {
    config: AppConfig,
    directory: Arc<InMemoryProviderDirectory>,
    hub: Arc<ChannelHub>,
    booking_manager: Arc<BookingManager>,
    metrics_collector: Arc<MetricsCollector>,
    running: RwLock<bool>,
    started_at: DateTime<Utc>,
    health_server: RwLock<Option<Arc<HealthServer>>>,
    health_task: Mutex<Option<JoinHandle<()>>>,
}

impl AppState {
    /// Wire all service components from configuration
    pub async fn new(config: AppConfig) -> Result<Self> {
        crate::config::validate_config(&config)?;

        let catalog = Arc::new(ServiceCatalog::standard());
        let directory = Arc::new(InMemoryProviderDirectory::new());
        let hub = Arc::new(ChannelHub::new(config.dispatch.channel_capacity));
        let notifier = Arc::new(Notifier::new(
            Arc::new(InMemoryNotificationStore::new()),
            hub.clone(),
        ));
        let metrics_collector = Arc::new(MetricsCollector::new()?);

        let engine = Arc::new(AssignmentEngine::new(
            directory.clone(),
            catalog.clone(),
            config.eta_policy(),
            config.fallback_location(),
        ));

        let booking_manager = Arc::new(BookingManager::with_settings(
            directory.clone(),
            engine,
            catalog,
            notifier,
            hub.clone(),
            config.eta_policy(),
            metrics_collector.clone(),
            config.dispatch.nearby_limit,
            config.dispatch.notification_feed_limit,
        ));

        info!("Service components initialized");

        Ok(Self {
            config,
            directory,
            hub,
            booking_manager,
            metrics_collector,
            running: RwLock::new(false),
            started_at: Utc::now(),
            health_server: RwLock::new(None),
            health_task: Mutex::new(None),
        })
    }

    /// Start the service: mark running and launch the health server task
    pub async fn start(self: Arc<Self>) -> Result<()> {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        let server = Arc::new(
            HealthServer::new(
                HealthServerConfig {
                    port: self.config.service.health_port,
                    ..HealthServerConfig::default()
                },
                self.metrics_collector.clone(),
            )
            .with_app_state(self.clone()),
        );

        {
            let mut slot = self.health_server.write().await;
            *slot = Some(server.clone());
        }

        let handle = tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!("Health server terminated: {}", e);
            }
        });

        {
            let mut task = self.health_task.lock().await;
            *task = Some(handle);
        }

        info!("Service started");
        Ok(())
    }

    /// Stop the service and its background tasks
    pub async fn stop(&self) -> Result<()> {
        {
            let mut running = self.running.write().await;
            *running = false;
        }

        if let Some(server) = self.health_server.read().await.as_ref() {
            server.stop().await?;
        }

        if let Some(handle) = self.health_task.lock().await.take() {
            let _ = handle.await;
        }

        info!("Service stopped");
        Ok(())
    }

    /// Whether the service is accepting work
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The booking manager
    pub fn booking_manager(&self) -> Arc<BookingManager> {
        self.booking_manager.clone()
    }

    /// The provider directory
    pub fn directory(&self) -> Arc<dyn ProviderDirectory> {
        self.directory.clone()
    }

    /// The real-time channel hub
    pub fn hub(&self) -> Arc<ChannelHub> {
        self.hub.clone()
    }

    /// The metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Human-readable uptime since initialization
    pub fn uptime_info(&self) -> String {
        let uptime = Utc::now() - self.started_at;
        format!(
            "{}h {}m {}s",
            uptime.num_hours(),
            uptime.num_minutes() % 60,
            uptime.num_seconds() % 60
        )
    }
}
