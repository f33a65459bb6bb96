//! Main application state and service coordination
//!
//! This module contains the AppState that wires the record store, the vote
//! coordinator and the metrics collector together for the HTTP service.

use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::storage::{ArenaStore, InMemoryArenaStore};
use crate::types::CharacterSubmission;
use crate::voting::VoteCoordinator;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Seed data error: {message}")]
    Seed { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Vote coordinator over the record store
    coordinator: Arc<VoteCoordinator>,

    /// Metrics collector shared with the coordinator
    metrics_collector: Arc<MetricsCollector>,

    /// When the state was created
    started_at: Instant,

    /// Service status
    is_running: Arc<RwLock<bool>>,
}

impl AppState {
    /// Initialize the application with an in-memory store
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_store(config, Arc::new(InMemoryArenaStore::new())).await
    }

    /// Initialize the application over the given store
    pub async fn with_store(
        config: AppConfig,
        store: Arc<dyn ArenaStore>,
    ) -> Result<Self, ServiceError> {
        info!("Initializing faceoff voting service");
        info!(
            "Configuration: service={}, serialize_votes={}",
            config.service.name, config.voting.serialize_votes
        );

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let coordinator = Arc::new(VoteCoordinator::with_metrics(
            store,
            config.voting.clone(),
            metrics_collector.clone(),
        ));

        if let Some(seed_file) = &config.storage.seed_file {
            let submissions = load_seed_file(seed_file)?;
            let seeded = coordinator
                .seed_characters(submissions)
                .await
                .map_err(|e| ServiceError::Seed {
                    message: format!("Failed to register seed characters: {}", e),
                })?;
            info!(
                "Seeded {} characters from {}",
                seeded.len(),
                seed_file.display()
            );
        }

        Ok(Self {
            config,
            coordinator,
            metrics_collector,
            started_at: Instant::now(),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Mark the service as accepting requests
    pub async fn start(&self) {
        *self.is_running.write().await = true;
        self.metrics_collector.update_health_status(2);
        info!("✅ Faceoff voting service started successfully");
    }

    /// Mark the service as stopped
    pub async fn shutdown(&self) {
        *self.is_running.write().await = false;
        self.metrics_collector.update_health_status(0);

        match self.coordinator.store().count_votes().await {
            Ok(votes) => info!("Final statistics: {} votes recorded", votes),
            Err(e) => warn!("Failed to read final statistics: {}", e),
        }
        info!("✅ Faceoff service shutdown completed");
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the vote coordinator
    pub fn coordinator(&self) -> Arc<VoteCoordinator> {
        self.coordinator.clone()
    }

    /// Get the metrics collector
    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Time since the state was created
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}

/// Read character submissions from a JSON array file
pub fn load_seed_file(path: &Path) -> Result<Vec<CharacterSubmission>, ServiceError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ServiceError::Seed {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    serde_json::from_str(&contents).map_err(|e| ServiceError::Seed {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })
}
