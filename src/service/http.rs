//! HTTP API, health probes and Prometheus metrics
//!
//! One axum router serves the voting API under `/api` next to the health
//! and metrics endpoints.

use crate::config::ServiceSettings;
use crate::error::ArenaError;
use crate::service::app::AppState;
use crate::service::health::{HealthCheck, HealthStatus};
use crate::types::{CharacterId, CharacterSubmission};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl From<&ServiceSettings> for HttpServerConfig {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            port: settings.http_port,
            host: settings.host.clone(),
        }
    }
}

/// Request body for `POST /api/votes`
#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub character_a_id: CharacterId,
    pub character_b_id: CharacterId,
    /// Absent or null for a draw
    #[serde(default)]
    pub winner_id: Option<CharacterId>,
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

/// Maps core errors onto HTTP responses
#[derive(Debug)]
pub struct ApiError(pub ArenaError);

impl From<ArenaError> for ApiError {
    fn from(err: ArenaError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.0.to_string();
        let (status, body) = match self.0 {
            ArenaError::NotFound { requested, found } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": message,
                    "requested": requested,
                    "found": found
                }),
            ),
            ArenaError::InvalidInput { .. } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "invalid_input", "message": message }),
            ),
            ArenaError::Persistence {
                step, committed, ..
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "persistence",
                    "message": message,
                    "failed_step": step,
                    "committed_steps": committed
                }),
            ),
            ArenaError::Store { .. }
            | ArenaError::Configuration { .. }
            | ArenaError::InternalError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "internal", "message": message }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// HTTP server for the voting API
pub struct ArenaServer {
    config: HttpServerConfig,
    app_state: Arc<AppState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ArenaServer {
    /// Create a new server over the application state
    pub fn new(config: HttpServerConfig, app_state: Arc<AppState>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            app_state,
            shutdown_tx,
        }
    }

    /// Bind and serve until [`ArenaServer::stop`] is called
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid HTTP server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        info!("HTTP server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("HTTP server shutdown signal received");
            })
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Create the router with the API, health and metrics endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/api/leaderboard", get(leaderboard_handler))
            .route("/api/matchup", get(matchup_handler))
            .route("/api/votes", get(history_handler).post(vote_handler))
            .route("/api/characters", axum::routing::post(register_handler))
            .with_state(self.app_state.clone())
    }

    /// Signal the server to stop accepting connections
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping HTTP server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to HTTP server: {}", e);
        }

        Ok(())
    }
}

async fn root_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "service": state.config().service.name,
        "version": crate::VERSION,
        "endpoints": [
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/api/leaderboard",
            "/api/matchup",
            "/api/votes",
            "/api/characters"
        ]
    }))
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Response {
    debug!("Health check requested");

    match HealthCheck::check(state).await {
        Ok(health) => {
            let status = match health.status {
                HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
                HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            };
            (status, Json(health)).into_response()
        }
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn ready_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match HealthCheck::readiness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
        Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
        Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
        Err(e) => {
            error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
        }
    }
}

async fn alive_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match HealthCheck::liveness_check(state).await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
    }
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let metric_families = state.metrics_collector().registry().gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, encoder.format_type().to_string())],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics",
            )
                .into_response()
        }
    }
}

async fn leaderboard_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let characters = state.coordinator().leaderboard().await?;
    Ok(Json(characters))
}

async fn matchup_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let matchup = state.coordinator().random_matchup().await?;
    Ok(Json(matchup))
}

async fn vote_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<VoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let receipt = state
        .coordinator()
        .process_vote(
            request.character_a_id,
            request.character_b_id,
            request.winner_id,
        )
        .await?;
    Ok(Json(receipt))
}

async fn history_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let votes = state.coordinator().recent_votes(query.limit).await?;
    Ok(Json(votes))
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<CharacterSubmission>,
) -> Result<impl IntoResponse, ApiError> {
    let character = state.coordinator().register_character(submission).await?;
    Ok((StatusCode::CREATED, Json(character)))
}
