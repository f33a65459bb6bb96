//! Service layer for the faceoff voting service
//!
//! Application state, health reporting and the HTTP server that exposes the
//! voting API.

pub mod app;
pub mod health;
pub mod http;

pub use app::{load_seed_file, AppState, ServiceError};
pub use health::{HealthCheck, HealthStatus};
pub use http::{ApiError, ArenaServer, HttpServerConfig, VoteRequest};
