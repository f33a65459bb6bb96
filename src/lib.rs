//! Faceoff - pairwise character voting with ELO ratings
//!
//! Visitors compare two characters and pick a winner (or call a draw). Each
//! vote moves both ratings by the standard ELO update, bumps win/loss/draw
//! counters and is kept as an immutable history record. A leaderboard and a
//! random matchup picker sit on top of the same record store.

pub mod config;
pub mod error;
pub mod metrics;
pub mod rating;
pub mod service;
pub mod storage;
pub mod types;
pub mod utils;
pub mod voting;

// Re-export commonly used types and traits
pub use error::{ArenaError, ArenaResult, Result, VoteStep};
pub use types::*;

// Re-export key components
pub use storage::{ArenaStore, InMemoryArenaStore};
pub use voting::VoteCoordinator;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
