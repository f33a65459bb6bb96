//! Vote processing
//!
//! This module provides the vote transaction coordinator, the read-side
//! queries (leaderboard, random matchups, history), character registration
//! and the per-character locks that serialize votes.

pub mod coordinator;
pub mod locks;
pub mod queries;
pub mod registration;

// Re-export commonly used types
pub use coordinator::VoteCoordinator;
pub use locks::{CharacterLocks, PairGuard};
pub use queries::pick_matchup;
