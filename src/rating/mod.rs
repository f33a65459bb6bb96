//! Rating engine for pairwise comparisons
//!
//! This module provides the ELO expected-score model, outcome resolution and
//! the rating update applied after every vote.

pub mod elo;

// Re-export commonly used items
pub use elo::{
    apply_rating_change, expected_score, resolve_outcome, round_to_hundredths, EloUpdate,
    INITIAL_RATING, K_FACTOR,
};
