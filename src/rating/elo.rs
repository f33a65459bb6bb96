//! ELO rating engine
//!
//! Pure functions turning two ratings and a result into updated ratings.
//! Each of the four outputs is rounded to hundredths on its own, so the two
//! deltas of a vote do not always cancel out exactly.

use crate::types::CharacterId;
use serde::{Deserialize, Serialize};
use skillratings::elo::EloRating;

/// Sensitivity of a single comparison
pub const K_FACTOR: f64 = 32.0;

/// Rating given to every newly registered character
pub const INITIAL_RATING: f64 = 1500.0;

/// Updated ratings and deltas for both sides of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloUpdate {
    pub new_rating_a: f64,
    pub new_rating_b: f64,
    pub delta_a: f64,
    pub delta_b: f64,
}

/// Probability that `rating_self` beats `rating_opponent`
pub fn expected_score(rating_self: f64, rating_opponent: f64) -> f64 {
    let (expected, _) = skillratings::elo::expected_score(
        &EloRating {
            rating: rating_self,
        },
        &EloRating {
            rating: rating_opponent,
        },
    );
    expected
}

/// Map a winner designation to the score of `id_self`.
///
/// `None` is a draw (0.5). Any id other than `id_self` counts as a loss, so
/// callers must validate the winner against both participants first.
pub fn resolve_outcome(winner_id: Option<&CharacterId>, id_self: &CharacterId) -> f64 {
    match winner_id {
        None => 0.5,
        Some(winner) if winner == id_self => 1.0,
        Some(_) => 0.0,
    }
}

/// Compute new ratings after a comparison where A scored `result_a`.
///
/// B's score is always `1 - result_a`.
pub fn apply_rating_change(rating_a: f64, rating_b: f64, result_a: f64) -> EloUpdate {
    let expected_a = expected_score(rating_a, rating_b);
    let expected_b = 1.0 - expected_a;

    let new_rating_a = rating_a + K_FACTOR * (result_a - expected_a);
    let new_rating_b = rating_b + K_FACTOR * ((1.0 - result_a) - expected_b);

    EloUpdate {
        new_rating_a: round_to_hundredths(new_rating_a),
        new_rating_b: round_to_hundredths(new_rating_b),
        delta_a: round_to_hundredths(new_rating_a - rating_a),
        delta_b: round_to_hundredths(new_rating_b - rating_b),
    }
}

/// Round half away from zero at the hundredths digit
pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
