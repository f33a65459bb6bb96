//! Error types for the voting service
//!
//! Core operations (rating, voting, storage) return [`ArenaResult`] so callers
//! can match on the failure kind. Application plumbing uses the anyhow-based
//! [`Result`] alias.

use crate::types::CharacterId;
use std::fmt;

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Result type for core arena operations
pub type ArenaResult<T> = std::result::Result<T, ArenaError>;

/// The write steps of a vote transaction, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteStep {
    UpdateCharacterA,
    UpdateCharacterB,
    InsertVote,
}

impl VoteStep {
    /// Label used for metrics and API responses
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStep::UpdateCharacterA => "update_character_a",
            VoteStep::UpdateCharacterB => "update_character_b",
            VoteStep::InsertVote => "insert_vote",
        }
    }
}

impl fmt::Display for VoteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn describe_steps(steps: &[VoteStep]) -> String {
    if steps.is_empty() {
        return "none".to_string();
    }
    steps
        .iter()
        .map(VoteStep::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Custom error types for specific arena scenarios
#[derive(Debug, thiserror::Error)]
pub enum ArenaError {
    #[error("Character not found: requested {requested:?}, found {found}")]
    NotFound {
        requested: Vec<CharacterId>,
        found: usize,
    },

    #[error("Invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(
        "Persistence failed at {step}: {message} (already committed: {})",
        describe_steps(.committed)
    )]
    Persistence {
        step: VoteStep,
        committed: Vec<VoteStep>,
        message: String,
    },

    #[error("Store read failed: {message}")]
    Store { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}

impl ArenaError {
    /// Wrap a failed write of the vote protocol together with the writes that
    /// already took effect
    pub fn persistence(step: VoteStep, committed: &[VoteStep], source: ArenaError) -> Self {
        ArenaError::Persistence {
            step,
            committed: committed.to_vec(),
            message: source.to_string(),
        }
    }

    /// Whether any side effect of a vote is already in the store
    pub fn has_partial_writes(&self) -> bool {
        matches!(self, ArenaError::Persistence { committed, .. } if !committed.is_empty())
    }
}
