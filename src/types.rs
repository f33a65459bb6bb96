//! Common types used throughout the voting service

use crate::error::{ArenaError, ArenaResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for characters
pub type CharacterId = Uuid;

/// Unique identifier for votes
pub type VoteId = Uuid;

/// A votable character as stored in the record store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub name: String,
    pub image_url: Option<String>,
    pub rating: f64,
    pub total_votes: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Character {
    /// Whether the outcome counters add up to the vote total
    pub fn counters_consistent(&self) -> bool {
        self.total_votes == self.wins + self.losses + self.draws
    }

    /// Build the patch that records one more comparison for this character
    pub fn scored(&self, new_rating: f64, result: SideResult) -> CharacterUpdate {
        let mut update = CharacterUpdate {
            rating: new_rating,
            total_votes: self.total_votes + 1,
            wins: self.wins,
            losses: self.losses,
            draws: self.draws,
        };
        match result {
            SideResult::Win => update.wins += 1,
            SideResult::Loss => update.losses += 1,
            SideResult::Draw => update.draws += 1,
        }
        update
    }

    /// Apply a patch to a local copy
    pub fn apply(&mut self, update: &CharacterUpdate) {
        self.rating = update.rating;
        self.total_votes = update.total_votes;
        self.wins = update.wins;
        self.losses = update.losses;
        self.draws = update.draws;
    }
}

/// Insert payload for a new character; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCharacter {
    pub name: String,
    pub image_url: Option<String>,
    pub rating: f64,
}

/// Registration request as submitted by a client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterSubmission {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Rating and counter patch written after a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterUpdate {
    pub rating: f64,
    pub total_votes: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
}

/// Sort key for listing characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Rating,
    Name,
    CreatedAt,
}

/// Ordering requested from the store when listing characters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSort {
    pub key: SortKey,
    pub descending: bool,
}

impl CharacterSort {
    /// Highest rating first
    pub fn rating_desc() -> Self {
        Self {
            key: SortKey::Rating,
            descending: true,
        }
    }
}

/// Result of a comparison between character A and character B
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    WinA,
    WinB,
    Draw,
}

impl Outcome {
    /// Interpret a winner id against the two participants; `None` is a draw
    pub fn from_winner(
        winner_id: Option<CharacterId>,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
    ) -> ArenaResult<Self> {
        match winner_id {
            None => Ok(Outcome::Draw),
            Some(id) if id == character_a_id => Ok(Outcome::WinA),
            Some(id) if id == character_b_id => Ok(Outcome::WinB),
            Some(id) => Err(ArenaError::InvalidInput {
                reason: format!(
                    "winner {} is neither {} nor {}",
                    id, character_a_id, character_b_id
                ),
            }),
        }
    }

    /// The winner id as persisted on the vote record
    pub fn winner_id(
        &self,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
    ) -> Option<CharacterId> {
        match self {
            Outcome::WinA => Some(character_a_id),
            Outcome::WinB => Some(character_b_id),
            Outcome::Draw => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::WinA => "win_a",
            Outcome::WinB => "win_b",
            Outcome::Draw => "draw",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a comparison from one character's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideResult {
    Win,
    Loss,
    Draw,
}

impl SideResult {
    /// Interpret a rating score: 1.0 is a win, 0.0 a loss, anything else a draw
    pub fn from_score(score: f64) -> Self {
        if score == 1.0 {
            SideResult::Win
        } else if score == 0.0 {
            SideResult::Loss
        } else {
            SideResult::Draw
        }
    }
}

/// Insert payload for a vote record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewVote {
    pub character_a_id: CharacterId,
    pub character_b_id: CharacterId,
    pub winner_id: Option<CharacterId>,
    pub elo_change_a: f64,
    pub elo_change_b: f64,
    pub elo_before_a: f64,
    pub elo_before_b: f64,
    pub elo_after_a: f64,
    pub elo_after_b: f64,
}

/// Immutable record of one processed vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub character_a_id: CharacterId,
    pub character_b_id: CharacterId,
    pub winner_id: Option<CharacterId>,
    pub elo_change_a: f64,
    pub elo_change_b: f64,
    pub elo_before_a: f64,
    pub elo_before_b: f64,
    pub elo_after_a: f64,
    pub elo_after_b: f64,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    /// Whether the given character took part in this vote
    pub fn involves(&self, character_id: &CharacterId) -> bool {
        &self.character_a_id == character_id || &self.character_b_id == character_id
    }
}

/// Rating movement of one side of a vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingMovement {
    pub before: f64,
    pub after: f64,
    pub change: f64,
}

/// Rating movement of both sides of a vote
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloChanges {
    pub character_a: RatingMovement,
    pub character_b: RatingMovement,
}

/// Everything a caller needs to display the effect of a vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub vote: Vote,
    pub character_a: Character,
    pub character_b: Character,
    pub elo_changes: EloChanges,
}

/// Two characters to compare, or the signal that there are not enough
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Matchup {
    Available { first: Character, second: Character },
    Unavailable,
}

impl Matchup {
    pub fn is_available(&self) -> bool {
        matches!(self, Matchup::Available { .. })
    }
}
