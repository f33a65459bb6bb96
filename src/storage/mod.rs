//! Record store interface
//!
//! The voting core only needs a small CRUD surface from its store: a batched
//! read by id, a per-row update, inserts and sorted listings. Each call is
//! atomic on its own; nothing spans several calls.

pub mod memory;

use crate::error::ArenaResult;
use crate::types::{
    Character, CharacterId, CharacterSort, CharacterUpdate, NewCharacter, NewVote, Vote,
};
use async_trait::async_trait;

pub use memory::InMemoryArenaStore;

/// Trait for character and vote persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArenaStore: Send + Sync {
    /// Fetch the characters with the given ids; unknown ids are omitted and
    /// the order of the result is unspecified
    async fn fetch_characters(&self, ids: &[CharacterId]) -> ArenaResult<Vec<Character>>;

    /// Overwrite rating and counters of one character
    async fn update_character(&self, id: &CharacterId, update: CharacterUpdate)
        -> ArenaResult<()>;

    /// Insert a character, assigning id and timestamps
    async fn insert_character(&self, character: NewCharacter) -> ArenaResult<Character>;

    /// Append a vote record, assigning id and timestamp
    async fn insert_vote(&self, vote: NewVote) -> ArenaResult<Vote>;

    /// List every character in the requested order; ties keep insertion order
    async fn list_characters(&self, sort: CharacterSort) -> ArenaResult<Vec<Character>>;

    /// List votes, newest first
    async fn list_votes(&self, limit: Option<usize>) -> ArenaResult<Vec<Vote>>;

    /// Number of vote records
    async fn count_votes(&self) -> ArenaResult<usize>;
}
