//! In-memory record store
//!
//! Characters and votes live behind `RwLock`s. Every character carries the
//! sequence number of its insertion so listings can break rating ties in a
//! stable order.

use crate::error::{ArenaError, ArenaResult};
use crate::storage::ArenaStore;
use crate::types::{
    Character, CharacterId, CharacterSort, CharacterUpdate, NewCharacter, NewVote, SortKey, Vote,
};
use crate::utils::{current_timestamp, generate_character_id, generate_vote_id};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredCharacter {
    seq: u64,
    character: Character,
}

#[derive(Debug, Default)]
struct CharacterTable {
    rows: HashMap<CharacterId, StoredCharacter>,
    next_seq: u64,
}

/// In-memory store implementation
#[derive(Debug, Default)]
pub struct InMemoryArenaStore {
    characters: RwLock<CharacterTable>,
    votes: RwLock<Vec<Vote>>,
}

impl InMemoryArenaStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_poisoned(table: &str) -> ArenaError {
        ArenaError::InternalError {
            message: format!("Failed to acquire {} lock", table),
        }
    }
}

fn compare(a: &StoredCharacter, b: &StoredCharacter, sort: CharacterSort) -> Ordering {
    let by_key = match sort.key {
        SortKey::Rating => a
            .character
            .rating
            .partial_cmp(&b.character.rating)
            .unwrap_or(Ordering::Equal),
        SortKey::Name => a.character.name.cmp(&b.character.name),
        SortKey::CreatedAt => a.character.created_at.cmp(&b.character.created_at),
    };
    let by_key = if sort.descending {
        by_key.reverse()
    } else {
        by_key
    };
    by_key.then(a.seq.cmp(&b.seq))
}

#[async_trait]
impl ArenaStore for InMemoryArenaStore {
    async fn fetch_characters(&self, ids: &[CharacterId]) -> ArenaResult<Vec<Character>> {
        let table = self
            .characters
            .read()
            .map_err(|_| Self::lock_poisoned("characters read"))?;

        let mut seen = Vec::with_capacity(ids.len());
        let mut result = Vec::with_capacity(ids.len());
        for id in ids {
            if seen.contains(id) {
                continue;
            }
            seen.push(*id);
            if let Some(row) = table.rows.get(id) {
                result.push(row.character.clone());
            }
        }

        Ok(result)
    }

    async fn update_character(
        &self,
        id: &CharacterId,
        update: CharacterUpdate,
    ) -> ArenaResult<()> {
        let mut table = self
            .characters
            .write()
            .map_err(|_| Self::lock_poisoned("characters write"))?;

        let row = table.rows.get_mut(id).ok_or_else(|| ArenaError::NotFound {
            requested: vec![*id],
            found: 0,
        })?;

        row.character.apply(&update);
        row.character.updated_at = current_timestamp();
        Ok(())
    }

    async fn insert_character(&self, character: NewCharacter) -> ArenaResult<Character> {
        let mut table = self
            .characters
            .write()
            .map_err(|_| Self::lock_poisoned("characters write"))?;

        let now = current_timestamp();
        let stored = Character {
            id: generate_character_id(),
            name: character.name,
            image_url: character.image_url,
            rating: character.rating,
            total_votes: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: now,
            updated_at: now,
        };

        let seq = table.next_seq;
        table.next_seq += 1;
        table.rows.insert(
            stored.id,
            StoredCharacter {
                seq,
                character: stored.clone(),
            },
        );

        Ok(stored)
    }

    async fn insert_vote(&self, vote: NewVote) -> ArenaResult<Vote> {
        let mut votes = self
            .votes
            .write()
            .map_err(|_| Self::lock_poisoned("votes write"))?;

        let stored = Vote {
            id: generate_vote_id(),
            character_a_id: vote.character_a_id,
            character_b_id: vote.character_b_id,
            winner_id: vote.winner_id,
            elo_change_a: vote.elo_change_a,
            elo_change_b: vote.elo_change_b,
            elo_before_a: vote.elo_before_a,
            elo_before_b: vote.elo_before_b,
            elo_after_a: vote.elo_after_a,
            elo_after_b: vote.elo_after_b,
            created_at: current_timestamp(),
        };
        votes.push(stored.clone());

        Ok(stored)
    }

    async fn list_characters(&self, sort: CharacterSort) -> ArenaResult<Vec<Character>> {
        let table = self
            .characters
            .read()
            .map_err(|_| Self::lock_poisoned("characters read"))?;

        let mut rows: Vec<&StoredCharacter> = table.rows.values().collect();
        rows.sort_by(|a, b| compare(a, b, sort));

        Ok(rows.into_iter().map(|row| row.character.clone()).collect())
    }

    async fn list_votes(&self, limit: Option<usize>) -> ArenaResult<Vec<Vote>> {
        let votes = self
            .votes
            .read()
            .map_err(|_| Self::lock_poisoned("votes read"))?;

        let limit = limit.unwrap_or(votes.len());
        Ok(votes.iter().rev().take(limit).cloned().collect())
    }

    async fn count_votes(&self) -> ArenaResult<usize> {
        let votes = self
            .votes
            .read()
            .map_err(|_| Self::lock_poisoned("votes read"))?;

        Ok(votes.len())
    }
}
