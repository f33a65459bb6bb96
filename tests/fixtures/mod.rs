//! Test fixtures and store wrappers for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use faceoff::error::{ArenaError, ArenaResult};
use faceoff::storage::{ArenaStore, InMemoryArenaStore};
use faceoff::types::{
    Character, CharacterId, CharacterSort, CharacterUpdate, NewCharacter, NewVote, Vote,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Store call that should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePoint {
    /// The batched character read
    Fetch,
    /// The nth `update_character` call, counting from 1
    Update(usize),
    /// The vote insert
    InsertVote,
}

/// In-memory store that fails one chosen call and can yield to the
/// scheduler before every operation
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemoryArenaStore,
    failure: Option<FailurePoint>,
    yielding: bool,
    updates: AtomicUsize,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail at the given call
    pub fn failing_at(failure: FailurePoint) -> Self {
        Self {
            failure: Some(failure),
            ..Self::default()
        }
    }

    /// Yield before every call so concurrent votes interleave
    pub fn yielding() -> Self {
        Self {
            yielding: true,
            ..Self::default()
        }
    }

    async fn pause(&self) {
        if self.yielding {
            tokio::task::yield_now().await;
        }
    }

    fn injected(what: &str) -> ArenaError {
        ArenaError::Store {
            message: format!("injected {} failure", what),
        }
    }
}

#[async_trait]
impl ArenaStore for FaultyStore {
    async fn fetch_characters(&self, ids: &[CharacterId]) -> ArenaResult<Vec<Character>> {
        self.pause().await;
        if self.failure == Some(FailurePoint::Fetch) {
            return Err(Self::injected("fetch"));
        }
        self.inner.fetch_characters(ids).await
    }

    async fn update_character(
        &self,
        id: &CharacterId,
        update: CharacterUpdate,
    ) -> ArenaResult<()> {
        self.pause().await;
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.failure == Some(FailurePoint::Update(call)) {
            return Err(Self::injected("update"));
        }
        self.inner.update_character(id, update).await
    }

    async fn insert_character(&self, character: NewCharacter) -> ArenaResult<Character> {
        self.inner.insert_character(character).await
    }

    async fn insert_vote(&self, vote: NewVote) -> ArenaResult<Vote> {
        self.pause().await;
        if self.failure == Some(FailurePoint::InsertVote) {
            return Err(Self::injected("insert"));
        }
        self.inner.insert_vote(vote).await
    }

    async fn list_characters(&self, sort: CharacterSort) -> ArenaResult<Vec<Character>> {
        self.inner.list_characters(sort).await
    }

    async fn list_votes(&self, limit: Option<usize>) -> ArenaResult<Vec<Vote>> {
        self.inner.list_votes(limit).await
    }

    async fn count_votes(&self) -> ArenaResult<usize> {
        self.inner.count_votes().await
    }
}

/// Insert a character with a chosen starting rating
pub async fn add_character(store: &dyn ArenaStore, name: &str, rating: f64) -> Character {
    store
        .insert_character(NewCharacter {
            name: name.to_string(),
            image_url: None,
            rating,
        })
        .await
        .expect("insert character")
}

/// Read one character back from the store
pub async fn reload(store: &dyn ArenaStore, id: CharacterId) -> Character {
    store
        .fetch_characters(&[id])
        .await
        .expect("fetch character")
        .pop()
        .expect("character exists")
}

/// A store handle usable both as the concrete type and as a trait object
pub fn shared<S: ArenaStore + 'static>(store: S) -> (Arc<S>, Arc<dyn ArenaStore>) {
    let concrete = Arc::new(store);
    let erased: Arc<dyn ArenaStore> = concrete.clone();
    (concrete, erased)
}
