//! Vote transaction coordinator
//!
//! Applies one rating update per vote against the record store. The store
//! has no multi-row transactions, so the protocol runs as a fixed sequence of
//! single-row calls and reports exactly which writes took effect when a later
//! one fails. Nothing is retried or rolled back.

use crate::config::VotingSettings;
use crate::error::{ArenaError, ArenaResult, VoteStep};
use crate::metrics::MetricsCollector;
use crate::rating::{apply_rating_change, resolve_outcome};
use crate::storage::ArenaStore;
use crate::types::{
    Character, CharacterId, EloChanges, NewVote, Outcome, RatingMovement, SideResult, VoteReceipt,
};
use crate::utils::current_timestamp;
use crate::voting::locks::CharacterLocks;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Coordinates votes, matchups, the leaderboard and registration over a store
#[derive(Clone)]
pub struct VoteCoordinator {
    /// Record store holding characters and votes
    pub(crate) store: Arc<dyn ArenaStore>,
    /// Per-character locks, present when votes are serialized
    locks: Option<Arc<CharacterLocks>>,
    /// Voting settings
    pub(crate) settings: VotingSettings,
    /// Metrics collector for recording vote outcomes
    pub(crate) metrics_collector: Arc<MetricsCollector>,
}

impl VoteCoordinator {
    /// Create a coordinator with default settings
    pub fn new(store: Arc<dyn ArenaStore>) -> Self {
        Self::with_settings(store, VotingSettings::default())
    }

    /// Create a coordinator with explicit settings
    pub fn with_settings(store: Arc<dyn ArenaStore>, settings: VotingSettings) -> Self {
        let metrics_collector = Arc::new(MetricsCollector::new().unwrap_or_else(|_| {
            warn!("Failed to create metrics collector, using default");
            MetricsCollector::default()
        }));

        Self::with_metrics(store, settings, metrics_collector)
    }

    /// Create a coordinator with explicit settings and metrics collector
    pub fn with_metrics(
        store: Arc<dyn ArenaStore>,
        settings: VotingSettings,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        let locks = if settings.serialize_votes {
            Some(Arc::new(CharacterLocks::new()))
        } else {
            None
        };

        Self {
            store,
            locks,
            settings,
            metrics_collector,
        }
    }

    /// The underlying record store
    pub fn store(&self) -> Arc<dyn ArenaStore> {
        self.store.clone()
    }

    /// The metrics collector votes are recorded into
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics_collector.clone()
    }

    /// Whether votes sharing a character are serialized
    pub fn serializes_votes(&self) -> bool {
        self.locks.is_some()
    }

    /// Process a vote given as a tagged outcome
    pub async fn process_outcome(
        &self,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
        outcome: Outcome,
    ) -> ArenaResult<VoteReceipt> {
        let winner_id = outcome.winner_id(character_a_id, character_b_id);
        self.process_vote(character_a_id, character_b_id, winner_id)
            .await
    }

    /// Process a vote where `winner_id` is one of the participants, or `None`
    /// for a draw
    pub async fn process_vote(
        &self,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
        winner_id: Option<CharacterId>,
    ) -> ArenaResult<VoteReceipt> {
        let timer = self.metrics_collector.start_timer();

        let result = self
            .run_vote(character_a_id, character_b_id, winner_id)
            .await;

        match &result {
            Ok(receipt) => {
                if let Ok(outcome) =
                    Outcome::from_winner(receipt.vote.winner_id, character_a_id, character_b_id)
                {
                    self.metrics_collector.record_vote(outcome, timer.stop());
                }
            }
            Err(e) => {
                self.metrics_collector
                    .record_vote_failure(failure_stage(e), e.has_partial_writes());
            }
        }

        result
    }

    async fn run_vote(
        &self,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
        winner_id: Option<CharacterId>,
    ) -> ArenaResult<VoteReceipt> {
        let outcome = Outcome::from_winner(winner_id, character_a_id, character_b_id)
            .inspect_err(|e| warn!("Rejected vote: {}", e))?;

        if character_a_id == character_b_id {
            warn!("Rejected vote of character {} against itself", character_a_id);
            return Err(ArenaError::NotFound {
                requested: vec![character_a_id, character_b_id],
                found: 1,
            });
        }

        let _guard = match &self.locks {
            Some(locks) => Some(locks.acquire_pair(character_a_id, character_b_id).await),
            None => None,
        };

        // Step 1: both characters in one read
        let (character_a, character_b) = self
            .fetch_pair(character_a_id, character_b_id)
            .await?;

        // Step 2-3: rating update
        let result_a = resolve_outcome(winner_id.as_ref(), &character_a_id);
        let update = apply_rating_change(character_a.rating, character_b.rating, result_a);

        // Step 4: counters, complementary by construction
        let patch_a = character_a.scored(update.new_rating_a, SideResult::from_score(result_a));
        let patch_b =
            character_b.scored(update.new_rating_b, SideResult::from_score(1.0 - result_a));

        debug!(
            "Vote {} vs {} ({}): {:.2} -> {:.2}, {:.2} -> {:.2}",
            character_a_id,
            character_b_id,
            outcome,
            character_a.rating,
            update.new_rating_a,
            character_b.rating,
            update.new_rating_b
        );

        let mut committed: Vec<VoteStep> = Vec::with_capacity(2);

        // Step 5
        self.store
            .update_character(&character_a_id, patch_a.clone())
            .await
            .map_err(|e| step_failed(VoteStep::UpdateCharacterA, &committed, e))?;
        committed.push(VoteStep::UpdateCharacterA);

        // Step 6
        self.store
            .update_character(&character_b_id, patch_b.clone())
            .await
            .map_err(|e| step_failed(VoteStep::UpdateCharacterB, &committed, e))?;
        committed.push(VoteStep::UpdateCharacterB);

        // Step 7
        let vote = self
            .store
            .insert_vote(NewVote {
                character_a_id,
                character_b_id,
                winner_id,
                elo_change_a: update.delta_a,
                elo_change_b: update.delta_b,
                elo_before_a: character_a.rating,
                elo_before_b: character_b.rating,
                elo_after_a: update.new_rating_a,
                elo_after_b: update.new_rating_b,
            })
            .await
            .map_err(|e| step_failed(VoteStep::InsertVote, &committed, e))?;

        info!(
            "Vote {} recorded - {} vs {}: {} ({:+.2} / {:+.2})",
            vote.id, character_a.name, character_b.name, outcome, update.delta_a, update.delta_b
        );

        let elo_changes = EloChanges {
            character_a: RatingMovement {
                before: character_a.rating,
                after: update.new_rating_a,
                change: update.delta_a,
            },
            character_b: RatingMovement {
                before: character_b.rating,
                after: update.new_rating_b,
                change: update.delta_b,
            },
        };

        let now = current_timestamp();
        let mut character_a = character_a;
        character_a.apply(&patch_a);
        character_a.updated_at = now;
        let mut character_b = character_b;
        character_b.apply(&patch_b);
        character_b.updated_at = now;

        Ok(VoteReceipt {
            vote,
            character_a,
            character_b,
            elo_changes,
        })
    }

    async fn fetch_pair(
        &self,
        character_a_id: CharacterId,
        character_b_id: CharacterId,
    ) -> ArenaResult<(Character, Character)> {
        let requested = vec![character_a_id, character_b_id];
        let fetched = self.store.fetch_characters(&requested).await?;

        if fetched.len() != 2 {
            warn!(
                "Expected 2 characters for vote, store returned {}",
                fetched.len()
            );
            return Err(ArenaError::NotFound {
                found: fetched.len(),
                requested,
            });
        }

        let find = |id: CharacterId| fetched.iter().find(|c| c.id == id).cloned();
        match (find(character_a_id), find(character_b_id)) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(ArenaError::NotFound {
                found: fetched.len(),
                requested,
            }),
        }
    }
}

fn step_failed(step: VoteStep, committed: &[VoteStep], source: ArenaError) -> ArenaError {
    if committed.is_empty() {
        error!("Vote aborted at {}: {}", step, source);
    } else {
        error!(
            "Vote aborted at {} after partial writes {:?}: {}",
            step, committed, source
        );
    }
    ArenaError::persistence(step, committed, source)
}

fn failure_stage(err: &ArenaError) -> &'static str {
    match err {
        ArenaError::InvalidInput { .. } => "invalid_input",
        ArenaError::NotFound { .. } => "not_found",
        ArenaError::Persistence { step, .. } => step.as_str(),
        ArenaError::Store { .. } => "fetch",
        ArenaError::Configuration { .. } | ArenaError::InternalError { .. } => "internal",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockArenaStore;
    use crate::types::Vote;
    use chrono::Utc;
    use uuid::Uuid;

    fn character(name: &str, rating: f64) -> Character {
        let now = Utc::now();
        Character {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: None,
            rating,
            total_votes: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn stored_vote(new_vote: NewVote) -> Vote {
        Vote {
            id: Uuid::new_v4(),
            character_a_id: new_vote.character_a_id,
            character_b_id: new_vote.character_b_id,
            winner_id: new_vote.winner_id,
            elo_change_a: new_vote.elo_change_a,
            elo_change_b: new_vote.elo_change_b,
            elo_before_a: new_vote.elo_before_a,
            elo_before_b: new_vote.elo_before_b,
            elo_after_a: new_vote.elo_after_a,
            elo_after_b: new_vote.elo_after_b,
            created_at: Utc::now(),
        }
    }

    fn store_error() -> ArenaError {
        ArenaError::Store {
            message: "connection reset".to_string(),
        }
    }

    fn coordinator(store: MockArenaStore) -> VoteCoordinator {
        VoteCoordinator::new(Arc::new(store))
    }

    fn expect_fetch(store: &mut MockArenaStore, characters: Vec<Character>) {
        store
            .expect_fetch_characters()
            .times(1)
            .returning(move |_| Ok(characters.clone()));
    }

    #[tokio::test]
    async fn test_invalid_winner_never_touches_store() {
        let store = MockArenaStore::new();
        let coordinator = coordinator(store);

        let err = coordinator
            .process_vote(Uuid::new_v4(), Uuid::new_v4(), Some(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, ArenaError::InvalidInput { .. }));
        assert_eq!(
            coordinator
                .metrics()
                .votes()
                .vote_failures_total
                .with_label_values(&["invalid_input"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_same_character_twice_is_not_found() {
        let store = MockArenaStore::new();
        let coordinator = coordinator(store);
        let id = Uuid::new_v4();

        let err = coordinator.process_vote(id, id, Some(id)).await.unwrap_err();
        assert!(matches!(err, ArenaError::NotFound { found: 1, .. }));
    }

    #[tokio::test]
    async fn test_missing_character_is_not_found() {
        let a = character("A", 1500.0);
        let b_id = Uuid::new_v4();

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![a.clone()]);
        store.expect_update_character().never();
        store.expect_insert_vote().never();

        let err = coordinator(store)
            .process_vote(a.id, b_id, Some(a.id))
            .await
            .unwrap_err();

        match err {
            ArenaError::NotFound { requested, found } => {
                assert_eq!(requested, vec![a.id, b_id]);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_pair_from_store_is_not_found() {
        let a = character("A", 1500.0);
        let b = character("B", 1500.0);
        let stranger = character("C", 1500.0);

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![a.clone(), stranger]);
        store.expect_update_character().never();

        let err = coordinator(store)
            .process_vote(a.id, b.id, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::NotFound { found: 2, .. }));
    }

    #[tokio::test]
    async fn test_fetch_failure_passes_through() {
        let mut store = MockArenaStore::new();
        store
            .expect_fetch_characters()
            .times(1)
            .returning(|_| Err(store_error()));
        store.expect_update_character().never();

        let err = coordinator(store)
            .process_vote(Uuid::new_v4(), Uuid::new_v4(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ArenaError::Store { .. }));
    }

    #[tokio::test]
    async fn test_first_update_failure_commits_nothing() {
        let a = character("A", 1500.0);
        let b = character("B", 1500.0);

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![b.clone(), a.clone()]);
        store
            .expect_update_character()
            .times(1)
            .returning(|_, _| Err(store_error()));
        store.expect_insert_vote().never();

        let err = coordinator(store)
            .process_vote(a.id, b.id, Some(a.id))
            .await
            .unwrap_err();

        match err {
            ArenaError::Persistence {
                step, committed, ..
            } => {
                assert_eq!(step, VoteStep::UpdateCharacterA);
                assert!(committed.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_second_update_failure_reports_first_write() {
        let a = character("A", 1500.0);
        let b = character("B", 1500.0);
        let a_id = a.id;

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![a.clone(), b.clone()]);
        store
            .expect_update_character()
            .times(2)
            .returning(move |id, _| {
                if *id == a_id {
                    Ok(())
                } else {
                    Err(store_error())
                }
            });
        store.expect_insert_vote().never();

        let coordinator = coordinator(store);
        let err = coordinator
            .process_vote(a.id, b.id, Some(b.id))
            .await
            .unwrap_err();

        match &err {
            ArenaError::Persistence {
                step, committed, ..
            } => {
                assert_eq!(*step, VoteStep::UpdateCharacterB);
                assert_eq!(committed, &vec![VoteStep::UpdateCharacterA]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            coordinator.metrics().votes().partial_writes_total.get(),
            1
        );
    }

    #[tokio::test]
    async fn test_vote_insert_failure_reports_both_updates() {
        let a = character("A", 1500.0);
        let b = character("B", 1500.0);

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![a.clone(), b.clone()]);
        store
            .expect_update_character()
            .times(2)
            .returning(|_, _| Ok(()));
        store
            .expect_insert_vote()
            .times(1)
            .returning(|_| Err(store_error()));

        let err = coordinator(store)
            .process_vote(a.id, b.id, None)
            .await
            .unwrap_err();

        match err {
            ArenaError::Persistence {
                step, committed, ..
            } => {
                assert_eq!(step, VoteStep::InsertVote);
                assert_eq!(
                    committed,
                    vec![VoteStep::UpdateCharacterA, VoteStep::UpdateCharacterB]
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_successful_vote_writes_expected_records() {
        let a = character("A", 1500.0);
        let b = character("B", 1500.0);
        let (a_id, b_id) = (a.id, b.id);

        let mut store = MockArenaStore::new();
        expect_fetch(&mut store, vec![b.clone(), a.clone()]);
        store
            .expect_update_character()
            .withf(move |id, update| {
                (*id == a_id && update.rating == 1516.0 && update.wins == 1 && update.losses == 0)
                    || (*id == b_id
                        && update.rating == 1484.0
                        && update.losses == 1
                        && update.wins == 0)
            })
            .times(2)
            .returning(|_, _| Ok(()));
        store
            .expect_insert_vote()
            .withf(move |vote| {
                vote.winner_id == Some(a_id)
                    && vote.elo_before_a == 1500.0
                    && vote.elo_after_a == 1516.0
                    && vote.elo_change_a == 16.0
                    && vote.elo_after_b == 1484.0
                    && vote.elo_change_b == -16.0
            })
            .times(1)
            .returning(|vote| Ok(stored_vote(vote)));

        let coordinator = coordinator(store);
        let receipt = coordinator
            .process_outcome(a_id, b_id, Outcome::WinA)
            .await
            .unwrap();

        assert_eq!(receipt.character_a.rating, 1516.0);
        assert_eq!(receipt.character_b.rating, 1484.0);
        assert_eq!(receipt.character_a.total_votes, 1);
        assert_eq!(receipt.elo_changes.character_b.change, -16.0);
        assert_eq!(
            coordinator
                .metrics()
                .votes()
                .votes_total
                .with_label_values(&["win_a"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_lock_table_drains_after_votes() {
        use crate::storage::{ArenaStore, InMemoryArenaStore};
        use crate::types::NewCharacter;

        let store = Arc::new(InMemoryArenaStore::new());
        let coordinator = VoteCoordinator::new(store.clone());
        let locks = coordinator.locks.clone().expect("votes are serialized by default");

        for _ in 0..1000 {
            let err = coordinator
                .process_vote(Uuid::new_v4(), Uuid::new_v4(), None)
                .await
                .unwrap_err();
            assert!(matches!(err, ArenaError::NotFound { found: 0, .. }));
        }
        assert_eq!(locks.tracked(), 0);

        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let character = store
                .insert_character(NewCharacter {
                    name: name.to_string(),
                    image_url: None,
                    rating: 1500.0,
                })
                .await
                .unwrap();
            ids.push(character.id);
        }
        coordinator
            .process_vote(ids[0], ids[1], Some(ids[1]))
            .await
            .unwrap();
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_failure_stage_labels() {
        assert_eq!(
            failure_stage(&ArenaError::InvalidInput {
                reason: "x".to_string()
            }),
            "invalid_input"
        );
        assert_eq!(
            failure_stage(&ArenaError::persistence(
                VoteStep::UpdateCharacterB,
                &[VoteStep::UpdateCharacterA],
                store_error()
            )),
            "update_character_b"
        );
    }
}
