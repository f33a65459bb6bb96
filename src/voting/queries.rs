//! Read-side operations: leaderboard, random matchups and vote history

use crate::error::ArenaResult;
use crate::types::{Character, CharacterSort, Matchup, Vote};
use crate::voting::coordinator::VoteCoordinator;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

/// Pick two distinct characters from an unweighted random permutation of
/// the whole set
pub fn pick_matchup<R: Rng + ?Sized>(mut characters: Vec<Character>, rng: &mut R) -> Matchup {
    if characters.len() < 2 {
        return Matchup::Unavailable;
    }

    characters.shuffle(rng);
    let mut shuffled = characters.into_iter();
    match (shuffled.next(), shuffled.next()) {
        (Some(first), Some(second)) => Matchup::Available { first, second },
        _ => Matchup::Unavailable,
    }
}

impl VoteCoordinator {
    /// All characters, highest rating first
    pub async fn leaderboard(&self) -> ArenaResult<Vec<Character>> {
        let characters = self
            .store
            .list_characters(CharacterSort::rating_desc())
            .await?;

        self.metrics_collector.set_character_count(characters.len());
        Ok(characters)
    }

    /// Two random characters to compare. Consecutive calls may return the
    /// same pair.
    pub async fn random_matchup(&self) -> ArenaResult<Matchup> {
        let characters = self
            .store
            .list_characters(CharacterSort::rating_desc())
            .await?;
        let pool = characters.len();

        let matchup = pick_matchup(characters, &mut rand::rng());

        debug!(
            "Matchup requested from {} characters: available={}",
            pool,
            matchup.is_available()
        );
        self.metrics_collector.record_matchup(matchup.is_available());
        Ok(matchup)
    }

    /// Most recent votes, newest first; the configured default applies when
    /// no limit is given
    pub async fn recent_votes(&self, limit: Option<usize>) -> ArenaResult<Vec<Vote>> {
        let limit = limit.unwrap_or(self.settings.default_history_limit);
        self.store.list_votes(Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::INITIAL_RATING;
    use crate::storage::{ArenaStore, InMemoryArenaStore};
    use crate::types::NewCharacter;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::sync::Arc;
    use uuid::Uuid;

    fn character(name: &str) -> Character {
        let now = Utc::now();
        Character {
            id: Uuid::new_v4(),
            name: name.to_string(),
            image_url: None,
            rating: INITIAL_RATING,
            total_votes: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_pick_matchup_needs_two_characters() {
        let mut rng = StdRng::seed_from_u64(7);

        assert!(!pick_matchup(Vec::new(), &mut rng).is_available());
        assert!(!pick_matchup(vec![character("Solo")], &mut rng).is_available());
        assert!(pick_matchup(vec![character("A"), character("B")], &mut rng).is_available());
    }

    #[test]
    fn test_pick_matchup_returns_distinct_characters() {
        let mut rng = StdRng::seed_from_u64(42);
        let pool: Vec<Character> = (0..6).map(|i| character(&format!("C{i}"))).collect();

        for _ in 0..50 {
            match pick_matchup(pool.clone(), &mut rng) {
                Matchup::Available { first, second } => assert_ne!(first.id, second.id),
                Matchup::Unavailable => panic!("pool has six characters"),
            }
        }
    }

    #[test]
    fn test_pick_matchup_reaches_every_character() {
        let mut rng = StdRng::seed_from_u64(1234);
        let pool: Vec<Character> = (0..5).map(|i| character(&format!("C{i}"))).collect();

        let mut seen = HashSet::new();
        for _ in 0..200 {
            if let Matchup::Available { first, second } = pick_matchup(pool.clone(), &mut rng) {
                seen.insert(first.id);
                seen.insert(second.id);
            }
        }
        assert_eq!(seen.len(), pool.len());
    }

    #[tokio::test]
    async fn test_empty_store() {
        let coordinator = VoteCoordinator::new(Arc::new(InMemoryArenaStore::new()));

        assert!(coordinator.leaderboard().await.unwrap().is_empty());
        assert!(!coordinator.random_matchup().await.unwrap().is_available());
        assert!(coordinator.recent_votes(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_single_character_matchup_unavailable() {
        let store = Arc::new(InMemoryArenaStore::new());
        store
            .insert_character(NewCharacter {
                name: "Lonely".to_string(),
                image_url: None,
                rating: INITIAL_RATING,
            })
            .await
            .unwrap();

        let coordinator = VoteCoordinator::new(store);
        let matchup = coordinator.random_matchup().await.unwrap();
        assert!(matches!(matchup, Matchup::Unavailable));
        assert_eq!(
            coordinator
                .metrics()
                .roster()
                .matchups_total
                .with_label_values(&["unavailable"])
                .get(),
            1
        );
    }

    #[tokio::test]
    async fn test_leaderboard_is_sorted_by_rating() {
        let store = Arc::new(InMemoryArenaStore::new());
        for (name, rating) in [("Mid", 1500.0), ("Top", 1650.0), ("Low", 1320.5)] {
            store
                .insert_character(NewCharacter {
                    name: name.to_string(),
                    image_url: None,
                    rating,
                })
                .await
                .unwrap();
        }

        let coordinator = VoteCoordinator::new(store);
        let names: Vec<String> = coordinator
            .leaderboard()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Top", "Mid", "Low"]);
        assert_eq!(coordinator.metrics().roster().characters.get(), 3);
    }
}
