//! Character registration
//!
//! Image upload happens elsewhere; registration receives the finished image
//! reference together with the display name.

use crate::error::{ArenaError, ArenaResult};
use crate::rating::INITIAL_RATING;
use crate::types::{Character, CharacterSubmission, NewCharacter};
use crate::utils::{normalize_image_url, normalize_name};
use crate::voting::coordinator::VoteCoordinator;
use tracing::{info, warn};

impl VoteCoordinator {
    /// Register a new character at the starting rating
    pub async fn register_character(
        &self,
        submission: CharacterSubmission,
    ) -> ArenaResult<Character> {
        let name = normalize_name(&submission.name).ok_or_else(|| {
            warn!("Rejected character registration without a name");
            ArenaError::InvalidInput {
                reason: "Please enter a name".to_string(),
            }
        })?;

        let max = self.settings.max_name_length;
        if name.chars().count() > max {
            warn!("Rejected character name longer than {} characters", max);
            return Err(ArenaError::InvalidInput {
                reason: format!("Name must be at most {} characters", max),
            });
        }

        let character = self
            .store
            .insert_character(NewCharacter {
                name,
                image_url: normalize_image_url(submission.image_url),
                rating: INITIAL_RATING,
            })
            .await?;

        self.metrics_collector.record_character_registered();
        info!(
            "Registered character '{}' ({}) at rating {}",
            character.name, character.id, character.rating
        );

        Ok(character)
    }

    /// Register a batch of characters, stopping at the first invalid one
    pub async fn seed_characters(
        &self,
        submissions: Vec<CharacterSubmission>,
    ) -> ArenaResult<Vec<Character>> {
        let mut registered = Vec::with_capacity(submissions.len());
        for submission in submissions {
            registered.push(self.register_character(submission).await?);
        }
        Ok(registered)
    }
}
