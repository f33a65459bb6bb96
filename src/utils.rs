//! Utility functions for the voting service

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique character ID
pub fn generate_character_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique vote ID
pub fn generate_vote_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Trim a display name; `None` when nothing is left
pub fn normalize_name(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Treat blank image references as absent
pub fn normalize_image_url(url: Option<String>) -> Option<String> {
    url.map(|u| u.trim().to_string()).filter(|u| !u.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_character_id();
        let id2 = generate_character_id();
        assert_ne!(id1, id2);

        let vote_id1 = generate_vote_id();
        let vote_id2 = generate_vote_id();
        assert_ne!(vote_id1, vote_id2);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Pikachu "), Some("Pikachu".to_string()));
        assert_eq!(normalize_name("   "), None);
        assert_eq!(normalize_name(""), None);
    }

    #[test]
    fn test_normalize_image_url() {
        assert_eq!(
            normalize_image_url(Some(" https://cdn.example/a.png ".to_string())),
            Some("https://cdn.example/a.png".to_string())
        );
        assert_eq!(normalize_image_url(Some("  ".to_string())), None);
        assert_eq!(normalize_image_url(None), None);
    }
}
