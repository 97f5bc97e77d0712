//! Utility functions for the ranking engine

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique tournament session ID
pub fn generate_session_id() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new unique rank ID
pub fn generate_rank_id() -> Uuid {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two scores
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}

/// Map a distance onto a 0-100 similarity, reaching 0 at `scale`
pub fn bounded_similarity(distance: f64, scale: f64) -> f64 {
    (100.0 - distance / scale * 100.0).max(0.0)
}

/// Case-insensitive, whitespace-trimmed label comparison
pub fn labels_match(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_session_id();
        let id2 = generate_session_id();
        assert_ne!(id1, id2);

        let rank_id1 = generate_rank_id();
        let rank_id2 = generate_rank_id();
        assert_ne!(rank_id1, rank_id2);
    }

    #[test]
    fn test_rating_difference() {
        assert_eq!(rating_difference(1300.0, 1200.0), 100.0);
        assert_eq!(rating_difference(1200.0, 1300.0), 100.0);
        assert_eq!(rating_difference(1200.0, 1200.0), 0.0);
    }

    #[test]
    fn test_bounded_similarity() {
        assert_eq!(bounded_similarity(0.0, 800.0), 100.0);
        assert_eq!(bounded_similarity(80.0, 800.0), 90.0);
        assert_eq!(bounded_similarity(800.0, 800.0), 0.0);
        assert_eq!(bounded_similarity(1600.0, 800.0), 0.0);
    }

    #[test]
    fn test_labels_match() {
        assert!(labels_match("S", " s "));
        assert!(!labels_match("S", "A"));
    }
}
