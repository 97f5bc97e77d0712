//! Pairwise Elo scoring and the rating store interface
//!
//! This module provides the Elo update rule used by tournament sessions and
//! the store abstraction sessions hydrate from and flush to.

pub mod elo;
pub mod store;

// Re-export commonly used types
pub use elo::{expected_score, update_ratings, EloEngine, EloUpdate, DEFAULT_K_FACTOR};
pub use store::{InMemoryRatingStore, RatingStore};
