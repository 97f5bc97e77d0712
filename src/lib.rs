//! Taste Engine - pairwise ranking and taste analytics for personal collections
//!
//! This crate provides Elo scoring of head-to-head comparisons, tournament
//! sessions that choose which items to compare next, per-category custom
//! tier definitions, and analytics over a user's rated collection.

pub mod analytics;
pub mod config;
pub mod error;
pub mod matchmaking;
pub mod ranks;
pub mod rating;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{EngineError, Result};
pub use types::*;

// Re-export key components
pub use matchmaking::{Matchmaker, TournamentSession};
pub use ranks::{CustomRankRegistry, KeywordLabelClassifier, LabelClassifier};
pub use rating::{EloEngine, InMemoryRatingStore, RatingStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
