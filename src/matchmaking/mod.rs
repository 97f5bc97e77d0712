//! Pair selection and vote recording for ranking sessions
//!
//! This module handles choosing which two items a user compares next,
//! occasionally mixing in discovery challengers, and scoring their votes.

pub mod pairing;
pub mod session;

/// Share of rounds that introduce a challenger when any are available
pub const DEFAULT_DISCOVERY_PROBABILITY: f64 = 0.20;

// Re-export commonly used types
pub use pairing::{next_pair, Contender, ContenderOrigin, MatchPair};
pub use session::{rateable_pool, Matchmaker, TournamentSession, VoteOutcome, VoteRecord};
