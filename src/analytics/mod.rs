//! Taste analytics over rated collections
//!
//! Everything here is a pure function of the collections passed in. Callers
//! hydrate items through a [`crate::rating::RatingStore`] first.

pub mod cohort;
pub mod controversy;
pub mod distribution;
pub mod similarity;

// Re-export commonly used types
pub use cohort::{
    build_taste_vector, cohort_alignment_score, CohortAlignment, CohortMetric, CohortVector,
    MetricAlignment, TasteVector,
};
pub use controversy::{
    controversial_items, expected_elo_for_tier, tier_value, ControversialItem,
    CONTROVERSIAL_LIMIT, CONTROVERSY_THRESHOLD,
};
pub use distribution::{tier_distribution, top_tags, TagCount, TierCount, UNRANKED_LABEL};
pub use similarity::{taste_match, taste_match_details, TasteMatch, MIN_OVERLAP, TASTE_MATCH_SCALE};
