//! Custom tier definitions per category
//!
//! This module provides the rank registry, default tier ladder, and the
//! sentiment classification capability it depends on.

pub mod classifier;
pub mod registry;

// Re-export commonly used types
pub use classifier::{KeywordLabelClassifier, LabelClassifier};
pub use registry::{
    default_tier_color, detect_rank_kind, CustomRankRegistry, NewRank, RankOrder, RankUpdate,
    DEFAULT_TIERS, NEUTRAL_RANK_COLOR,
};
