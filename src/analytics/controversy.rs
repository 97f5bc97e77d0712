//! Items whose tier placement disagrees with their head-to-head record

use crate::types::{RatedItem, DEFAULT_ELO_SCORE};
use crate::utils::labels_match;
use serde::{Deserialize, Serialize};

/// Minimum gap between actual and tier-implied elo to flag an item
pub const CONTROVERSY_THRESHOLD: f64 = 150.0;

/// Maximum number of items reported
pub const CONTROVERSIAL_LIMIT: usize = 5;

/// Elo points between adjacent tiers
pub const ELO_PER_TIER_STEP: f64 = 100.0;

const TIER_MIDPOINT: f64 = 3.5;

const TIER_VALUES: [(&str, u8); 6] = [("S", 6), ("A", 5), ("B", 4), ("C", 3), ("D", 2), ("F", 1)];

/// A tiered item whose elo strays from what its tier predicts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControversialItem {
    pub item_id: String,
    pub display_name: String,
    pub tier: String,
    pub elo_score: f64,
    pub expected_elo: f64,
    /// Actual minus expected; negative means the tier flatters the item
    pub difference: f64,
}

/// Numeric value of a default tier label (S=6 down to F=1)
pub fn tier_value(label: &str) -> Option<u8> {
    TIER_VALUES
        .iter()
        .find(|(tier, _)| labels_match(tier, label))
        .map(|(_, value)| *value)
}

/// Elo score a tier implies
pub fn expected_elo_for_tier(value: u8) -> f64 {
    DEFAULT_ELO_SCORE + (f64::from(value) - TIER_MIDPOINT) * ELO_PER_TIER_STEP
}

/// Find items placed in a tier their comparisons don't support
///
/// Only items on the default S..F ladder are considered. Results are ordered
/// by the size of the disagreement, largest first.
pub fn controversial_items(items: &[RatedItem]) -> Vec<ControversialItem> {
    let mut flagged: Vec<ControversialItem> = items
        .iter()
        .filter_map(|rated| {
            let tier = rated.resolved_tier()?;
            let expected_elo = expected_elo_for_tier(tier_value(tier)?);
            let difference = rated.item.elo_score - expected_elo;

            (difference.abs() > CONTROVERSY_THRESHOLD).then(|| ControversialItem {
                item_id: rated.item.id.clone(),
                display_name: rated.item.display_name.clone(),
                tier: tier.to_string(),
                elo_score: rated.item.elo_score,
                expected_elo,
                difference,
            })
        })
        .collect();

    flagged.sort_by(|a, b| b.difference.abs().total_cmp(&a.difference.abs()));
    flagged.truncate(CONTROVERSIAL_LIMIT);
    flagged
}
