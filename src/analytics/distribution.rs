//! Tier distribution and tag frequency
//!
//! Both queries work on caller-supplied collections and never touch a store.

use crate::ranks::{default_tier_color, DEFAULT_TIERS};
use crate::types::{CustomRank, RankKind, RatedItem};
use crate::utils::labels_match;
use serde::{Deserialize, Serialize};

/// Label used for items without any tier; never reported
pub const UNRANKED_LABEL: &str = "Unranked";

/// Share of a user's collection placed in one tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCount {
    pub tier: String,
    pub count: usize,
    /// Rounded share of tiered items; shares need not sum to exactly 100
    pub percentage: u32,
    pub color: String,
}

/// How often a tag appears across a collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Count items per tier
///
/// Items with no resolvable tier, or filed under a utility rank, are left
/// out of both the output and the percentage base. Tiers are ordered by the
/// category's rank order, then the default S..F ladder, then first appearance.
pub fn tier_distribution(items: &[RatedItem], ranks: &[CustomRank]) -> Vec<TierCount> {
    let find_rank = |tier: &str| ranks.iter().find(|rank| labels_match(&rank.name, tier));

    // (label, count, first appearance)
    let mut tallies: Vec<(String, usize, usize)> = Vec::new();
    for (position, item) in items.iter().enumerate() {
        let Some(tier) = item.resolved_tier() else {
            continue;
        };
        if labels_match(tier, UNRANKED_LABEL) {
            continue;
        }

        let label = match find_rank(tier) {
            Some(rank) if rank.kind == RankKind::Utility => continue,
            Some(rank) => rank.name.as_str(),
            None => tier,
        };

        match tallies
            .iter_mut()
            .find(|(existing, _, _)| labels_match(existing, label))
        {
            Some((_, count, _)) => *count += 1,
            None => tallies.push((label.to_string(), 1, position)),
        }
    }

    let total: usize = tallies.iter().map(|(_, count, _)| count).sum();
    if total == 0 {
        return Vec::new();
    }

    tallies.sort_by_key(|(label, _, first_seen)| {
        if let Some(rank) = find_rank(label) {
            (0, rank.sort_order as i64)
        } else if let Some(index) = DEFAULT_TIERS
            .iter()
            .position(|tier| labels_match(tier, label))
        {
            (1, index as i64)
        } else {
            (2, *first_seen as i64)
        }
    });

    tallies
        .into_iter()
        .map(|(tier, count, _)| {
            let color = find_rank(&tier)
                .map(|rank| rank.color.clone())
                .unwrap_or_else(|| default_tier_color(&tier).to_string());
            TierCount {
                percentage: (count as f64 / total as f64 * 100.0).round() as u32,
                tier,
                count,
                color,
            }
        })
        .collect()
}

/// Most frequent tags, most common first; ties keep input order
pub fn top_tags(items: &[RatedItem], limit: usize) -> Vec<TagCount> {
    let mut counts: Vec<TagCount> = Vec::new();

    for tag in items.iter().flat_map(|item| item.item.tags.iter()) {
        let tag = tag.trim();
        if tag.is_empty() {
            continue;
        }

        match counts.iter_mut().find(|entry| labels_match(&entry.tag, tag)) {
            Some(entry) => entry.count += 1,
            None => counts.push(TagCount {
                tag: tag.to_string(),
                count: 1,
            }),
        }
    }

    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
