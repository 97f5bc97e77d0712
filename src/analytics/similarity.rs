//! Pairwise taste similarity between two users

use std::collections::{HashMap, HashSet};

use crate::types::{RatedItem, DEFAULT_ELO_SCORE};
use crate::utils::{bounded_similarity, rating_difference};
use serde::{Deserialize, Serialize};

/// Mean elo gap at which two users share no taste at all
pub const TASTE_MATCH_SCALE: f64 = 800.0;

/// Shared items required before a match is meaningful
pub const MIN_OVERLAP: usize = 5;

/// Breakdown behind a taste match score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TasteMatch {
    pub score: u8,
    pub overlap: usize,
    pub mean_difference: f64,
}

/// Similarity of two users' elo placements over shared catalog entries
///
/// Returns `None` when fewer than [`MIN_OVERLAP`] entries qualify.
pub fn taste_match(user_a_items: &[RatedItem], user_b_items: &[RatedItem]) -> Option<u8> {
    taste_match_details(user_a_items, user_b_items).map(|detail| detail.score)
}

/// Same as [`taste_match`] but keeps the overlap size and mean gap
pub fn taste_match_details(
    user_a_items: &[RatedItem],
    user_b_items: &[RatedItem],
) -> Option<TasteMatch> {
    let b_scores = compared_scores(user_b_items);

    let mut seen = HashSet::new();
    let differences: Vec<f64> = user_a_items
        .iter()
        .filter_map(|rated| {
            let catalog_id = comparable_catalog_id(rated)?;
            // A user's first copy of a catalog entry stands for all of them
            if !seen.insert(catalog_id) {
                return None;
            }
            let other = b_scores.get(catalog_id)?;
            Some(rating_difference(rated.item.elo_score, *other))
        })
        .collect();

    if differences.len() < MIN_OVERLAP {
        return None;
    }

    let mean_difference = differences.iter().sum::<f64>() / differences.len() as f64;
    let score = bounded_similarity(mean_difference, TASTE_MATCH_SCALE).round() as u8;

    Some(TasteMatch {
        score,
        overlap: differences.len(),
        mean_difference,
    })
}

/// Catalog id of an item that has been rated and moved off the starting score
fn comparable_catalog_id(rated: &RatedItem) -> Option<&str> {
    let catalog_id = rated.item.catalog_item_id.as_deref()?;
    if !rated.is_rated() || rated.item.elo_score == DEFAULT_ELO_SCORE {
        return None;
    }
    Some(catalog_id)
}

fn compared_scores(items: &[RatedItem]) -> HashMap<&str, f64> {
    let mut scores = HashMap::new();
    for rated in items {
        if let Some(catalog_id) = comparable_catalog_id(rated) {
            scores.entry(catalog_id).or_insert(rated.item.elo_score);
        }
    }
    scores
}
