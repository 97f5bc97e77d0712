//! Per-category custom rank registry
//!
//! Categories start without ranks. The first request against a category
//! bootstraps the classic S/A/B/C/D/F ladder; users then add, rename, delete
//! and reorder ranks on top of it. Sentiment for new labels comes from the
//! injected [`LabelClassifier`].

use crate::error::{EngineError, Result};
use crate::ranks::classifier::LabelClassifier;
use crate::types::{CategoryId, CustomRank, RankId, RankKind, Sentiment};
use crate::utils::{generate_rank_id, labels_match};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Ladder every category starts from
pub const DEFAULT_TIERS: [&str; 6] = ["S", "A", "B", "C", "D", "F"];

/// Color for ranks that are not part of the default ladder
pub const NEUTRAL_RANK_COLOR: &str = "#9CA3AF";

/// Name fragments that mark a rank as a bookkeeping shelf rather than a tier
const UTILITY_KEYWORDS: [&str; 4] = ["watchlist", "plan to", "dropped", "never seen"];

/// Display color for a default tier, or the neutral color for anything else
pub fn default_tier_color(name: &str) -> &'static str {
    match name.trim().to_ascii_uppercase().as_str() {
        "S" => "#FF7F7F",
        "A" => "#FFBF7F",
        "B" => "#FFDF7F",
        "C" => "#FFFF7F",
        "D" => "#BFFF7F",
        "F" => "#7FFF7F",
        _ => NEUTRAL_RANK_COLOR,
    }
}

/// Infer whether a rank name describes a tier or a utility shelf
pub fn detect_rank_kind(name: &str) -> RankKind {
    let lowered = name.to_lowercase();
    if UTILITY_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
    {
        RankKind::Utility
    } else {
        RankKind::Ranked
    }
}

/// Request to create a rank; unset fields are inferred
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRank {
    pub name: String,
    pub sentiment: Option<Sentiment>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub kind: Option<RankKind>,
}

impl NewRank {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update of an existing rank
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankUpdate {
    pub name: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub kind: Option<RankKind>,
}

/// New position for one rank in a reorder request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankOrder {
    pub id: RankId,
    pub sort_order: i32,
}

/// Registry of custom ranks keyed by category
pub struct CustomRankRegistry {
    classifier: Arc<dyn LabelClassifier>,
    ranks: RwLock<HashMap<CategoryId, Vec<CustomRank>>>,
}

impl std::fmt::Debug for CustomRankRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomRankRegistry")
            .field("ranks", &self.ranks)
            .finish_non_exhaustive()
    }
}

impl CustomRankRegistry {
    /// Create an empty registry backed by the given classifier
    pub fn new(classifier: Arc<dyn LabelClassifier>) -> Self {
        Self {
            classifier,
            ranks: RwLock::new(HashMap::new()),
        }
    }

    /// Ranks for a category ordered by sort order then name
    ///
    /// A category with no ranks is bootstrapped with the default ladder.
    pub fn get_ranks(&self, category_id: &str) -> Result<Vec<CustomRank>> {
        {
            let ranks = self.read()?;
            if let Some(existing) = ranks.get(category_id).filter(|r| !r.is_empty()) {
                return Ok(sorted(existing.clone()));
            }
        }

        let mut ranks = self.write()?;
        let entry = ranks.entry(category_id.to_string()).or_default();
        bootstrap_if_empty(category_id, entry);
        Ok(sorted(entry.clone()))
    }

    /// Create a rank, bootstrapping the default ladder first if needed
    pub fn create_rank(&self, category_id: &str, request: NewRank) -> Result<CustomRank> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::validation("rank name cannot be empty").into());
        }

        // Classification may call out to a remote service; keep it off the lock
        let sentiment = match request.sentiment {
            Some(sentiment) => sentiment,
            None => self.classify(&name),
        };
        let kind = request.kind.unwrap_or_else(|| detect_rank_kind(&name));
        let color = request
            .color
            .unwrap_or_else(|| default_tier_color(&name).to_string());

        let mut ranks = self.write()?;
        let entry = ranks.entry(category_id.to_string()).or_default();
        bootstrap_if_empty(category_id, entry);

        if entry.iter().any(|rank| labels_match(&rank.name, &name)) {
            return Err(EngineError::validation(format!(
                "rank '{}' already exists in category {}",
                name, category_id
            ))
            .into());
        }

        let sort_order = request.sort_order.unwrap_or_else(|| {
            entry
                .iter()
                .map(|rank| rank.sort_order)
                .max()
                .map_or(0, |max| max + 1)
        });

        let rank = CustomRank {
            id: generate_rank_id(),
            category_id: category_id.to_string(),
            name,
            sentiment,
            color,
            sort_order,
            kind,
        };

        debug!(
            "Created rank '{}' ({:?}, {}) in category {} at position {}",
            rank.name, rank.kind, rank.sentiment, category_id, rank.sort_order
        );
        entry.push(rank.clone());

        Ok(rank)
    }

    /// Apply a partial update to a rank
    ///
    /// Renaming without an explicit sentiment re-runs classification.
    pub fn update_rank(&self, id: RankId, update: RankUpdate) -> Result<CustomRank> {
        let current = self.find(id)?;

        let new_name = match update.name.as_deref().map(str::trim) {
            Some("") => return Err(EngineError::validation("rank name cannot be empty").into()),
            Some(name) if name != current.name => Some(name.to_string()),
            _ => None,
        };

        let sentiment = match (update.sentiment, new_name.as_deref()) {
            (Some(sentiment), _) => Some(sentiment),
            (None, Some(name)) => Some(self.classify(name)),
            (None, None) => None,
        };

        let mut ranks = self.write()?;
        let siblings = ranks
            .get_mut(&current.category_id)
            .ok_or_else(|| rank_not_found(id))?;

        if let Some(name) = new_name.as_deref() {
            if siblings
                .iter()
                .any(|rank| rank.id != id && labels_match(&rank.name, name))
            {
                return Err(EngineError::validation(format!(
                    "rank '{}' already exists in category {}",
                    name, current.category_id
                ))
                .into());
            }
        }

        // The rank may have been deleted while we were classifying
        let rank = siblings
            .iter_mut()
            .find(|rank| rank.id == id)
            .ok_or_else(|| rank_not_found(id))?;

        if let Some(name) = new_name {
            rank.name = name;
        }
        if let Some(sentiment) = sentiment {
            rank.sentiment = sentiment;
        }
        if let Some(color) = update.color {
            rank.color = color;
        }
        if let Some(sort_order) = update.sort_order {
            rank.sort_order = sort_order;
        }
        if let Some(kind) = update.kind {
            rank.kind = kind;
        }

        Ok(rank.clone())
    }

    /// Remove a rank, returning it
    pub fn delete_rank(&self, id: RankId) -> Result<CustomRank> {
        let mut ranks = self.write()?;

        for siblings in ranks.values_mut() {
            if let Some(position) = siblings.iter().position(|rank| rank.id == id) {
                let removed = siblings.remove(position);
                debug!(
                    "Deleted rank '{}' from category {}",
                    removed.name, removed.category_id
                );
                return Ok(removed);
            }
        }

        Err(rank_not_found(id))
    }

    /// Reassign sort orders for a category in one step
    ///
    /// Every id must belong to the category; otherwise nothing changes.
    pub fn reorder_ranks(&self, category_id: &str, orders: &[RankOrder]) -> Result<Vec<CustomRank>> {
        let mut ranks = self.write()?;
        let siblings = ranks.get_mut(category_id).ok_or_else(|| {
            EngineError::validation(format!("category {} has no ranks to reorder", category_id))
        })?;

        let known: HashSet<RankId> = siblings.iter().map(|rank| rank.id).collect();
        let mut seen = HashSet::with_capacity(orders.len());
        for order in orders {
            if !known.contains(&order.id) {
                return Err(EngineError::validation(format!(
                    "rank {} does not belong to category {}",
                    order.id, category_id
                ))
                .into());
            }
            if !seen.insert(order.id) {
                return Err(EngineError::validation(format!(
                    "rank {} appears more than once in reorder request",
                    order.id
                ))
                .into());
            }
        }

        let positions: HashMap<RankId, i32> = orders
            .iter()
            .map(|order| (order.id, order.sort_order))
            .collect();
        for rank in siblings.iter_mut() {
            if let Some(sort_order) = positions.get(&rank.id) {
                rank.sort_order = *sort_order;
            }
        }

        info!(
            "Reordered {} rank(s) in category {}",
            orders.len(),
            category_id
        );
        Ok(sorted(siblings.clone()))
    }

    fn classify(&self, name: &str) -> Sentiment {
        match self.classifier.classify_sentiment(name) {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!(
                    "Sentiment classification failed for rank '{}', falling back to neutral: {}",
                    name, e
                );
                Sentiment::Neutral
            }
        }
    }

    fn find(&self, id: RankId) -> Result<CustomRank> {
        self.read()?
            .values()
            .flatten()
            .find(|rank| rank.id == id)
            .cloned()
            .ok_or_else(|| rank_not_found(id))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<CategoryId, Vec<CustomRank>>>> {
        self.ranks
            .read()
            .map_err(|_| EngineError::lock_poisoned("rank registry read").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<CategoryId, Vec<CustomRank>>>> {
        self.ranks
            .write()
            .map_err(|_| EngineError::lock_poisoned("rank registry write").into())
    }
}

fn rank_not_found(id: RankId) -> anyhow::Error {
    EngineError::RankNotFound {
        rank_id: id.to_string(),
    }
    .into()
}

fn bootstrap_if_empty(category_id: &str, ranks: &mut Vec<CustomRank>) {
    if !ranks.is_empty() {
        return;
    }

    info!("Bootstrapping default tiers for category {}", category_id);
    ranks.extend(DEFAULT_TIERS.iter().zip(0..).map(|(name, sort_order)| CustomRank {
        id: generate_rank_id(),
        category_id: category_id.to_string(),
        name: name.to_string(),
        sentiment: Sentiment::Neutral,
        color: default_tier_color(name).to_string(),
        sort_order,
        kind: RankKind::Ranked,
    }));
}

fn sorted(mut ranks: Vec<CustomRank>) -> Vec<CustomRank> {
    ranks.sort_by(|a, b| {
        a.sort_order
            .cmp(&b.sort_order)
            .then_with(|| a.name.cmp(&b.name))
    });
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranks::classifier::{KeywordLabelClassifier, MockLabelClassifier};

    fn registry() -> CustomRankRegistry {
        CustomRankRegistry::new(Arc::new(KeywordLabelClassifier::new()))
    }

    fn names(ranks: &[CustomRank]) -> Vec<&str> {
        ranks.iter().map(|rank| rank.name.as_str()).collect()
    }

    #[test]
    fn test_first_create_bootstraps_defaults() {
        let registry = registry();

        let favorites = registry
            .create_rank("films", NewRank::named("Favorites"))
            .unwrap();
        assert_eq!(favorites.sort_order, 6);
        assert_eq!(favorites.kind, RankKind::Ranked);
        assert_eq!(favorites.sentiment, Sentiment::Positive);

        let ranks = registry.get_ranks("films").unwrap();
        assert_eq!(names(&ranks), vec!["S", "A", "B", "C", "D", "F", "Favorites"]);
        for (expected, rank) in (0..6).zip(ranks.iter()) {
            assert_eq!(rank.sort_order, expected);
            assert_eq!(rank.sentiment, Sentiment::Neutral);
            assert_eq!(rank.kind, RankKind::Ranked);
        }
        assert_eq!(ranks[0].color, "#FF7F7F");
    }

    #[test]
    fn test_get_ranks_bootstraps_empty_category() {
        let registry = registry();
        let ranks = registry.get_ranks("albums").unwrap();
        assert_eq!(names(&ranks), vec!["S", "A", "B", "C", "D", "F"]);

        // Second call must not duplicate the ladder
        assert_eq!(registry.get_ranks("albums").unwrap().len(), 6);
    }

    #[test]
    fn test_categories_are_independent() {
        let registry = registry();
        registry.create_rank("films", NewRank::named("Favorites")).unwrap();

        let albums = registry.get_ranks("albums").unwrap();
        assert_eq!(albums.len(), 6);
        assert!(albums.iter().all(|rank| rank.category_id == "albums"));
    }

    #[test]
    fn test_utility_kind_detection() {
        assert_eq!(detect_rank_kind("Watchlist"), RankKind::Utility);
        assert_eq!(detect_rank_kind("Plan to Watch"), RankKind::Utility);
        assert_eq!(detect_rank_kind("Dropped"), RankKind::Utility);
        assert_eq!(detect_rank_kind("Never Seen It"), RankKind::Utility);
        assert_eq!(detect_rank_kind("Guilty Pleasures"), RankKind::Ranked);

        let registry = registry();
        let watchlist = registry
            .create_rank("films", NewRank::named("My Watchlist"))
            .unwrap();
        assert_eq!(watchlist.kind, RankKind::Utility);
        assert_eq!(watchlist.color, NEUTRAL_RANK_COLOR);
    }

    #[test]
    fn test_explicit_fields_are_respected() {
        let mut classifier = MockLabelClassifier::new();
        classifier.expect_classify_sentiment().never();
        let registry = CustomRankRegistry::new(Arc::new(classifier));

        let rank = registry
            .create_rank(
                "films",
                NewRank {
                    name: "Comfort Watches".to_string(),
                    sentiment: Some(Sentiment::Positive),
                    color: Some("#123456".to_string()),
                    sort_order: Some(2),
                    kind: Some(RankKind::Utility),
                },
            )
            .unwrap();

        assert_eq!(rank.sentiment, Sentiment::Positive);
        assert_eq!(rank.color, "#123456");
        assert_eq!(rank.sort_order, 2);
        assert_eq!(rank.kind, RankKind::Utility);
    }

    #[test]
    fn test_classifier_failure_falls_back_to_neutral() {
        let mut classifier = MockLabelClassifier::new();
        classifier
            .expect_classify_sentiment()
            .times(1)
            .returning(|_| {
                Err(EngineError::ClassifierUnavailable {
                    message: "timeout".to_string(),
                }
                .into())
            });
        let registry = CustomRankRegistry::new(Arc::new(classifier));

        let rank = registry
            .create_rank("films", NewRank::named("Masterpieces"))
            .unwrap();
        assert_eq!(rank.sentiment, Sentiment::Neutral);
        assert_eq!(registry.get_ranks("films").unwrap().len(), 7);
    }

    #[test]
    fn test_rename_reclassifies_unless_sentiment_given() {
        let mut classifier = MockLabelClassifier::new();
        classifier
            .expect_classify_sentiment()
            .withf(|text| text == "Meh")
            .returning(|_| Ok(Sentiment::Neutral));
        classifier
            .expect_classify_sentiment()
            .withf(|text| text == "Hated It")
            .times(1)
            .returning(|_| Ok(Sentiment::Negative));
        let registry = CustomRankRegistry::new(Arc::new(classifier));

        let rank = registry.create_rank("films", NewRank::named("Meh")).unwrap();

        let renamed = registry
            .update_rank(
                rank.id,
                RankUpdate {
                    name: Some("Hated It".to_string()),
                    ..RankUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.name, "Hated It");
        assert_eq!(renamed.sentiment, Sentiment::Negative);

        // Explicit sentiment wins and the classifier is not consulted again
        let renamed = registry
            .update_rank(
                rank.id,
                RankUpdate {
                    name: Some("Loved It".to_string()),
                    sentiment: Some(Sentiment::Positive),
                    ..RankUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.sentiment, Sentiment::Positive);

        // Color-only update leaves sentiment alone
        let recolored = registry
            .update_rank(
                rank.id,
                RankUpdate {
                    color: Some("#000000".to_string()),
                    ..RankUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(recolored.sentiment, Sentiment::Positive);
        assert_eq!(recolored.color, "#000000");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let registry = registry();
        let err = registry
            .create_rank("films", NewRank::named(" s "))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_delete_rank() {
        let registry = registry();
        let ranks = registry.get_ranks("films").unwrap();
        let f = ranks.iter().find(|rank| rank.name == "F").unwrap();

        let removed = registry.delete_rank(f.id).unwrap();
        assert_eq!(removed.name, "F");
        assert_eq!(registry.get_ranks("films").unwrap().len(), 5);

        let err = registry.delete_rank(f.id).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::RankNotFound { .. })
        ));
    }

    #[test]
    fn test_update_unknown_rank() {
        let registry = registry();
        let err = registry
            .update_rank(generate_rank_id(), RankUpdate::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::RankNotFound { .. })
        ));
    }

    #[test]
    fn test_reorder_applies_all_positions() {
        let registry = registry();
        let ranks = registry.get_ranks("films").unwrap();

        // Reverse the ladder
        let orders: Vec<RankOrder> = ranks
            .iter()
            .enumerate()
            .map(|(i, rank)| RankOrder {
                id: rank.id,
                sort_order: (ranks.len() - 1 - i) as i32,
            })
            .collect();

        let reordered = registry.reorder_ranks("films", &orders).unwrap();
        assert_eq!(names(&reordered), vec!["F", "D", "C", "B", "A", "S"]);
        assert_eq!(
            names(&registry.get_ranks("films").unwrap()),
            vec!["F", "D", "C", "B", "A", "S"]
        );
    }

    #[test]
    fn test_reorder_is_all_or_nothing() {
        let registry = registry();
        let ranks = registry.get_ranks("films").unwrap();
        let other = registry.get_ranks("albums").unwrap();

        let orders = vec![
            RankOrder {
                id: ranks[0].id,
                sort_order: 10,
            },
            RankOrder {
                id: other[0].id,
                sort_order: 11,
            },
        ];

        let err = registry.reorder_ranks("films", &orders).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Validation { .. })
        ));

        // Nothing moved
        let after = registry.get_ranks("films").unwrap();
        assert_eq!(after, ranks);
    }

    #[test]
    fn test_reorder_rejects_duplicate_ids() {
        let registry = registry();
        let ranks = registry.get_ranks("films").unwrap();
        let orders = vec![
            RankOrder {
                id: ranks[1].id,
                sort_order: 0,
            },
            RankOrder {
                id: ranks[1].id,
                sort_order: 5,
            },
        ];

        assert!(registry.reorder_ranks("films", &orders).is_err());
        assert_eq!(registry.get_ranks("films").unwrap(), ranks);
    }
}
