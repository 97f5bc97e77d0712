//! Rating store interface and in-memory implementation
//!
//! The engine never owns persistence: items, ratings and tiers live behind
//! [`RatingStore`]. Tournament sessions hydrate from it and callers flush
//! session scores back through it.

use crate::error::{EngineError, Result};
use crate::types::{Item, ItemId, NewRating, RatedItem, Rating, UserId};
use crate::utils::current_timestamp;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// Trait for rating store operations
pub trait RatingStore: Send + Sync {
    /// Get every item a user owns, optionally restricted to one category
    fn get_items_for_user(&self, user_id: &str, category_id: Option<&str>) -> Result<Vec<Item>>;

    /// Get the user's active rating of an item
    fn get_rating(&self, item_id: &str, user_id: &str) -> Result<Option<Rating>>;

    /// Atomically supersede any previous rating of the item by the same user
    fn replace_rating(&self, rating: NewRating) -> Result<Rating>;

    /// Set or clear an item's explicit tier
    fn set_item_tier(&self, item_id: &str, tier: Option<String>) -> Result<()>;

    /// Persist a score produced by a tournament session
    fn persist_elo_score(&self, item_id: &str, score: f64) -> Result<()>;

    /// Get a user's items joined with their ratings, for analytics
    fn get_rated_items_for_user(
        &self,
        user_id: &str,
        category_id: Option<&str>,
    ) -> Result<Vec<RatedItem>> {
        self.get_items_for_user(user_id, category_id)?
            .into_iter()
            .map(|item| -> Result<RatedItem> {
                let ratings = self.get_rating(&item.id, user_id)?.into_iter().collect();
                Ok(RatedItem {
                    item,
                    rank: None,
                    ratings,
                })
            })
            .collect()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    items: HashMap<ItemId, Item>,
    /// Active rating per (item, user)
    ratings: HashMap<(ItemId, UserId), Rating>,
}

/// In-memory rating store implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    state: RwLock<StoreState>,
}

impl InMemoryRatingStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store preloaded with items
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            for item in items {
                state.items.insert(item.id.clone(), item);
            }
        }
        store
    }

    /// Insert or overwrite an item
    pub fn upsert_item(&self, item: Item) -> Result<()> {
        self.write()?.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Look up a single item
    pub fn get_item(&self, item_id: &str) -> Result<Option<Item>> {
        Ok(self.read()?.items.get(item_id).cloned())
    }

    /// Number of active ratings held, across all users
    pub fn rating_count(&self) -> Result<usize> {
        Ok(self.read()?.ratings.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| EngineError::lock_poisoned("rating store read").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| EngineError::lock_poisoned("rating store write").into())
    }
}

impl RatingStore for InMemoryRatingStore {
    fn get_items_for_user(&self, user_id: &str, category_id: Option<&str>) -> Result<Vec<Item>> {
        let state = self.read()?;

        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|item| item.owner_user_id == user_id)
            .filter(|item| category_id.map_or(true, |category| item.category_id == category))
            .cloned()
            .collect();

        // HashMap order is arbitrary; keep sessions reproducible
        items.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(items)
    }

    fn get_rating(&self, item_id: &str, user_id: &str) -> Result<Option<Rating>> {
        let state = self.read()?;
        Ok(state
            .ratings
            .get(&(item_id.to_string(), user_id.to_string()))
            .cloned())
    }

    fn replace_rating(&self, rating: NewRating) -> Result<Rating> {
        rating.validate()?;

        let mut state = self.write()?;
        if !state.items.contains_key(&rating.item_id) {
            return Err(EngineError::ItemNotFound {
                item_id: rating.item_id,
            }
            .into());
        }

        let key = (rating.item_id.clone(), rating.user_id.clone());
        let stored = rating.into_rating();

        // Delete and insert happen under the same write guard
        if let Some(previous) = state.ratings.remove(&key) {
            debug!(
                "Superseding rating {} on item {} for user {}",
                previous.id, key.0, key.1
            );
        }
        state.ratings.insert(key, stored.clone());

        Ok(stored)
    }

    fn set_item_tier(&self, item_id: &str, tier: Option<String>) -> Result<()> {
        let mut state = self.write()?;
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| EngineError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;

        item.current_tier = tier;
        item.updated_at = current_timestamp();
        Ok(())
    }

    fn persist_elo_score(&self, item_id: &str, score: f64) -> Result<()> {
        if !score.is_finite() || score < 0.0 {
            return Err(EngineError::validation(format!(
                "score {} for item {} must be a non-negative number",
                score, item_id
            ))
            .into());
        }

        let mut state = self.write()?;
        let item = state
            .items
            .get_mut(item_id)
            .ok_or_else(|| EngineError::ItemNotFound {
                item_id: item_id.to_string(),
            })?;

        item.elo_score = score;
        item.updated_at = current_timestamp();
        Ok(())
    }
}
