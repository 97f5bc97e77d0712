//! Test fixtures and stand-in dependencies for integration testing

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use taste_engine::error::{EngineError, Result};
use taste_engine::rating::{InMemoryRatingStore, RatingStore};
use taste_engine::ranks::LabelClassifier;
use taste_engine::types::{Challenger, Item, NewRating, RatedItem, Rating, Sentiment};

pub const USER: &str = "alice";
pub const OTHER_USER: &str = "bob";
pub const CATEGORY: &str = "films";

/// A film owned by `owner`, linked to a shared catalog entry of the same name
pub fn film(owner: &str, title: &str) -> Item {
    Item::new(format!("{owner}-{title}"), title, owner, CATEGORY).with_catalog_id(title)
}

/// A small collection spread across the default tiers
pub fn tiered_collection(owner: &str) -> Vec<Item> {
    [
        ("alien", "S", 1460.0),
        ("blade-runner", "A", 1340.0),
        ("heat", "B", 1260.0),
        ("cats", "F", 1300.0),
        ("speed", "C", 1140.0),
        ("jaws", "S", 1000.0),
    ]
    .into_iter()
    .map(|(title, tier, elo)| {
        film(owner, title)
            .with_tier(tier)
            .with_elo(elo)
            .with_tags(["classic"])
    })
    .collect()
}

pub fn challenger(catalog_id: &str) -> Challenger {
    Challenger {
        id: format!("catalog-{catalog_id}"),
        display_name: catalog_id.to_string(),
        category_id: CATEGORY.to_string(),
        catalog_item_id: Some(catalog_id.to_string()),
    }
}

pub fn rated(items: Vec<Item>) -> Vec<RatedItem> {
    items.into_iter().map(RatedItem::new).collect()
}

/// Store that serves reads from an in-memory store but fails writes
/// after a number of successful score persists
#[derive(Debug, Default)]
pub struct FlakyRatingStore {
    inner: InMemoryRatingStore,
    successful_writes: usize,
    writes: AtomicUsize,
}

impl FlakyRatingStore {
    pub fn new(items: Vec<Item>, successful_writes: usize) -> Self {
        Self {
            inner: InMemoryRatingStore::with_items(items),
            successful_writes,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &InMemoryRatingStore {
        &self.inner
    }

    fn unavailable() -> anyhow::Error {
        EngineError::StoreUnavailable {
            message: "connection reset".to_string(),
        }
        .into()
    }
}

impl RatingStore for FlakyRatingStore {
    fn get_items_for_user(&self, user_id: &str, category_id: Option<&str>) -> Result<Vec<Item>> {
        self.inner.get_items_for_user(user_id, category_id)
    }

    fn get_rating(&self, item_id: &str, user_id: &str) -> Result<Option<Rating>> {
        self.inner.get_rating(item_id, user_id)
    }

    fn replace_rating(&self, rating: NewRating) -> Result<Rating> {
        self.inner.replace_rating(rating)
    }

    fn set_item_tier(&self, item_id: &str, tier: Option<String>) -> Result<()> {
        self.inner.set_item_tier(item_id, tier)
    }

    fn persist_elo_score(&self, item_id: &str, score: f64) -> Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.successful_writes {
            return Err(Self::unavailable());
        }
        self.inner.persist_elo_score(item_id, score)
    }
}

/// Classifier that records what it was asked and always gives one answer
#[derive(Debug)]
pub struct RecordingClassifier {
    answer: Sentiment,
    seen: Mutex<Vec<String>>,
}

impl RecordingClassifier {
    pub fn new(answer: Sentiment) -> Self {
        Self {
            answer,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl LabelClassifier for RecordingClassifier {
    fn classify_sentiment(&self, text: &str) -> Result<Sentiment> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(text.to_string());
        }
        Ok(self.answer)
    }
}

/// Classifier whose backing service is down
#[derive(Debug, Default)]
pub struct OfflineClassifier;

impl LabelClassifier for OfflineClassifier {
    fn classify_sentiment(&self, _text: &str) -> Result<Sentiment> {
        Err(EngineError::ClassifierUnavailable {
            message: "sentiment service timed out".to_string(),
        }
        .into())
    }
}
