//! Common types used throughout the ranking engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Score every item starts from before its first comparison
pub const DEFAULT_ELO_SCORE: f64 = 1200.0;

/// Unique identifier for items in a user's collection
pub type ItemId = String;

/// Unique identifier for users
pub type UserId = String;

/// Unique identifier for categories (films, albums, restaurants, ...)
pub type CategoryId = String;

/// Unique identifier for custom ranks
pub type RankId = Uuid;

/// Unique identifier for ratings
pub type RatingId = Uuid;

/// Unique identifier for tournament sessions
pub type SessionId = Uuid;

fn default_elo_score() -> f64 {
    DEFAULT_ELO_SCORE
}

/// An item owned by a user inside one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub display_name: String,
    pub owner_user_id: UserId,
    pub category_id: CategoryId,
    #[serde(default = "default_elo_score")]
    pub elo_score: f64,
    /// Explicit tier label, if the user placed the item in one
    #[serde(default)]
    pub current_tier: Option<String>,
    /// Link to a shared catalog entry, used to compare collections across users
    #[serde(default)]
    pub catalog_item_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Create a new, unrated item
    pub fn new(
        id: impl Into<ItemId>,
        display_name: impl Into<String>,
        owner_user_id: impl Into<UserId>,
        category_id: impl Into<CategoryId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            display_name: display_name.into(),
            owner_user_id: owner_user_id.into(),
            category_id: category_id.into(),
            elo_score: DEFAULT_ELO_SCORE,
            current_tier: None,
            catalog_item_id: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Builder-style setter for the Elo score
    pub fn with_elo(mut self, elo_score: f64) -> Self {
        self.elo_score = elo_score;
        self
    }

    /// Builder-style setter for the explicit tier
    pub fn with_tier(mut self, tier: impl Into<String>) -> Self {
        self.current_tier = Some(tier.into());
        self
    }

    /// Builder-style setter for the catalog link
    pub fn with_catalog_id(mut self, catalog_item_id: impl Into<String>) -> Self {
        self.catalog_item_id = Some(catalog_item_id.into());
        self
    }

    /// Builder-style setter for tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// How a rating was expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RatingType {
    Numerical,
    Tier,
    Hybrid,
}

impl RatingType {
    pub fn requires_numeric_value(self) -> bool {
        matches!(self, RatingType::Numerical | RatingType::Hybrid)
    }

    pub fn requires_tier_label(self) -> bool {
        matches!(self, RatingType::Tier | RatingType::Hybrid)
    }
}

/// A user's active rating of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub id: RatingId,
    pub item_id: ItemId,
    pub user_id: UserId,
    pub rating_type: RatingType,
    #[serde(default)]
    pub numeric_value: Option<f64>,
    #[serde(default)]
    pub tier_label: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// Request to (re)rate an item; replaces any previous rating by the same user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRating {
    pub item_id: ItemId,
    pub user_id: UserId,
    pub rating_type: RatingType,
    pub numeric_value: Option<f64>,
    pub tier_label: Option<String>,
}

impl NewRating {
    /// Check the value fields against the rating type
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.rating_type.requires_numeric_value() {
            match self.numeric_value {
                Some(value) if (0.0..=100.0).contains(&value) => {}
                Some(value) => {
                    return Err(crate::error::EngineError::validation(format!(
                        "numeric value {} for item {} is outside 0-100",
                        value, self.item_id
                    ))
                    .into())
                }
                None => {
                    return Err(crate::error::EngineError::validation(format!(
                        "{:?} rating for item {} requires a numeric value",
                        self.rating_type, self.item_id
                    ))
                    .into())
                }
            }
        }

        if self.rating_type.requires_tier_label()
            && self
                .tier_label
                .as_deref()
                .map_or(true, |label| label.trim().is_empty())
        {
            return Err(crate::error::EngineError::validation(format!(
                "{:?} rating for item {} requires a tier label",
                self.rating_type, self.item_id
            ))
            .into());
        }

        Ok(())
    }

    /// Materialize the request into a stored rating
    pub fn into_rating(self) -> Rating {
        Rating {
            id: Uuid::new_v4(),
            item_id: self.item_id,
            user_id: self.user_id,
            rating_type: self.rating_type,
            numeric_value: self.numeric_value,
            tier_label: self.tier_label,
            created_at: Utc::now(),
        }
    }
}

/// Emotional polarity of a rank label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Whether a rank takes part in tier comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankKind {
    /// A real quality tier (S, A, "Favorites", ...)
    Ranked,
    /// A bookkeeping shelf ("Watchlist", "Dropped", ...)
    Utility,
}

/// A user-defined tier within a category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomRank {
    pub id: RankId,
    pub category_id: CategoryId,
    pub name: String,
    pub sentiment: Sentiment,
    pub color: String,
    pub sort_order: i32,
    pub kind: RankKind,
}

/// An item outside the user's collection, offered during discovery rounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenger {
    pub id: ItemId,
    pub display_name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub catalog_item_id: Option<String>,
}

/// Item joined with the user's rank placement and ratings, as consumed by analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedItem {
    #[serde(flatten)]
    pub item: Item,
    /// Custom rank name the item is filed under, if any
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub ratings: Vec<Rating>,
}

impl RatedItem {
    pub fn new(item: Item) -> Self {
        Self {
            item,
            rank: None,
            ratings: Vec::new(),
        }
    }

    /// Resolve the item's tier: explicit tier, then rank, then first rating's tier
    pub fn resolved_tier(&self) -> Option<&str> {
        let first_rating_tier = self
            .ratings
            .first()
            .and_then(|rating| rating.tier_label.as_deref());

        [self.item.current_tier.as_deref(), self.rank.as_deref(), first_rating_tier]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|tier| !tier.is_empty())
    }

    /// Whether the user has expressed any judgement on the item
    pub fn is_rated(&self) -> bool {
        !self.ratings.is_empty() || self.resolved_tier().is_some()
    }
}

/// A pending score change produced by a tournament session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreUpdate {
    pub item_id: ItemId,
    pub previous_score: f64,
    pub new_score: f64,
}

impl ScoreUpdate {
    /// Signed change from the persisted score
    pub fn delta(&self) -> f64 {
        self.new_score - self.previous_score
    }
}
