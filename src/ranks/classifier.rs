//! Sentiment classification for rank labels
//!
//! The registry only needs "is this label positive, neutral or negative?".
//! Production deployments plug in an LLM-backed classifier; the keyword
//! classifier here works offline and is used as the default.

use crate::error::Result;
use crate::types::Sentiment;

/// Capability to classify a rank label's sentiment
#[cfg_attr(test, mockall::automock)]
pub trait LabelClassifier: Send + Sync {
    /// Classify `text`; may fail if the backing service is unavailable
    fn classify_sentiment(&self, text: &str) -> Result<Sentiment>;
}

const POSITIVE_WORDS: &[&str] = &[
    "favorite", "favourite", "favorites", "favourites", "fave", "faves", "love", "loved",
    "best", "great", "amazing", "awesome", "masterpiece", "masterpieces", "perfect", "goat",
    "classic", "classics", "excellent", "top", "gem", "gems", "essential", "must",
];

const NEGATIVE_WORDS: &[&str] = &[
    "worst", "hate", "hated", "bad", "awful", "terrible", "trash", "garbage", "avoid",
    "overrated", "boring", "disappointing", "disappointment", "dropped", "regret", "skip",
    "meh", "mid",
];

/// Lexicon-based classifier that needs no external service
#[derive(Debug, Clone, Default)]
pub struct KeywordLabelClassifier;

impl KeywordLabelClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl LabelClassifier for KeywordLabelClassifier {
    fn classify_sentiment(&self, text: &str) -> Result<Sentiment> {
        let lowered = text.to_lowercase();
        let mut balance = 0i32;

        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if POSITIVE_WORDS.contains(&word) {
                balance += 1;
            } else if NEGATIVE_WORDS.contains(&word) {
                balance -= 1;
            }
        }

        Ok(match balance {
            b if b > 0 => Sentiment::Positive,
            b if b < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        })
    }
}
