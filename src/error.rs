//! Error types for the ranking engine
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the crate. Callers that need to branch on the failure kind can
//! `downcast_ref::<EngineError>()` the returned error.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific engine failures
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Not enough items to build a pair: {available} distinct item(s) available")]
    InsufficientItems { available: usize },

    #[error("Insufficient data: {reason}")]
    InsufficientData { reason: String },

    #[error("Rank not found: {rank_id}")]
    RankNotFound { rank_id: String },

    #[error("Item not found: {item_id}")]
    ItemNotFound { item_id: String },

    #[error("Label classifier unavailable: {message}")]
    ClassifierUnavailable { message: String },

    #[error("Rating store unavailable: {message}")]
    StoreUnavailable { message: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal engine error: {message}")]
    InternalError { message: String },
}

impl EngineError {
    /// Shorthand for a validation failure
    pub fn validation(reason: impl Into<String>) -> Self {
        EngineError::Validation {
            reason: reason.into(),
        }
    }

    /// Error used when an `RwLock` has been poisoned by a panicking writer
    pub(crate) fn lock_poisoned(what: &str) -> Self {
        EngineError::InternalError {
            message: format!("Failed to acquire {} lock", what),
        }
    }
}
