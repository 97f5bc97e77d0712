//! Elo rating configuration

use serde::{Deserialize, Serialize};

use crate::rating::elo::DEFAULT_K_FACTOR;

/// Parameters for the pairwise Elo update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EloSettings {
    /// Maximum points exchanged per comparison
    pub k_factor: f64,
}

impl Default for EloSettings {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
        }
    }
}
