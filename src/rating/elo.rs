//! Pairwise Elo scoring
//!
//! Thin wrapper around the Elo implementation in the skillratings crate. Scores
//! are rounded to whole points after every comparison and never drop below zero.

use serde::{Deserialize, Serialize};
use skillratings::elo::{elo, expected_score as elo_expected_score, EloConfig, EloRating};
use skillratings::Outcomes;

use crate::config::EloSettings;
use crate::error::{EngineError, Result};

/// Points at stake in a single comparison unless configured otherwise
pub const DEFAULT_K_FACTOR: f64 = 32.0;

/// Winner and loser scores after a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EloUpdate {
    pub winner_score: f64,
    pub loser_score: f64,
}

/// Stateless Elo scorer with a fixed k factor
#[derive(Debug, Clone)]
pub struct EloEngine {
    config: EloConfig,
}

impl EloEngine {
    /// Create an engine with the given k factor
    pub fn new(k_factor: f64) -> Result<Self> {
        if !k_factor.is_finite() || k_factor <= 0.0 {
            return Err(EngineError::ConfigurationError {
                message: format!("k factor must be positive, got {}", k_factor),
            }
            .into());
        }

        Ok(Self {
            config: EloConfig { k: k_factor },
        })
    }

    /// Create an engine from the `[elo]` config section
    pub fn from_settings(settings: &EloSettings) -> Result<Self> {
        Self::new(settings.k_factor)
    }

    pub fn k_factor(&self) -> f64 {
        self.config.k
    }

    /// Score both sides of a decided comparison
    pub fn update_ratings(&self, winner_score: f64, loser_score: f64) -> EloUpdate {
        let winner = EloRating {
            rating: winner_score,
        };
        let loser = EloRating {
            rating: loser_score,
        };

        let (new_winner, new_loser) = elo(&winner, &loser, &Outcomes::WIN, &self.config);

        EloUpdate {
            winner_score: new_winner.rating.round().max(0.0),
            loser_score: new_loser.rating.round().max(0.0),
        }
    }
}

impl Default for EloEngine {
    fn default() -> Self {
        Self {
            config: EloConfig {
                k: DEFAULT_K_FACTOR,
            },
        }
    }
}

/// Probability that a side scored `score` beats a side scored `opponent_score`
pub fn expected_score(score: f64, opponent_score: f64) -> f64 {
    let (expected, _) = elo_expected_score(
        &EloRating { rating: score },
        &EloRating {
            rating: opponent_score,
        },
    );
    expected
}

/// Free-function form of [`EloEngine::update_ratings`]
pub fn update_ratings(winner_score: f64, loser_score: f64, k_factor: f64) -> Result<(f64, f64)> {
    let update = EloEngine::new(k_factor)?.update_ratings(winner_score, loser_score);
    Ok((update.winner_score, update.loser_score))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_scores_exchange_half_k() {
        let engine = EloEngine::default();
        let update = engine.update_ratings(1200.0, 1200.0);

        assert_eq!(update.winner_score, 1216.0);
        assert_eq!(update.loser_score, 1184.0);
    }

    #[test]
    fn test_free_function_matches_engine() {
        let (winner, loser) = update_ratings(1200.0, 1200.0, 32.0).unwrap();
        assert_eq!((winner, loser), (1216.0, 1184.0));
    }

    #[test]
    fn test_upset_moves_more_points() {
        let engine = EloEngine::default();

        let expected_win = engine.update_ratings(1600.0, 1200.0);
        let upset = engine.update_ratings(1200.0, 1600.0);

        assert!(expected_win.winner_score - 1600.0 < 4.0);
        assert!(upset.winner_score - 1200.0 > 28.0);
        assert_eq!(upset.winner_score, 1229.0);
        assert_eq!(upset.loser_score, 1571.0);
    }

    #[test]
    fn test_scores_are_whole_numbers() {
        let engine = EloEngine::new(24.0).unwrap();
        let update = engine.update_ratings(1337.0, 1211.0);

        assert_eq!(update.winner_score.fract(), 0.0);
        assert_eq!(update.loser_score.fract(), 0.0);
    }

    #[test]
    fn test_scores_never_negative() {
        let engine = EloEngine::default();
        let update = engine.update_ratings(5.0, 10.0);
        assert_eq!(update.winner_score, 21.0);
        assert_eq!(update.loser_score, 0.0);
    }

    #[test]
    fn test_expected_score() {
        assert!((expected_score(1200.0, 1200.0) - 0.5).abs() < 1e-9);
        assert!((expected_score(1600.0, 1200.0) - 10.0 / 11.0).abs() < 1e-9);
        assert!(expected_score(1000.0, 1400.0) < 0.1);
    }

    #[test]
    fn test_invalid_k_factor() {
        assert!(EloEngine::new(0.0).is_err());
        assert!(EloEngine::new(-8.0).is_err());
        assert!(EloEngine::new(f64::NAN).is_err());
        assert!(update_ratings(1200.0, 1200.0, 0.0).is_err());
    }

    proptest! {
        #[test]
        fn prop_update_is_zero_sum_within_rounding(
            winner in 100.0f64..3000.0,
            loser in 100.0f64..3000.0,
        ) {
            let winner = winner.round();
            let loser = loser.round();
            let update = EloEngine::default().update_ratings(winner, loser);

            let gained = update.winner_score - winner;
            let lost = update.loser_score - loser;
            prop_assert!((gained + lost).abs() <= 1.0);
            prop_assert!(gained >= 0.0);
            prop_assert!(lost <= 0.0);
        }
    }
}
