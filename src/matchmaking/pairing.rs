//! Pair selection for tournament rounds
//!
//! Pairs are drawn uniformly at random from the pool. With
//! `discovery_probability`, a round instead pits a pool item against a
//! challenger the user does not own yet.

use crate::error::{EngineError, Result};
use crate::types::{Challenger, Item, ItemId, DEFAULT_ELO_SCORE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Where a contender comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContenderOrigin {
    /// Part of the user's collection
    Owned,
    /// Discovery candidate outside the collection
    Challenger,
}

/// One side of a comparison, hydrated with its session score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contender {
    pub id: ItemId,
    pub display_name: String,
    pub score: f64,
    pub origin: ContenderOrigin,
}

impl Contender {
    fn owned(item: &Item, session_scores: &HashMap<ItemId, f64>) -> Self {
        Self {
            id: item.id.clone(),
            display_name: item.display_name.clone(),
            score: session_scores
                .get(&item.id)
                .copied()
                .unwrap_or(item.elo_score),
            origin: ContenderOrigin::Owned,
        }
    }

    fn challenger(challenger: &Challenger, session_scores: &HashMap<ItemId, f64>) -> Self {
        Self {
            id: challenger.id.clone(),
            display_name: challenger.display_name.clone(),
            score: session_scores
                .get(&challenger.id)
                .copied()
                .unwrap_or(DEFAULT_ELO_SCORE),
            origin: ContenderOrigin::Challenger,
        }
    }

    pub fn is_challenger(&self) -> bool {
        self.origin == ContenderOrigin::Challenger
    }
}

/// Two contenders awaiting a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: Contender,
    pub right: Contender,
}

impl MatchPair {
    /// Whether this round involves a challenger
    pub fn is_discovery(&self) -> bool {
        self.left.is_challenger() || self.right.is_challenger()
    }

    /// Split into (winner, loser) given the winning id
    pub fn split(&self, winner_id: &str) -> Result<(&Contender, &Contender)> {
        if self.left.id == winner_id {
            Ok((&self.left, &self.right))
        } else if self.right.id == winner_id {
            Ok((&self.right, &self.left))
        } else {
            Err(EngineError::validation(format!(
                "winner {} is not part of the pair {} vs {}",
                winner_id, self.left.id, self.right.id
            ))
            .into())
        }
    }
}

/// Select the next pair to compare
///
/// `session_scores` overrides the persisted score of any item or challenger
/// present in it.
pub fn next_pair<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &[Item],
    challengers: &[Challenger],
    session_scores: &HashMap<ItemId, f64>,
    discovery_probability: f64,
) -> Result<MatchPair> {
    let distinct = pool.iter().map(|item| &item.id).collect::<HashSet<_>>().len();
    if distinct < 2 {
        return Err(EngineError::InsufficientItems {
            available: distinct,
        }
        .into());
    }

    if !(0.0..=1.0).contains(&discovery_probability) {
        return Err(EngineError::validation(format!(
            "discovery probability {} is outside 0-1",
            discovery_probability
        ))
        .into());
    }

    if !challengers.is_empty() && rng.random_bool(discovery_probability) {
        let item = &pool[rng.random_range(0..pool.len())];
        let challenger = &challengers[rng.random_range(0..challengers.len())];

        return Ok(MatchPair {
            left: Contender::owned(item, session_scores),
            right: Contender::challenger(challenger, session_scores),
        });
    }

    let first = rng.random_range(0..pool.len());
    let second = loop {
        let candidate = rng.random_range(0..pool.len());
        if pool[candidate].id != pool[first].id {
            break candidate;
        }
    };

    Ok(MatchPair {
        left: Contender::owned(&pool[first], session_scores),
        right: Contender::owned(&pool[second], session_scores),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn pool(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| {
                Item::new(format!("item{}", i), format!("Item {}", i), "alice", "films")
                    .with_elo(1200.0 + i as f64 * 10.0)
            })
            .collect()
    }

    fn challengers(n: usize) -> Vec<Challenger> {
        (0..n)
            .map(|i| Challenger {
                id: format!("challenger{}", i),
                display_name: format!("Challenger {}", i),
                category_id: "films".to_string(),
                catalog_item_id: None,
            })
            .collect()
    }

    #[test]
    fn test_pool_too_small() {
        let mut rng = StdRng::seed_from_u64(1);
        let scores = HashMap::new();

        for size in 0..2 {
            let err = next_pair(&mut rng, &pool(size), &challengers(3), &scores, 0.2).unwrap_err();
            assert!(matches!(
                err.downcast_ref::<EngineError>(),
                Some(EngineError::InsufficientItems { .. })
            ));
        }
    }

    #[test]
    fn test_duplicate_ids_do_not_count_as_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        let twins = vec![
            Item::new("same", "Same", "alice", "films"),
            Item::new("same", "Same again", "alice", "films"),
        ];
        assert!(next_pair(&mut rng, &twins, &[], &HashMap::new(), 0.0).is_err());
    }

    #[test]
    fn test_session_scores_override_persisted() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = pool(2);
        let mut scores = HashMap::new();
        scores.insert("item0".to_string(), 1500.0);

        let pair = next_pair(&mut rng, &items, &[], &scores, 0.2).unwrap();
        for contender in [&pair.left, &pair.right] {
            match contender.id.as_str() {
                "item0" => assert_eq!(contender.score, 1500.0),
                "item1" => assert_eq!(contender.score, 1210.0),
                other => panic!("unexpected contender {}", other),
            }
        }
    }

    #[test]
    fn test_no_discovery_without_challengers() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = pool(4);
        for _ in 0..50 {
            let pair = next_pair(&mut rng, &items, &[], &HashMap::new(), 1.0).unwrap();
            assert!(!pair.is_discovery());
        }
    }

    #[test]
    fn test_forced_discovery_pairs_pool_item_with_challenger() {
        let mut rng = StdRng::seed_from_u64(11);
        let items = pool(3);
        let challengers = challengers(2);

        let pair = next_pair(&mut rng, &items, &challengers, &HashMap::new(), 1.0).unwrap();
        assert!(pair.is_discovery());
        assert_eq!(pair.left.origin, ContenderOrigin::Owned);
        assert_eq!(pair.right.origin, ContenderOrigin::Challenger);
        assert_eq!(pair.right.score, DEFAULT_ELO_SCORE);
    }

    #[test]
    fn test_discovery_rate_is_roughly_twenty_percent() {
        let mut rng = StdRng::seed_from_u64(2024);
        let items = pool(10);
        let challengers = challengers(5);
        let scores = HashMap::new();

        let discovery_rounds = (0..5000)
            .filter(|_| {
                next_pair(&mut rng, &items, &challengers, &scores, 0.2)
                    .unwrap()
                    .is_discovery()
            })
            .count();

        assert!((800..1200).contains(&discovery_rounds));
    }

    #[test]
    fn test_same_seed_same_pairs() {
        let items = pool(8);
        let challengers = challengers(2);
        let scores = HashMap::new();

        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..20 {
            assert_eq!(
                next_pair(&mut a, &items, &challengers, &scores, 0.2).unwrap(),
                next_pair(&mut b, &items, &challengers, &scores, 0.2).unwrap()
            );
        }
    }

    #[test]
    fn test_split_by_winner() {
        let mut rng = StdRng::seed_from_u64(5);
        let pair = next_pair(&mut rng, &pool(2), &[], &HashMap::new(), 0.0).unwrap();

        let (winner, loser) = pair.split(&pair.right.id).unwrap();
        assert_eq!(winner.id, pair.right.id);
        assert_eq!(loser.id, pair.left.id);

        let err = pair.split("nobody").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EngineError>(),
            Some(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_invalid_probability() {
        let mut rng = StdRng::seed_from_u64(5);
        assert!(next_pair(&mut rng, &pool(2), &challengers(1), &HashMap::new(), 1.5).is_err());
    }

    proptest! {
        #[test]
        fn prop_pair_never_repeats_an_id(seed in any::<u64>(), size in 2usize..12, n_challengers in 0usize..4) {
            let mut rng = StdRng::seed_from_u64(seed);
            let items = pool(size);
            let challengers = challengers(n_challengers);
            let pair = next_pair(&mut rng, &items, &challengers, &HashMap::new(), 0.2).unwrap();
            prop_assert_ne!(pair.left.id, pair.right.id);
        }
    }
}
