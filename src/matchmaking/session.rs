//! Tournament sessions and the matchmaker that drives them
//!
//! A session holds the pool being ranked plus an overlay of session scores.
//! Votes only touch the overlay; nothing reaches the store until the caller
//! flushes. A session has a single owner, so the API takes `&mut self` and
//! callers sharing one across threads must serialize access themselves.

use crate::config::AppConfig;
use crate::error::{EngineError, Result};
use crate::matchmaking::pairing::{next_pair, Contender, MatchPair};
use crate::matchmaking::DEFAULT_DISCOVERY_PROBABILITY;
use crate::rating::{EloEngine, RatingStore};
use crate::types::{
    CategoryId, Challenger, CustomRank, Item, ItemId, RankKind, ScoreUpdate, SessionId, UserId,
    DEFAULT_ELO_SCORE,
};
use crate::utils::{current_timestamp, generate_session_id, labels_match};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Keep only items that take part in tier comparison
///
/// Items filed under a utility rank (watchlist, dropped, ...) are left out.
pub fn rateable_pool(items: Vec<Item>, ranks: &[CustomRank]) -> Vec<Item> {
    let utility: Vec<&str> = ranks
        .iter()
        .filter(|rank| rank.kind == RankKind::Utility)
        .map(|rank| rank.name.as_str())
        .collect();

    items
        .into_iter()
        .filter(|item| {
            item.current_tier.as_deref().map_or(true, |tier| {
                !utility.iter().any(|name| labels_match(name, tier))
            })
        })
        .collect()
}

/// One recorded vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub round: u32,
    pub winner_id: ItemId,
    pub loser_id: ItemId,
    pub winner_score_before: f64,
    pub loser_score_before: f64,
    pub winner_score_after: f64,
    pub loser_score_after: f64,
    pub discovery: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Result of recording a vote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteOutcome {
    pub winner: Contender,
    pub loser: Contender,
    pub new_winner_score: f64,
    pub new_loser_score: f64,
    pub next_pair: MatchPair,
}

/// Ephemeral state of one ranking session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TournamentSession {
    pub id: SessionId,
    pub user_id: UserId,
    pub category_id: Option<CategoryId>,
    pub started_at: DateTime<Utc>,
    pool: Vec<Item>,
    challengers: Vec<Challenger>,
    session_scores: HashMap<ItemId, f64>,
    history: Vec<VoteRecord>,
    round: u32,
}

impl TournamentSession {
    /// Create a session over `pool`, seeding challengers at `challenger_score`
    pub fn new(
        user_id: impl Into<UserId>,
        category_id: Option<CategoryId>,
        pool: Vec<Item>,
        challengers: Vec<Challenger>,
        challenger_score: f64,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for id in pool
            .iter()
            .map(|item| &item.id)
            .chain(challengers.iter().map(|challenger| &challenger.id))
        {
            if !seen.insert(id) {
                return Err(EngineError::validation(format!(
                    "item {} appears more than once in the session",
                    id
                ))
                .into());
            }
        }

        let session_scores = pool
            .iter()
            .map(|item| (item.id.clone(), item.elo_score))
            .chain(
                challengers
                    .iter()
                    .map(|challenger| (challenger.id.clone(), challenger_score)),
            )
            .collect();

        Ok(Self {
            id: generate_session_id(),
            user_id: user_id.into(),
            category_id,
            started_at: current_timestamp(),
            pool,
            challengers,
            session_scores,
            history: Vec::new(),
            round: 0,
        })
    }

    /// Build a session from the user's stored items
    pub fn hydrate(
        store: &dyn RatingStore,
        user_id: &str,
        category_id: Option<&str>,
        ranks: &[CustomRank],
        challengers: Vec<Challenger>,
    ) -> Result<Self> {
        let items = store.get_items_for_user(user_id, category_id)?;
        let pool = rateable_pool(items, ranks);

        // Challengers the user already owns are not discoveries
        let owned: HashSet<Option<&str>> = pool
            .iter()
            .filter_map(|item| item.catalog_item_id.as_deref())
            .map(Some)
            .collect();
        let challengers: Vec<Challenger> = challengers
            .into_iter()
            .filter(|challenger| !owned.contains(&challenger.catalog_item_id.as_deref()))
            .collect();

        info!(
            "Hydrated session for user {} with {} item(s) and {} challenger(s)",
            user_id,
            pool.len(),
            challengers.len()
        );

        Self::new(
            user_id,
            category_id.map(str::to_string),
            pool,
            challengers,
            DEFAULT_ELO_SCORE,
        )
    }

    pub fn pool(&self) -> &[Item] {
        &self.pool
    }

    pub fn challengers(&self) -> &[Challenger] {
        &self.challengers
    }

    pub fn history(&self) -> &[VoteRecord] {
        &self.history
    }

    /// Number of votes recorded so far
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Current session score of an item or challenger
    pub fn session_score(&self, id: &str) -> Option<f64> {
        self.session_scores.get(id).copied()
    }

    /// Owned items whose session score differs from the persisted one
    pub fn pending_updates(&self) -> Vec<ScoreUpdate> {
        self.pool
            .iter()
            .filter_map(|item| {
                let score = self.session_scores.get(&item.id).copied()?;
                (score != item.elo_score).then(|| ScoreUpdate {
                    item_id: item.id.clone(),
                    previous_score: item.elo_score,
                    new_score: score,
                })
            })
            .collect()
    }

    fn pick_pair<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        discovery_probability: f64,
    ) -> Result<MatchPair> {
        next_pair(
            rng,
            &self.pool,
            &self.challengers,
            &self.session_scores,
            discovery_probability,
        )
    }

    fn distinct_pool_size(&self) -> usize {
        self.pool
            .iter()
            .map(|item| &item.id)
            .collect::<HashSet<_>>()
            .len()
    }

    fn mark_persisted(&mut self, item_id: &str, score: f64) {
        if let Some(item) = self.pool.iter_mut().find(|item| item.id == item_id) {
            item.elo_score = score;
            item.updated_at = current_timestamp();
        }
    }
}

/// Drives a tournament session: picks pairs, scores votes
#[derive(Debug)]
pub struct Matchmaker<R = StdRng> {
    engine: EloEngine,
    discovery_probability: f64,
    rng: R,
    session: TournamentSession,
    current_pair: Option<MatchPair>,
}

impl Matchmaker<StdRng> {
    /// Create a matchmaker from application config
    ///
    /// Uses the configured seed when present so runs can be replayed.
    pub fn from_config(session: TournamentSession, config: &AppConfig) -> Result<Self> {
        let rng = match config.matchmaking.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Self::with_rng(
            session,
            EloEngine::from_settings(&config.elo)?,
            config.matchmaking.discovery_probability,
            rng,
        )
    }
}

impl<R: Rng> Matchmaker<R> {
    /// Create a matchmaker with an explicit random source
    pub fn with_rng(
        session: TournamentSession,
        engine: EloEngine,
        discovery_probability: f64,
        rng: R,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&discovery_probability) {
            return Err(EngineError::ConfigurationError {
                message: format!(
                    "discovery probability must be between 0 and 1, got {}",
                    discovery_probability
                ),
            }
            .into());
        }

        Ok(Self {
            engine,
            discovery_probability,
            rng,
            session,
            current_pair: None,
        })
    }

    /// Create a matchmaker with default Elo settings and discovery rate
    pub fn with_defaults(session: TournamentSession, rng: R) -> Self {
        Self {
            engine: EloEngine::default(),
            discovery_probability: DEFAULT_DISCOVERY_PROBABILITY,
            rng,
            session,
            current_pair: None,
        }
    }

    pub fn session(&self) -> &TournamentSession {
        &self.session
    }

    /// The pair awaiting a vote, selecting one if none is pending
    pub fn current_pair(&mut self) -> Result<MatchPair> {
        match &self.current_pair {
            Some(pair) => Ok(pair.clone()),
            None => self.advance(),
        }
    }

    /// Record a vote on `pair` and move on to the next pair
    ///
    /// `pair` must be the pair currently awaiting a vote. Pairs already voted
    /// on or skipped are rejected, and a rejected vote leaves the session
    /// untouched.
    pub fn record_vote(&mut self, pair: &MatchPair, winner_id: &str) -> Result<VoteOutcome> {
        let is_pending = self.current_pair.as_ref().is_some_and(|pending| {
            pending.left.id == pair.left.id && pending.right.id == pair.right.id
        });
        if !is_pending {
            return Err(EngineError::validation(format!(
                "pair {} vs {} is not awaiting a vote in session {}",
                pair.left.id, pair.right.id, self.session.id
            ))
            .into());
        }

        let (winner, loser) = pair.split(winner_id)?;

        let winner_before = self.score_of(winner)?;
        let loser_before = self.score_of(loser)?;

        // Drawing the follow-up pair must not fail once scores have moved
        let available = self.session.distinct_pool_size();
        if available < 2 {
            return Err(EngineError::InsufficientItems { available }.into());
        }

        let update = self.engine.update_ratings(winner_before, loser_before);
        self.current_pair = None;

        self.session
            .session_scores
            .insert(winner.id.clone(), update.winner_score);
        self.session
            .session_scores
            .insert(loser.id.clone(), update.loser_score);
        self.session.round += 1;

        self.session.history.push(VoteRecord {
            round: self.session.round,
            winner_id: winner.id.clone(),
            loser_id: loser.id.clone(),
            winner_score_before: winner_before,
            loser_score_before: loser_before,
            winner_score_after: update.winner_score,
            loser_score_after: update.loser_score,
            discovery: pair.is_discovery(),
            recorded_at: current_timestamp(),
        });

        debug!(
            "Round {}: {} ({} -> {}) beat {} ({} -> {})",
            self.session.round,
            winner.id,
            winner_before,
            update.winner_score,
            loser.id,
            loser_before,
            update.loser_score
        );

        let winner = Contender {
            score: winner_before,
            ..winner.clone()
        };
        let loser = Contender {
            score: loser_before,
            ..loser.clone()
        };
        let next_pair = self.advance()?;

        Ok(VoteOutcome {
            winner,
            loser,
            new_winner_score: update.winner_score,
            new_loser_score: update.loser_score,
            next_pair,
        })
    }

    /// Discard the pending pair without scoring it
    pub fn skip(&mut self) -> Result<MatchPair> {
        if let Some(skipped) = self.current_pair.take() {
            debug!("Skipped {} vs {}", skipped.left.id, skipped.right.id);
        }
        self.advance()
    }

    /// Persist session scores of owned items through the store
    ///
    /// Challenger scores are session-only and never flushed. Stops at the
    /// first store failure; updates persisted before it are not repeated on
    /// the next flush.
    pub fn flush(&mut self, store: &dyn RatingStore) -> Result<Vec<ScoreUpdate>> {
        let updates = self.session.pending_updates();

        for update in &updates {
            store.persist_elo_score(&update.item_id, update.new_score)?;
            self.session.mark_persisted(&update.item_id, update.new_score);
            debug!(
                "Persisted {} at {} ({:+})",
                update.item_id,
                update.new_score,
                update.delta()
            );
        }

        info!(
            "Flushed {} score update(s) for session {}",
            updates.len(),
            self.session.id
        );
        Ok(updates)
    }

    /// End the session, handing back its final state
    pub fn finish(self) -> TournamentSession {
        self.session
    }

    fn advance(&mut self) -> Result<MatchPair> {
        let pair = self
            .session
            .pick_pair(&mut self.rng, self.discovery_probability)?;
        debug!(
            "Next pair: {} vs {}{}",
            pair.left.id,
            pair.right.id,
            if pair.is_discovery() { " (discovery)" } else { "" }
        );
        self.current_pair = Some(pair.clone());
        Ok(pair)
    }

    fn score_of(&self, contender: &Contender) -> Result<f64> {
        self.session.session_score(&contender.id).ok_or_else(|| {
            EngineError::validation(format!(
                "contender {} does not belong to session {}",
                contender.id, self.session.id
            ))
            .into()
        })
    }
}
