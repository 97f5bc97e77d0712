//! Alignment between one user's taste profile and a cohort baseline
//!
//! A user's profile is a small set of named metrics derived from their
//! collection. Cohort baselines come from outside the engine, together with
//! how far each metric moved over the last week and month. Each shared metric
//! is scored on the same bounded linear scale used for pairwise taste matching.

use std::collections::BTreeMap;

use crate::analytics::controversy::tier_value;
use crate::types::RatedItem;
use crate::utils::{bounded_similarity, rating_difference};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MEAN_ELO: &str = "mean_elo";
pub const ELO_SPREAD: &str = "elo_spread";
pub const TOP_TIER_SHARE: &str = "top_tier_share";
pub const RATED_ITEMS: &str = "rated_items";

/// Distance at which a metric stops counting toward alignment
pub const DEFAULT_METRIC_SCALE: f64 = 800.0;

// S and A
const TOP_TIER_MIN_VALUE: u8 = 5;

/// Named metrics describing a user's taste
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TasteVector {
    pub metrics: BTreeMap<String, f64>,
}

impl TasteVector {
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }
}

/// Cohort baseline for a single metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMetric {
    pub value: f64,
    #[serde(default = "default_metric_scale")]
    pub scale: f64,
    #[serde(default)]
    pub week_delta: Option<f64>,
    #[serde(default)]
    pub month_delta: Option<f64>,
}

fn default_metric_scale() -> f64 {
    DEFAULT_METRIC_SCALE
}

impl CohortMetric {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            scale: DEFAULT_METRIC_SCALE,
            week_delta: None,
            month_delta: None,
        }
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_deltas(mut self, week_delta: f64, month_delta: f64) -> Self {
        self.week_delta = Some(week_delta);
        self.month_delta = Some(month_delta);
        self
    }
}

/// Baseline metrics for a group of users
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortVector {
    pub cohort: String,
    pub metrics: BTreeMap<String, CohortMetric>,
}

impl CohortVector {
    pub fn new(cohort: impl Into<String>) -> Self {
        Self {
            cohort: cohort.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, name: impl Into<String>, metric: CohortMetric) -> Self {
        self.metrics.insert(name.into(), metric);
        self
    }
}

/// How one metric compares with the cohort
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAlignment {
    pub metric: String,
    pub user_value: f64,
    pub cohort_value: f64,
    pub difference: f64,
    pub score: u8,
    pub week_delta: Option<f64>,
    pub month_delta: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortAlignment {
    pub cohort: String,
    pub score: u8,
    pub metric_breakdown: Vec<MetricAlignment>,
}

/// Score how closely a user's metrics track a cohort's
///
/// Metrics present on only one side are ignored, as are cohort metrics with a
/// non-positive scale. Returns `None` when no metric can be compared.
pub fn cohort_alignment_score(
    user_vector: &TasteVector,
    cohort_vector: &CohortVector,
) -> Option<CohortAlignment> {
    let mut raw_scores = Vec::new();
    let mut metric_breakdown = Vec::new();

    for (name, baseline) in &cohort_vector.metrics {
        let Some(user_value) = user_vector.get(name) else {
            continue;
        };
        if !baseline.scale.is_finite() || baseline.scale <= 0.0 {
            warn!(
                cohort = %cohort_vector.cohort,
                metric = %name,
                scale = baseline.scale,
                "Skipping cohort metric with invalid scale"
            );
            continue;
        }

        let difference = rating_difference(user_value, baseline.value);
        let score = bounded_similarity(difference, baseline.scale);
        raw_scores.push(score);

        metric_breakdown.push(MetricAlignment {
            metric: name.clone(),
            user_value,
            cohort_value: baseline.value,
            difference,
            score: score.round() as u8,
            week_delta: baseline.week_delta,
            month_delta: baseline.month_delta,
        });
    }

    if raw_scores.is_empty() {
        return None;
    }

    let mean = raw_scores.iter().sum::<f64>() / raw_scores.len() as f64;
    Some(CohortAlignment {
        cohort: cohort_vector.cohort.clone(),
        score: mean.round() as u8,
        metric_breakdown,
    })
}

/// Derive a user's taste metrics from their collection
///
/// Only rated items contribute. An empty vector is returned when nothing has
/// been rated yet.
pub fn build_taste_vector(items: &[RatedItem]) -> TasteVector {
    let rated: Vec<&RatedItem> = items.iter().filter(|item| item.is_rated()).collect();
    if rated.is_empty() {
        return TasteVector::default();
    }

    let count = rated.len() as f64;
    let mean_elo = rated.iter().map(|item| item.item.elo_score).sum::<f64>() / count;
    let variance = rated
        .iter()
        .map(|item| (item.item.elo_score - mean_elo).powi(2))
        .sum::<f64>()
        / count;

    let tier_values: Vec<u8> = rated
        .iter()
        .filter_map(|item| item.resolved_tier().and_then(tier_value))
        .collect();

    let mut vector = TasteVector::default()
        .with_metric(MEAN_ELO, mean_elo)
        .with_metric(ELO_SPREAD, variance.sqrt())
        .with_metric(RATED_ITEMS, count);

    if !tier_values.is_empty() {
        let top = tier_values
            .iter()
            .filter(|value| **value >= TOP_TIER_MIN_VALUE)
            .count();
        vector = vector.with_metric(
            TOP_TIER_SHARE,
            top as f64 / tier_values.len() as f64 * 100.0,
        );
    }

    vector
}
