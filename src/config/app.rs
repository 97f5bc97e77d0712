//! Main application configuration
//!
//! This module defines the primary configuration structures for the taste engine,
//! including environment variable loading, TOML file loading and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use super::rating::EloSettings;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub elo: EloSettings,
    pub matchmaking: MatchmakingSettings,
    pub analytics: AnalyticsSettings,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Pair selection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchmakingSettings {
    /// Chance that a round pits a pool item against a challenger
    pub discovery_probability: f64,
    /// Fixed RNG seed; sessions draw from OS entropy when unset
    pub seed: Option<u64>,
}

/// Analytics query settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsSettings {
    /// Default number of tags returned by top-tag queries
    pub top_tags_limit: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "taste-engine".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for MatchmakingSettings {
    fn default() -> Self {
        Self {
            discovery_probability: crate::matchmaking::DEFAULT_DISCOVERY_PROBABILITY,
            seed: None,
        }
    }
}

impl Default for AnalyticsSettings {
    fn default() -> Self {
        Self { top_tags_limit: 10 }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Elo settings
        if let Ok(k) = env::var("ELO_K_FACTOR") {
            self.elo.k_factor = k
                .parse()
                .map_err(|_| anyhow!("Invalid ELO_K_FACTOR value: {}", k))?;
        }

        // Matchmaking settings
        if let Ok(probability) = env::var("DISCOVERY_PROBABILITY") {
            self.matchmaking.discovery_probability = probability
                .parse()
                .map_err(|_| anyhow!("Invalid DISCOVERY_PROBABILITY value: {}", probability))?;
        }
        if let Ok(seed) = env::var("MATCHMAKING_SEED") {
            self.matchmaking.seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid MATCHMAKING_SEED value: {}", seed))?,
            );
        }

        // Analytics settings
        if let Ok(limit) = env::var("TOP_TAGS_LIMIT") {
            self.analytics.top_tags_limit = limit
                .parse()
                .map_err(|_| anyhow!("Invalid TOP_TAGS_LIMIT value: {}", limit))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if !config.elo.k_factor.is_finite() || config.elo.k_factor <= 0.0 {
        return Err(anyhow!("Elo k factor must be positive"));
    }

    if !(0.0..=1.0).contains(&config.matchmaking.discovery_probability) {
        return Err(anyhow!(
            "Discovery probability must be between 0 and 1, got {}",
            config.matchmaking.discovery_probability
        ));
    }

    if config.analytics.top_tags_limit == 0 {
        return Err(anyhow!("Top tags limit must be greater than 0"));
    }

    Ok(())
}
