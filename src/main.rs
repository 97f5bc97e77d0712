//! Command line entry point for the taste engine
//!
//! Runs one-off Elo updates and analytics queries over JSON item files and
//! prints the result as pretty JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taste_engine::analytics::{
    build_taste_vector, cohort_alignment_score, controversial_items, taste_match_details,
    tier_distribution, top_tags, CohortVector,
};
use taste_engine::config::AppConfig;
use taste_engine::ranks::{CustomRankRegistry, KeywordLabelClassifier, NewRank};
use taste_engine::{EloEngine, EngineError, RatedItem};
use tracing::{debug, info};

/// Category used for rank lookups when an item file is empty
const FALLBACK_CATEGORY: &str = "default";

/// Taste Engine - pairwise ranking and taste analytics
#[derive(Parser)]
#[command(
    name = "taste-engine",
    version,
    about = "Elo ranking and taste analytics for personal collections",
    long_about = "Taste Engine scores head-to-head comparisons with Elo, groups items into \
                 custom tiers, and reports on a user's taste: tier distribution, favourite tags, \
                 controversial placements, and similarity to other users or cohorts."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a single comparison to two scores
    Elo {
        winner: f64,
        loser: f64,
        /// K factor override
        #[arg(short, long)]
        k: Option<f64>,
    },
    /// Show how a collection spreads across tiers
    Distribution {
        items: PathBuf,
        /// Extra custom rank to register before counting (repeatable)
        #[arg(long = "rank", value_name = "NAME")]
        ranks: Vec<String>,
    },
    /// List items whose tier disagrees with their elo
    Controversial { items: PathBuf },
    /// Most frequent tags in a collection
    Tags {
        items: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Taste similarity between two users' collections
    Match { user_a: PathBuf, user_b: PathBuf },
    /// Align a collection against a cohort baseline
    Cohort { items: PathBuf, cohort: PathBuf },
    /// Validate configuration and exit
    CheckConfig,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    taste_engine::config::validate_config(&config)?;
    Ok(config)
}

fn read_items(path: &Path) -> Result<Vec<RatedItem>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read item file {}", path.display()))?;
    let items: Vec<RatedItem> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse item file {}", path.display()))?;
    debug!(path = %path.display(), count = items.len(), "Loaded items");
    Ok(items)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Elo { winner, loser, k } => {
            let engine = match k {
                Some(k) => EloEngine::new(k)?,
                None => EloEngine::from_settings(&config.elo)?,
            };
            print_json(&engine.update_ratings(winner, loser))
        }
        Command::Distribution { items, ranks } => {
            let items = read_items(&items)?;
            let category = items
                .first()
                .map(|rated| rated.item.category_id.clone())
                .unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

            let registry = CustomRankRegistry::new(Arc::new(KeywordLabelClassifier::new()));
            for name in ranks {
                registry.create_rank(&category, NewRank::named(name))?;
            }
            let ranks = registry.get_ranks(&category)?;

            print_json(&tier_distribution(&items, &ranks))
        }
        Command::Controversial { items } => print_json(&controversial_items(&read_items(&items)?)),
        Command::Tags { items, limit } => {
            let limit = limit.unwrap_or(config.analytics.top_tags_limit);
            print_json(&top_tags(&read_items(&items)?, limit))
        }
        Command::Match { user_a, user_b } => {
            let detail = taste_match_details(&read_items(&user_a)?, &read_items(&user_b)?)
                .ok_or_else(|| EngineError::InsufficientData {
                    reason: "too few shared, compared items".to_string(),
                })?;
            print_json(&detail)
        }
        Command::Cohort {
            items,
            cohort: cohort_path,
        } => {
            let raw = std::fs::read_to_string(&cohort_path)
                .with_context(|| format!("Failed to read cohort file {}", cohort_path.display()))?;
            let cohort: CohortVector = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse cohort file {}", cohort_path.display()))?;

            let vector = build_taste_vector(&read_items(&items)?);
            let alignment = cohort_alignment_score(&vector, &cohort).ok_or_else(|| {
                EngineError::InsufficientData {
                    reason: format!("no metrics shared with cohort {}", cohort.cohort),
                }
            })?;
            print_json(&alignment)
        }
        Command::CheckConfig => {
            info!("Configuration validation successful");
            print_json(config)
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    debug!(
        service = %config.service.name,
        version = taste_engine::VERSION,
        "Starting"
    );
    run(args.command, &config)
}
