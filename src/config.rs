//! Run configuration: coins file loading and date window resolution.
//!
//! The coins file is a small JSON document holding the API token and the
//! currencies to follow:
//!
//! ```json
//! { "key": "<cryptopanic api token>", "coins": ["BTC", "ETH", "XRP"] }
//! ```
//!
//! Dates given on the command line are whole UTC days (`YYYY-MM-DD`). A
//! missing start defaults to yesterday's midnight and a missing end to
//! today's midnight, so an unattended daily run covers exactly the previous
//! day.

use crate::cli::Cli;
use crate::clock::{Clock, midnight_utc};
use crate::models::{Destination, FetchWindow, RunConfig};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Contents of the coins file.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinsFile {
    /// CryptoPanic API token.
    pub key: String,
    /// Currency symbols to request.
    pub coins: Vec<String>,
}

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read coins file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse coins file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("coins file {} has an empty `key`", .0.display())]
    MissingKey(PathBuf),
    #[error("coins file {} lists no coins", .0.display())]
    NoCoins(PathBuf),
    #[error("invalid date {value:?} (expected YYYY-MM-DD): {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("start date {start} is after end date {end}")]
    InvertedWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

/// Load and validate the coins file at `path`.
///
/// Blank entries in `coins` are dropped; the remaining symbols keep their
/// order.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, the key is empty,
/// or no coins remain.
pub fn load_coins_file(path: &Path) -> Result<CoinsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut file: CoinsFile = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    file.key = file.key.trim().to_string();
    if file.key.is_empty() {
        return Err(ConfigError::MissingKey(path.to_path_buf()));
    }

    file.coins = file
        .coins
        .into_iter()
        .map(|coin| coin.trim().to_string())
        .filter(|coin| !coin.is_empty())
        .collect();
    if file.coins.is_empty() {
        return Err(ConfigError::NoCoins(path.to_path_buf()));
    }

    Ok(file)
}

/// Parse a `YYYY-MM-DD` date as midnight UTC.
pub fn parse_date(value: &str) -> Result<DateTime<Utc>, ConfigError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|source| ConfigError::InvalidDate {
            value: value.to_string(),
            source,
        })
}

/// Resolve the publication window from optional CLI dates.
///
/// # Arguments
///
/// * `start` - Start date, or `None` for yesterday (UTC midnight)
/// * `end` - End date, or `None` for today (UTC midnight)
/// * `clock` - Source of "today"
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    clock: &impl Clock,
) -> Result<FetchWindow, ConfigError> {
    let today = midnight_utc(clock.now());

    let start = match start {
        Some(value) => parse_date(value)?,
        None => today - TimeDelta::days(1),
    };
    let end = match end {
        Some(value) => parse_date(value)?,
        None => today,
    };

    FetchWindow::new(start, end).ok_or(ConfigError::InvertedWindow { start, end })
}

/// Build the full [`RunConfig`] from parsed CLI arguments.
///
/// An empty `--bucket-name` is treated the same as no bucket.
#[instrument(level = "info", skip_all, fields(coins_file = %cli.coins_file.display()))]
pub fn build_run_config(cli: &Cli, clock: &impl Clock) -> Result<RunConfig, ConfigError> {
    let coins = load_coins_file(&cli.coins_file)?;
    let window = resolve_window(cli.start_date.as_deref(), cli.end_date.as_deref(), clock)?;

    let destination = match cli.bucket_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Destination::Bucket {
            name: name.to_string(),
        },
        _ => Destination::Local {
            dir: cli.output_dir.clone(),
        },
    };

    info!(
        coins = coins.coins.len(),
        %window,
        ?destination,
        "Configuration loaded"
    );

    Ok(RunConfig {
        api_key: coins.key,
        currencies: coins.coins,
        window,
        interval_days: cli.timedelta,
        destination,
        page_ceiling: cli.page_ceiling,
        lambda_name: cli.lambda_name.clone(),
    })
}
