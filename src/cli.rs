//! Command-line interface definitions for the CryptoPanic scraper.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Most arguments can also be provided via environment variables. The
//! legacy snake_case flag spellings (`--coins_file`, `--start_date`, ...)
//! are accepted as aliases.

use crate::api::DEFAULT_API_URL;
use crate::scrapers::cryptopanic::DEFAULT_PAGE_CEILING;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the CryptoPanic scraper.
///
/// # Examples
///
/// ```sh
/// # Yesterday's news, written to ./cryptopanic_<yesterday>_<yesterday>.json
/// cryptopanic_scraper --coins-file coins.json
///
/// # A fixed week uploaded to S3
/// cryptopanic_scraper --start-date 2024-01-01 --end-date 2024-01-08 \
///     --bucket-name cryptopanic-scraper
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON file containing the API key and the list of coins
    #[arg(long, alias = "coins_file", env = "CRYPTOPANIC_COINS_FILE", default_value = "coins.json")]
    pub coins_file: PathBuf,

    /// Start date for scraping (YYYY-MM-DD, UTC). Defaults to yesterday
    #[arg(long, alias = "start_date")]
    pub start_date: Option<String>,

    /// End date for scraping (YYYY-MM-DD, UTC). Defaults to today
    #[arg(long, alias = "end_date")]
    pub end_date: Option<String>,

    /// Time delta for grouping messages, in days
    #[arg(long, default_value_t = 1)]
    pub timedelta: u32,

    /// S3 bucket to upload into. When unset the file is written locally
    #[arg(long, alias = "bucket_name", env = "CRYPTOPANIC_BUCKET")]
    pub bucket_name: Option<String>,

    /// Name of the downstream function consuming the output
    #[arg(long, alias = "lambda_name", env = "CRYPTOPANIC_LAMBDA", default_value = "cryptopanic_scraper")]
    pub lambda_name: String,

    /// Directory for the local JSON file
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Base URL of the CryptoPanic API
    #[arg(long, env = "CRYPTOPANIC_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Stop paging after the first page numbered above this
    #[arg(long, default_value_t = DEFAULT_PAGE_CEILING)]
    pub page_ceiling: u32,

    /// Log file, truncated on every run
    #[arg(long, default_value = "scraper.log")]
    pub log_file: PathBuf,
}
