//! # CryptoPanic Scraper
//!
//! Collects news headlines from the CryptoPanic API for a configured set of
//! cryptocurrencies over a date window and stores them as a single JSON
//! document, either locally or in an S3 bucket.
//!
//! ## Usage
//!
//! ```sh
//! cryptopanic_scraper --coins-file coins.json --start-date 2024-01-01 --end-date 2024-01-02
//! ```
//!
//! ## Architecture
//!
//! The application is a linear pipeline:
//! 1. **Configuration**: Load the API key and coins, resolve the date window
//! 2. **Fetching**: Page through the posts endpoint, keeping posts inside the window
//! 3. **Output**: Write the JSON document to the local directory or upload it

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod clock;
mod config;
mod models;
mod outputs;
mod scrapers;
mod utils;

use api::CryptoPanicClient;
use cli::Cli;
use clock::SystemClock;
use models::Destination;
use outputs::store::S3Store;
use outputs::{Sink, persist};
use scrapers::cryptopanic::fetch_news;
use utils::ensure_writable_dir;

/// Install the global subscriber: stdout plus a log file truncated on start.
fn init_tracing(log_file: &Path) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file = std::fs::File::create(log_file)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tfmt::layer()
                .with_target(true)
                .with_timer(UtcTime::rfc_3339()),
        )
        .with(
            tfmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_timer(UtcTime::rfc_3339())
                .with_writer(Arc::new(file)),
        )
        .try_init()?;
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();
    init_tracing(&args.log_file)?;

    let start_time = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "cryptopanic_scraper starting up");

    let config = match config::build_run_config(&args, &SystemClock) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };
    info!(
        window = %config.window,
        currencies = ?config.currencies,
        interval_days = config.interval_days,
        lambda_name = %config.lambda_name,
        "Starting CryptoPanic scraper"
    );

    // Early check: ensure the local output dir is writable before spending API calls
    if let Destination::Local { dir } = &config.destination {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir.display(),
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    // ---- Fetch ----
    let client = CryptoPanicClient::new(&args.api_url, config.api_key.clone())?;
    info!("Scraping news started");
    let records = fetch_news(&client, &config.currencies, &config.window, config.page_ceiling).await;
    info!(count = records.len(), "Scraping completed");

    // ---- Output ----
    let persisted = match &config.destination {
        Destination::Bucket { name } => {
            let sink = Sink::ObjectStore {
                store: S3Store::from_env().await,
                bucket: name.clone(),
            };
            persist(&records, &config.window, &sink).await
        }
        Destination::Local { dir } => {
            let sink: Sink<S3Store> = Sink::Local { dir: dir.clone() };
            persist(&records, &config.window, &sink).await
        }
    };
    match persisted {
        Ok(location) => info!(%location, records = records.len(), "Output stored"),
        Err(e) => error!(error = %e, "Failed to store output"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "CryptoPanic scraper finished"
    );

    Ok(())
}
