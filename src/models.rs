//! Data models for CryptoPanic posts and the records written to disk.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ApiPost`] / [`PostsPage`]: Raw wire types returned by the posts endpoint
//! - [`NewsRecord`]: A filtered post as it appears in the output document
//! - [`FetchWindow`]: The inclusive UTC publication window for a run
//! - [`RunConfig`] / [`Destination`]: Resolved settings for a single run

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;

/// A single post as returned by the CryptoPanic `posts` endpoint.
///
/// Only the fields the scraper needs are modelled; everything else in the
/// payload is ignored. Both fields are kept as raw JSON values so that one
/// badly typed item is dealt with on its own instead of failing the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiPost {
    /// Publication time, expected as a `YYYY-MM-DDTHH:MM:SSZ` string.
    pub published_at: Option<Value>,
    /// The headline of the post, normally a string.
    pub title: Option<Value>,
}

impl ApiPost {
    /// Headline as text. Missing or `null` titles are empty, non-string
    /// titles are rendered as their JSON text (`1704085200`, `true`).
    pub fn title_text(&self) -> String {
        match &self.title {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(title)) => title.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// One page of results from the posts endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostsPage {
    /// Posts on this page, newest first.
    #[serde(default)]
    pub results: Vec<ApiPost>,
}

/// A post that passed the window filter.
///
/// This is the unit of the output document. `date` carries an explicit
/// `+00:00` offset and `text` is the headline followed by a newline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewsRecord {
    /// ISO-8601 publication timestamp with UTC offset.
    pub date: String,
    /// Headline text terminated by `\n`.
    pub text: String,
}

impl NewsRecord {
    /// Build a record from a parsed publication instant and a headline.
    pub fn new(published_at: DateTime<Utc>, title: &str) -> Self {
        Self {
            date: published_at.to_rfc3339_opts(SecondsFormat::Secs, false),
            text: format!("{title}\n"),
        }
    }
}

/// Inclusive UTC publication window: `start <= published_at <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl FetchWindow {
    /// Create a window, returning `None` when `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Whether `ts` lies inside the window, bounds included.
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Whether `ts` is older than the window.
    pub fn is_before(&self, ts: DateTime<Utc>) -> bool {
        ts < self.start
    }
}

impl fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Where the output document goes. Exactly one per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write the file into a local directory.
    Local { dir: PathBuf },
    /// Upload the file into an object-store bucket.
    Bucket { name: String },
}

/// Fully resolved settings for a single scraper run.
///
/// Built once by the driver and read-only afterwards. The API key is
/// redacted from the `Debug` output.
#[derive(Clone)]
pub struct RunConfig {
    /// CryptoPanic API token.
    pub api_key: String,
    /// Currency symbols, in the order they are sent to the API.
    pub currencies: Vec<String>,
    /// Publication window used for filtering.
    pub window: FetchWindow,
    /// Grouping interval in days. Informational only.
    pub interval_days: u32,
    /// Output destination.
    pub destination: Destination,
    /// Highest page number whose posts are trusted before stopping.
    pub page_ceiling: u32,
    /// Name of the downstream function that consumes the output. Informational only.
    pub lambda_name: String,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("api_key", &"<redacted>")
            .field("currencies", &self.currencies)
            .field("window", &self.window)
            .field("interval_days", &self.interval_days)
            .field("destination", &self.destination)
            .field("page_ceiling", &self.page_ceiling)
            .field("lambda_name", &self.lambda_name)
            .finish()
    }
}
