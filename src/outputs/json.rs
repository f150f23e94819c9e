//! JSON document generation and naming.
//!
//! The output of a run is a single pretty-printed JSON array of
//! [`NewsRecord`]s. Its name is derived from the fetch window only, so
//! re-running the same window overwrites the previous document.
//!
//! # Naming
//!
//! ```text
//! cryptopanic_<start>_<end - 1 day>.json           (file name)
//! <start:YYYY/MM/DD>/cryptopanic_<...>.json        (object key)
//! ```
//!
//! The end date is shifted back one day because windows are usually
//! midnight-to-midnight: a window ending at `2024-01-02T00:00:00Z` covers the
//! news of `2024-01-01`.

use crate::models::{FetchWindow, NewsRecord};
use chrono::TimeDelta;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Render records as a JSON array with 4-space indentation.
///
/// Non-ASCII characters are written as-is (UTF-8), not `\u` escaped.
pub fn to_pretty_json(records: &[NewsRecord]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    records.serialize(&mut ser)?;
    Ok(buf)
}

/// File name for the document covering `window`.
pub fn file_name(window: &FetchWindow) -> String {
    let last_day = window.end - TimeDelta::days(1);
    format!(
        "cryptopanic_{}_{}.json",
        window.start.format("%Y-%m-%d"),
        last_day.format("%Y-%m-%d")
    )
}

/// Object-store key for the document covering `window`.
pub fn object_key(window: &FetchWindow) -> String {
    format!("{}/{}", window.start.format("%Y/%m/%d"), file_name(window))
}

/// Write an already rendered document into `dir`, replacing any existing file.
///
/// # Returns
///
/// The full path of the written file.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), %file_name))]
pub async fn write_local(dir: &Path, file_name: &str, contents: &[u8]) -> std::io::Result<PathBuf> {
    let path = dir.join(file_name);
    fs::write(&path, contents).await?;
    info!(path = %path.display(), bytes = contents.len(), "Wrote JSON file");
    Ok(path)
}
