//! Output of the scraped records.
//!
//! A run produces exactly one JSON document which goes to exactly one
//! [`Sink`]: a local directory or an object-store bucket.
//!
//! # Submodules
//!
//! - [`json`]: Serialization, naming, and local file writes
//! - [`store`]: The [`ObjectStore`](store::ObjectStore) seam and its S3 implementation
//!
//! # Output Layout
//!
//! ```text
//! <output_dir>/
//! └── cryptopanic_2024-01-01_2024-01-01.json
//!
//! s3://<bucket>/
//! └── 2024/01/01/
//!     └── cryptopanic_2024-01-01_2024-01-01.json
//! ```

pub mod json;
pub mod store;

use crate::models::{FetchWindow, NewsRecord};
use std::fmt;
use std::path::PathBuf;
use store::{ObjectStore, StoreError};
use thiserror::Error;
use tracing::{error, info, instrument};

/// Where a run's document is written.
pub enum Sink<S> {
    /// Write into a local directory.
    Local { dir: PathBuf },
    /// Upload into `bucket` through `store`.
    ObjectStore { store: S, bucket: String },
}

/// Where a document ended up after a successful [`persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Persisted {
    Local(PathBuf),
    Uploaded { bucket: String, key: String },
}

impl fmt::Display for Persisted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persisted::Local(path) => write!(f, "{}", path.display()),
            Persisted::Uploaded { bucket, key } => write!(f, "s3://{bucket}/{key}"),
        }
    }
}

/// Errors raised while persisting a document.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: StoreError,
    },
}

/// Serialize `records` and write them to `sink`.
///
/// # Arguments
///
/// * `records` - Filtered records, in output order
/// * `window` - The run's window; determines file name and object key
/// * `sink` - Destination of the document
///
/// # Returns
///
/// The location of the written document.
///
/// # Errors
///
/// Returns a [`PersistError`] if serialization, the local write, or the
/// upload fails. Nothing is retried and a failed upload does not fall back
/// to a local write.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub async fn persist<S: ObjectStore>(
    records: &[NewsRecord],
    window: &FetchWindow,
    sink: &Sink<S>,
) -> Result<Persisted, PersistError> {
    let contents = json::to_pretty_json(records)?;
    let file_name = json::file_name(window);

    match sink {
        Sink::ObjectStore { store, bucket } => {
            let key = json::object_key(window);
            if let Err(e) = store.put_object(bucket, &key, contents).await {
                error!(%bucket, %key, error = %e, "Error uploading file to object store");
                return Err(PersistError::Upload {
                    bucket: bucket.clone(),
                    key,
                    source: e,
                });
            }
            info!(%bucket, %key, "Uploaded file to object store");
            Ok(Persisted::Uploaded {
                bucket: bucket.clone(),
                key,
            })
        }
        Sink::Local { dir } => match json::write_local(dir, &file_name, &contents).await {
            Ok(path) => {
                info!(path = %path.display(), "Saved file locally");
                Ok(Persisted::Local(path))
            }
            Err(source) => {
                let path = dir.join(&file_name);
                error!(path = %path.display(), error = %source, "Error saving file locally");
                Err(PersistError::Io { path, source })
            }
        },
    }
}
