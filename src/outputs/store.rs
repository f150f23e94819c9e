//! Object storage for uploaded documents.
//!
//! [`ObjectStore`] is the seam used by [`persist`](super::persist); the live
//! implementation is [`S3Store`], built from the ambient AWS environment
//! (env vars, profile, instance role).

use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, instrument};

/// Boxed error returned by object store backends.
pub type StoreError = Box<dyn Error + Send + Sync>;

/// Trait for writing whole objects into a bucket.
pub trait ObjectStore {
    /// Store `body` under `key` in `bucket`, replacing any existing object.
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError>;
}

/// Amazon S3 (or S3-compatible) object store.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Build a client from the standard AWS configuration chain.
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: Client::new(&config),
        }
    }
}

impl ObjectStore for S3Store {
    #[instrument(level = "info", skip_all, fields(%bucket, %key, bytes = body.len()))]
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), StoreError> {
        let t0 = Instant::now();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await?;
        debug!(elapsed_ms = t0.elapsed().as_millis(), "PutObject succeeded");
        Ok(())
    }
}
