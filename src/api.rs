//! CryptoPanic posts API access.
//!
//! This module provides the seam between the scraper and the network.
//!
//! # Architecture
//!
//! - [`PostsApi`]: Core trait for retrieving one page of posts
//! - [`CryptoPanicClient`]: `reqwest`-backed implementation talking to the live API
//! - [`ApiError`]: Everything that can go wrong while retrieving a page
//!
//! Requests are never retried. Any failure ends the run's fetch phase and
//! the caller decides what an aborted fetch means.

use crate::models::PostsPage;
use crate::utils::truncate_for_log;
use itertools::Itertools;
use reqwest::{Client, StatusCode};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default host of the CryptoPanic API.
pub const DEFAULT_API_URL: &str = "https://cryptopanic.com";

/// Path of the posts endpoint, relative to the API host.
const POSTS_PATH: &str = "api/v1/posts/";

/// Errors returned while retrieving a page of posts.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-success status.
    #[error("posts endpoint returned HTTP {0}")]
    Status(StatusCode),
    /// The request never produced a complete response. The URL is stripped
    /// from the inner error because it carries the auth token.
    #[error("request to posts endpoint failed: {0}")]
    Transport(reqwest::Error),
    /// The response body was not a valid posts page.
    #[error("could not decode posts page: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Trait for retrieving pages of news posts.
///
/// Implementors fetch exactly one page per call and never retry. This
/// abstraction allows the pagination loop to run against a scripted fake
/// in tests.
pub trait PostsApi {
    /// Retrieve page `page` (1-based) of posts mentioning any of `currencies`.
    ///
    /// # Arguments
    ///
    /// * `currencies` - Currency symbols, sent comma-joined in request order
    /// * `page` - 1-based page number
    ///
    /// # Returns
    ///
    /// The decoded page, or an [`ApiError`] if the request failed in any way.
    async fn posts_page(&self, currencies: &[String], page: u32) -> Result<PostsPage, ApiError>;
}

/// HTTP client for the CryptoPanic posts endpoint.
///
/// Holds one `reqwest::Client` for the whole run so that connections are
/// reused between pages.
pub struct CryptoPanicClient {
    http: Client,
    endpoint: Url,
    auth_token: String,
}

impl ApiError {
    fn transport(e: reqwest::Error) -> Self {
        ApiError::Transport(e.without_url())
    }
}

impl CryptoPanicClient {
    /// Create a client for the API hosted at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Scheme and host of the API, e.g. `https://cryptopanic.com`
    /// * `auth_token` - CryptoPanic API token
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` is not a valid absolute URL.
    pub fn new(base_url: &str, auth_token: String) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(base_url)?.join(POSTS_PATH)?;
        Ok(Self {
            http: Client::new(),
            endpoint,
            auth_token,
        })
    }

    /// Build the full request URL for a page, including the auth token.
    fn page_url(&self, currencies: &[String], page: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("auth_token", &self.auth_token)
            .append_pair("currencies", &currencies.iter().join(","))
            .append_pair("page", &page.to_string());
        url
    }
}

impl std::fmt::Debug for CryptoPanicClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoPanicClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish()
    }
}

impl PostsApi for CryptoPanicClient {
    // The URL carries the auth token, so it is never recorded in the span.
    #[instrument(level = "info", skip_all, fields(page = page))]
    async fn posts_page(&self, currencies: &[String], page: u32) -> Result<PostsPage, ApiError> {
        let t0 = Instant::now();
        let response = self
            .http
            .get(self.page_url(currencies, page))
            .send()
            .await
            .map_err(ApiError::transport)?;
        let status = response.status();
        let body = response.text().await.map_err(ApiError::transport)?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(
                %status,
                elapsed_ms = dt.as_millis(),
                body_preview = %truncate_for_log(&body, 300),
                "Posts request rejected"
            );
            return Err(ApiError::Status(status));
        }

        let parsed: PostsPage = serde_json::from_str(&body)?;
        debug!(
            %status,
            bytes = body.len(),
            posts = parsed.results.len(),
            elapsed_ms = dt.as_millis(),
            "Fetched posts page"
        );
        Ok(parsed)
    }
}
