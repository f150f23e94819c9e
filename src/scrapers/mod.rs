//! News source scrapers.
//!
//! Each scraper turns a paged news source into a flat, filtered list of
//! [`NewsRecord`](crate::models::NewsRecord)s.
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | CryptoPanic | [`cryptopanic`] | REST API (`/api/v1/posts/`) | Requires API token; paged, newest first |

pub mod cryptopanic;
