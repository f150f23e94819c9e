//! CryptoPanic news scraper.
//!
//! Walks the posts endpoint page by page, newest first, keeping every post
//! whose publication time falls inside the run's [`FetchWindow`].
//!
//! # Termination
//!
//! Paging stops after the first page that either
//! - contains a post older than the window start, or
//! - has a page number above the page ceiling.
//!
//! The ceiling exists because the endpoint starts repeating itself past a
//! certain depth. With the default of 11, at most 12 pages are requested.

use crate::api::PostsApi;
use crate::models::{FetchWindow, NewsRecord};
use chrono::{DateTime, NaiveDateTime, ParseResult, Utc};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

/// Default highest page number whose posts are trusted.
pub const DEFAULT_PAGE_CEILING: u32 = 11;

/// Exact publication time format used by the API.
const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Parse a `published_at` value such as `2024-01-01T05:00:00Z` as UTC.
///
/// The format is strict: fractional seconds, numeric offsets and bare dates
/// are all rejected.
pub fn parse_published_at(raw: &str) -> ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, PUBLISHED_AT_FORMAT).map(|naive| naive.and_utc())
}

/// Fetch every post for `currencies` published inside `window`.
///
/// # Arguments
///
/// * `api` - Source of posts pages
/// * `currencies` - Currency symbols to filter on, passed through to the API
/// * `window` - Inclusive publication window
/// * `page_ceiling` - Stop after the first page numbered above this
///
/// # Returns
///
/// Matching records in the order the API returned them. If any page request
/// fails the whole result is discarded and an empty vector is returned.
#[instrument(level = "info", skip_all, fields(currencies = currencies.len(), %window, page_ceiling = page_ceiling))]
pub async fn fetch_news<A: PostsApi>(
    api: &A,
    currencies: &[String],
    window: &FetchWindow,
    page_ceiling: u32,
) -> Vec<NewsRecord> {
    let mut posts = Vec::new();
    let mut page = 1u32;

    loop {
        let batch = match api.posts_page(currencies, page).await {
            Ok(batch) => batch,
            Err(e) => {
                error!(page, error = %e, "Failed to fetch news; discarding results");
                return Vec::new();
            }
        };

        let mut finished = page > page_ceiling;
        let mut kept = 0usize;

        for post in batch.results {
            let raw = match &post.published_at {
                Some(Value::String(raw)) => raw.as_str(),
                None | Some(Value::Null) => {
                    error!(page, "Post has no publication date; skipping");
                    continue;
                }
                Some(other) => {
                    error!(page, value = %other, "Publication date is not a string; skipping");
                    continue;
                }
            };
            let published_at = match parse_published_at(raw) {
                Ok(ts) => ts,
                Err(e) => {
                    error!(page, raw, error = %e, "Error parsing publication date; skipping");
                    continue;
                }
            };

            if window.contains(published_at) {
                posts.push(NewsRecord::new(published_at, &post.title_text()));
                kept += 1;
            }

            if window.is_before(published_at) {
                finished = true;
            }
        }

        debug!(page, kept, total = posts.len(), finished, "Processed posts page");

        if finished {
            break;
        }
        page += 1;
    }

    info!(pages = page, records = posts.len(), "Finished paging through posts");
    posts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::models::{ApiPost, PostsPage};
    use chrono::TimeZone;
    use reqwest::StatusCode;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A scripted reply for one page number.
    #[derive(Clone)]
    enum Reply {
        Page(PostsPage),
        Status(StatusCode),
        /// Raw response body, decoded the same way the HTTP client does it.
        Body(&'static str),
    }

    /// Serves pre-baked pages and records every request it sees.
    #[derive(Default)]
    struct ScriptedApi {
        pages: HashMap<u32, Reply>,
        fallback: PostsPage,
        calls: RefCell<Vec<(Vec<String>, u32)>>,
    }

    impl ScriptedApi {
        fn with_page(mut self, page: u32, posts: Vec<ApiPost>) -> Self {
            self.pages.insert(page, Reply::Page(PostsPage { results: posts }));
            self
        }

        fn with_status(mut self, page: u32, status: StatusCode) -> Self {
            self.pages.insert(page, Reply::Status(status));
            self
        }

        fn with_body(mut self, page: u32, body: &'static str) -> Self {
            self.pages.insert(page, Reply::Body(body));
            self
        }

        fn with_fallback(mut self, posts: Vec<ApiPost>) -> Self {
            self.fallback = PostsPage { results: posts };
            self
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.calls.borrow().iter().map(|(_, page)| *page).collect()
        }
    }

    impl PostsApi for ScriptedApi {
        async fn posts_page(&self, currencies: &[String], page: u32) -> Result<PostsPage, ApiError> {
            self.calls.borrow_mut().push((currencies.to_vec(), page));
            match self.pages.get(&page).cloned() {
                Some(Reply::Page(batch)) => Ok(batch),
                Some(Reply::Status(status)) => Err(ApiError::Status(status)),
                Some(Reply::Body(body)) => Ok(serde_json::from_str(body)?),
                None => Ok(self.fallback.clone()),
            }
        }
    }

    fn post(published_at: &str, title: &str) -> ApiPost {
        ApiPost {
            published_at: Some(Value::from(published_at)),
            title: Some(Value::from(title)),
        }
    }

    fn window() -> FetchWindow {
        FetchWindow::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn btc() -> Vec<String> {
        vec!["BTC".to_string()]
    }

    #[test]
    fn test_parse_published_at_accepts_api_format() {
        let ts = parse_published_at("2024-01-01T05:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_published_at_is_strict() {
        assert!(parse_published_at("2024-01-01T05:00:00.123Z").is_err());
        assert!(parse_published_at("2024-01-01T05:00:00+00:00").is_err());
        assert!(parse_published_at("2024-01-01").is_err());
        assert!(parse_published_at("").is_err());
    }

    #[tokio::test]
    async fn test_single_page_stops_at_first_old_post() {
        let api = ScriptedApi::default().with_page(
            1,
            vec![
                post("2024-01-01T05:00:00Z", "First"),
                post("2024-01-01T23:00:00Z", "Second"),
                post("2023-12-31T23:00:00Z", "Too old"),
            ],
        );

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert_eq!(
            records,
            vec![
                NewsRecord {
                    date: "2024-01-01T05:00:00+00:00".to_string(),
                    text: "First\n".to_string(),
                },
                NewsRecord {
                    date: "2024-01-01T23:00:00+00:00".to_string(),
                    text: "Second\n".to_string(),
                },
            ]
        );
        assert_eq!(api.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_non_success_status_returns_empty() {
        let api = ScriptedApi::default().with_status(1, StatusCode::SERVICE_UNAVAILABLE);

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert!(records.is_empty());
        assert_eq!(api.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_failure_mid_run_discards_earlier_pages() {
        let api = ScriptedApi::default()
            .with_page(1, vec![post("2024-01-01T20:00:00Z", "Kept on page 1")])
            .with_page(2, vec![post("2024-01-01T10:00:00Z", "Kept on page 2")])
            .with_status(3, StatusCode::TOO_MANY_REQUESTS);

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert!(records.is_empty());
        assert_eq!(api.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_undecodable_page_discards_earlier_pages() {
        let api = ScriptedApi::default()
            .with_page(1, vec![post("2024-01-01T20:00:00Z", "Kept on page 1")])
            .with_body(2, "<html>502 Bad Gateway</html>");

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert!(records.is_empty());
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_badly_typed_items_do_not_spoil_the_page() {
        let api = ScriptedApi::default().with_body(
            1,
            r#"{"results": [
                {"published_at": "2024-01-01T05:00:00Z", "title": "ok"},
                {"published_at": 1704085200, "title": "numeric date"},
                {"published_at": "2024-01-01T04:00:00Z", "title": 42},
                {"published_at": "2023-12-31T23:00:00Z", "title": "old"}
            ]}"#,
        );

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["ok\n", "42\n"]);
        assert_eq!(api.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn test_non_string_date_does_not_terminate() {
        let api = ScriptedApi::default()
            .with_body(1, r#"{"results": [{"published_at": 1, "title": "epoch"}]}"#)
            .with_page(2, vec![post("2023-12-31T00:00:00Z", "Old")]);

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert!(records.is_empty());
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_unparseable_dates_are_skipped_and_do_not_terminate() {
        let api = ScriptedApi::default()
            .with_page(
                1,
                vec![
                    post("2024-01-01T12:00:00Z", "Good"),
                    post("yesterday", "Bad date"),
                    post("2023-06-01T00:00:00.000Z", "Old but malformed"),
                    ApiPost {
                        published_at: None,
                        title: Some(Value::from("No date")),
                    },
                ],
            )
            .with_page(2, vec![post("2023-12-31T00:00:00Z", "Old")]);

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "Good\n");
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_posts_newer_than_window_are_excluded_without_stopping() {
        let api = ScriptedApi::default()
            .with_page(
                1,
                vec![
                    post("2024-01-03T08:00:00Z", "Future"),
                    post("2024-01-02T00:00:01Z", "Just after end"),
                ],
            )
            .with_page(
                2,
                vec![
                    post("2024-01-02T00:00:00Z", "Exactly end"),
                    post("2024-01-01T00:00:00Z", "Exactly start"),
                    post("2023-12-31T23:59:59Z", "Just before start"),
                ],
            );

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["Exactly end\n", "Exactly start\n"]);
        assert_eq!(api.requested_pages(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_order_is_preserved_across_pages() {
        let api = ScriptedApi::default()
            .with_page(
                1,
                vec![post("2024-01-01T22:00:00Z", "a"), post("2024-01-01T21:00:00Z", "b")],
            )
            .with_page(
                2,
                vec![post("2024-01-01T20:00:00Z", "c"), post("2023-12-30T00:00:00Z", "old")],
            );

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        let texts: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["a\n", "b\n", "c\n"]);
    }

    #[tokio::test]
    async fn test_page_ceiling_bounds_requests() {
        let api = ScriptedApi::default().with_fallback(vec![post("2024-01-01T12:00:00Z", "Repeat")]);

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert_eq!(api.requested_pages(), (1..=12).collect::<Vec<u32>>());
        // Page 12 is still read before the ceiling stops the loop.
        assert_eq!(records.len(), 12);
    }

    #[tokio::test]
    async fn test_empty_pages_terminate_at_ceiling() {
        let api = ScriptedApi::default();

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert!(records.is_empty());
        assert_eq!(api.calls.borrow().len(), 12);
    }

    #[tokio::test]
    async fn test_custom_page_ceiling() {
        let api = ScriptedApi::default().with_fallback(vec![post("2024-01-01T12:00:00Z", "x")]);

        fetch_news(&api, &btc(), &window(), 2).await;

        assert_eq!(api.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_currencies_are_forwarded_and_missing_title_is_blank() {
        let currencies = vec!["BTC".to_string(), "ETH".to_string()];
        let api = ScriptedApi::default().with_page(
            1,
            vec![
                ApiPost {
                    published_at: Some(Value::from("2024-01-01T01:00:00Z")),
                    title: None,
                },
                post("2023-01-01T00:00:00Z", "old"),
            ],
        );

        let records = fetch_news(&api, &currencies, &window(), DEFAULT_PAGE_CEILING).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "\n");
        assert_eq!(api.calls.borrow()[0].0, currencies);
    }

    #[tokio::test]
    async fn test_non_ascii_titles_pass_through() {
        let api = ScriptedApi::default().with_page(
            1,
            vec![
                post("2024-01-01T01:00:00Z", "Биткоин растёт 🚀"),
                post("2023-01-01T00:00:00Z", "old"),
            ],
        );

        let records = fetch_news(&api, &btc(), &window(), DEFAULT_PAGE_CEILING).await;

        assert_eq!(records[0].text, "Биткоин растёт 🚀\n");
    }
}
