//! Paginated historical replay.
//!
//! Each page request runs one search per configured term with the current
//! continuation token. The records of every term form the page, and the last
//! term's response supplies the next token. Replay ends after `max_pages`
//! requests, when no next token is returned, once `target_count` records have
//! been delivered, or when a page cannot be fetched within the retry budget.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use flock_core::RawRecord;

use crate::error::FeedError;
use crate::pagination::extract_next_token;
use crate::reader::{FeedMode, FeedReader, ReaderState, ReaderStats};
use crate::retry::retry_with_backoff;
use crate::shutdown::Shutdown;

/// One term's search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub records: Vec<RawRecord>,
    pub next: Option<String>,
}

/// A paginated search endpoint.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// # Errors
    ///
    /// Any transport failure, non-success status, or unreadable body.
    async fn search(&self, term: &str, token: Option<&str>) -> Result<SearchPage, FeedError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    statuses: Vec<Value>,
    #[serde(default)]
    search_metadata: Option<SearchMetadata>,
}

#[derive(Debug, Deserialize)]
struct SearchMetadata {
    next_results: Option<String>,
}

/// Search endpoint: `GET` with `q`, `count`, `include_entities`, and an
/// optional `max_id`; bearer auth.
pub struct HttpSearchSource {
    client: Client,
    url: String,
    bearer_token: String,
    page_size: u32,
}

impl HttpSearchSource {
    /// # Errors
    ///
    /// Returns [`FeedError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        url: &str,
        bearer_token: &str,
        page_size: u32,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            bearer_token: bearer_token.to_string(),
            page_size,
        })
    }
}

#[async_trait]
impl SearchSource for HttpSearchSource {
    async fn search(&self, term: &str, token: Option<&str>) -> Result<SearchPage, FeedError> {
        let count = self.page_size.to_string();
        let mut query = vec![
            ("q", term),
            ("count", count.as_str()),
            ("include_entities", "true"),
        ];
        if let Some(max_id) = token {
            query.push(("max_id", max_id));
        }

        let response = self
            .client
            .get(&self.url)
            .bearer_auth(&self.bearer_token)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::UnexpectedStatus {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }

        let body = response.bytes().await?;
        let parsed: SearchResponse =
            serde_json::from_slice(&body).map_err(|source| FeedError::Deserialize {
                context: format!("search results for \"{term}\""),
                source,
            })?;

        let next = extract_next_token(
            parsed
                .search_metadata
                .as_ref()
                .and_then(|m| m.next_results.as_deref()),
        );
        Ok(SearchPage {
            records: parsed.statuses.into_iter().map(RawRecord::new).collect(),
            next,
        })
    }
}

/// Replay limits and retry policy.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub max_pages: usize,
    pub target_count: Option<usize>,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
    /// Token to request the first page with.
    pub start_token: Option<String>,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            max_pages: 20,
            target_count: None,
            max_retries: 3,
            retry_backoff_ms: 1_000,
            start_token: None,
        }
    }
}

/// Replay-mode [`FeedReader`] over any [`SearchSource`].
pub struct ReplayReader<S> {
    source: S,
    terms: Vec<String>,
    options: ReplayOptions,
    state: ReaderState,
    /// Token that requested the page currently being delivered.
    page_token: Option<String>,
    /// Token for the next page request; `None` after the first page means the
    /// search is exhausted.
    next_token: Option<String>,
    buffer: VecDeque<RawRecord>,
    delivered: usize,
    stats: ReaderStats,
}

impl<S: SearchSource> ReplayReader<S> {
    #[must_use]
    pub fn new(source: S, terms: Vec<String>, options: ReplayOptions) -> Self {
        let next_token = options.start_token.clone();
        Self {
            source,
            terms,
            options,
            state: ReaderState::Idle,
            page_token: None,
            next_token,
            buffer: VecDeque::new(),
            delivered: 0,
            stats: ReaderStats::default(),
        }
    }

    fn exhaust(&mut self, reason: &str) -> Option<RawRecord> {
        if self.state != ReaderState::Exhausted {
            info!(
                reason,
                records = self.stats.records,
                pages = self.stats.pages,
                "replay finished"
            );
        }
        self.state = ReaderState::Exhausted;
        self.buffer.clear();
        None
    }

    fn target_reached(&self) -> bool {
        self.options
            .target_count
            .is_some_and(|target| self.delivered >= target)
    }

    /// Request one page across all terms. `None` if retries ran out or
    /// shutdown fired.
    async fn fetch_page(&mut self, shutdown: &mut Shutdown) -> Option<SearchPage> {
        let token = self.next_token.clone();
        let mut page = SearchPage::default();
        let mut retries = 0u64;

        let mut watcher = shutdown.clone();

        for term in &self.terms {
            if shutdown.is_triggered() {
                self.stats.retries += retries;
                return None;
            }

            let result = tokio::select! {
                result = retry_with_backoff(
                    self.options.max_retries,
                    self.options.retry_backoff_ms,
                    shutdown,
                    || retries += 1,
                    || self.source.search(term, token.as_deref()),
                ) => result,
                () = watcher.triggered() => Err(FeedError::Cancelled),
            };

            match result {
                Ok(term_page) => {
                    debug!(
                        term = %term,
                        records = term_page.records.len(),
                        next = ?term_page.next,
                        "search page received"
                    );
                    page.records.extend(term_page.records);
                    page.next = term_page.next;
                }
                Err(FeedError::Cancelled) => {
                    self.stats.retries += retries;
                    return None;
                }
                Err(e) => {
                    warn!(term = %term, error = %e, "search failed after retries; ending replay");
                    self.stats.retries += retries;
                    return None;
                }
            }
        }

        self.stats.retries += retries;
        Some(page)
    }
}

#[async_trait]
impl<S: SearchSource> FeedReader for ReplayReader<S> {
    fn mode(&self) -> FeedMode {
        FeedMode::Replay
    }

    fn state(&self) -> ReaderState {
        self.state
    }

    async fn next_record(&mut self, shutdown: &mut Shutdown) -> Option<RawRecord> {
        loop {
            if shutdown.is_triggered() {
                return self.exhaust("cancelled");
            }
            if self.state == ReaderState::Exhausted {
                return None;
            }
            if self.target_reached() {
                return self.exhaust("target count reached");
            }

            if let Some(record) = self.buffer.pop_front() {
                self.delivered += 1;
                self.stats.records += 1;
                self.state = ReaderState::PageReady;
                return Some(record);
            }

            let pages = usize::try_from(self.stats.pages).unwrap_or(usize::MAX);
            if pages >= self.options.max_pages {
                return self.exhaust("page limit reached");
            }
            if pages > 0 && self.next_token.is_none() {
                return self.exhaust("no further pages");
            }
            if self.terms.is_empty() {
                return self.exhaust("no search terms");
            }

            self.state = ReaderState::Fetching;
            let Some(page) = self.fetch_page(shutdown).await else {
                return self.exhaust(if shutdown.is_triggered() {
                    "cancelled"
                } else {
                    "retries exhausted"
                });
            };

            self.stats.pages += 1;
            self.page_token = self.next_token.take();
            self.next_token = page.next;
            self.buffer.extend(page.records);
            self.state = ReaderState::PageReady;
        }
    }

    /// The token that re-requests the page currently being delivered;
    /// `None` while on the first page of a fresh replay.
    fn continuation(&self) -> Option<String> {
        self.page_token.clone()
    }

    fn stats(&self) -> ReaderStats {
        self.stats
    }
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;
