//! Search result collector.
//!
//! Pages through the index's search results for a keyword, strictly in page
//! order, and returns the flat sequence of [`SearchHit`]s. Collection stops
//! at the first page that is genuinely empty; a page blocked by an anti-bot
//! challenge is a separate observable state and is retried with backoff
//! rather than being mistaken for the end of the results.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::client::{FetchError, SearchSource};
use crate::model::{SearchHit, SearchOrdering};

/// Marker class on each result snippet in the rendered search page.
const SNIPPET_MARKER: &str = "package-snippet";

static NAME_RE: OnceLock<Regex> = OnceLock::new();

fn name_regex() -> &'static Regex {
    NAME_RE.get_or_init(|| {
        Regex::new(r#"<span[^>]*class="[^"]*package-snippet__name[^"]*"[^>]*>([^<]+)</span>"#)
            .expect("snippet name regex")
    })
}

/// What one fetched search page turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page carried result snippets, in document order.
    Results(Vec<SearchHit>),
    /// The page rendered but contained no result snippets.
    Empty,
    /// The page is an anti-bot challenge interstitial, not results.
    Blocked,
}

/// Classifies one rendered search page body.
pub fn classify_page(body: &str) -> PageOutcome {
    let hits: Vec<SearchHit> = name_regex()
        .captures_iter(body)
        .map(|c| SearchHit::new(c[1].trim()))
        .collect();
    if !hits.is_empty() {
        return PageOutcome::Results(hits);
    }
    if is_challenge(body) {
        return PageOutcome::Blocked;
    }
    // A snippet anchor without a parsable name span still means the page had
    // results we failed to read; treat it as blocked rather than done.
    if body.contains(SNIPPET_MARKER) {
        return PageOutcome::Blocked;
    }
    PageOutcome::Empty
}

fn is_challenge(body: &str) -> bool {
    body.contains("Client Challenge") || body.to_ascii_lowercase().contains("captcha")
}

#[derive(Error, Debug)]
pub enum CollectError {
    /// The challenge interstitial never cleared within the retry budget.
    #[error("search page {page} still blocked by a challenge after {attempts} attempts")]
    Blocked { page: u32, attempts: u32 },

    /// A page fetch kept failing within the retry budget.
    #[error("search page {page} failed after {attempts} attempts: {source}")]
    PageFailed {
        page: u32,
        attempts: u32,
        #[source]
        source: FetchError,
    },
}

/// Drives sequential pagination over a [`SearchSource`].
///
/// Each page fetch gets a bounded number of attempts with exponential
/// backoff between them. Pagination itself is never retried out of order.
pub struct Collector<S: SearchSource> {
    source: S,
    max_attempts: u32,
    initial_backoff: Duration,
}

impl<S: SearchSource> Collector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_attempts: 4,
            initial_backoff: Duration::from_secs(2),
        }
    }

    /// Sets the per-page attempt budget (minimum 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Sets the backoff before the second attempt; it doubles per retry.
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// Collects all search hits for `keyword`, flattened in (page, in-page)
    /// order. Terminates at the first genuinely empty page.
    pub async fn collect(
        &self,
        keyword: &str,
        ordering: SearchOrdering,
    ) -> Result<Vec<SearchHit>, CollectError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            match self.collect_page(keyword, ordering, page).await? {
                Some(hits) => {
                    info!(page, results = hits.len(), "collected search page");
                    all.extend(hits);
                    page += 1;
                }
                None => {
                    info!(page, total = all.len(), "search exhausted");
                    return Ok(all);
                }
            }
        }
    }

    /// Fetches and classifies one page, retrying transport failures and
    /// challenge pages. `Ok(None)` means the page was genuinely empty.
    async fn collect_page(
        &self,
        keyword: &str,
        ordering: SearchOrdering,
        page: u32,
    ) -> Result<Option<Vec<SearchHit>>, CollectError> {
        let mut backoff = self.initial_backoff;
        for attempt in 1..=self.max_attempts {
            let last = attempt == self.max_attempts;
            match self.source.fetch_page(keyword, ordering, page).await {
                Ok(body) => match classify_page(&body) {
                    PageOutcome::Results(hits) => return Ok(Some(hits)),
                    PageOutcome::Empty => return Ok(None),
                    PageOutcome::Blocked => {
                        if last {
                            return Err(CollectError::Blocked {
                                page,
                                attempts: self.max_attempts,
                            });
                        }
                        warn!(page, attempt, "challenge page, backing off");
                    }
                },
                Err(e) => {
                    if last {
                        return Err(CollectError::PageFailed {
                            page,
                            attempts: self.max_attempts,
                            source: e,
                        });
                    }
                    warn!(page, attempt, error = %e, "page fetch failed, backing off");
                }
            }
            tokio::time::sleep(backoff).await;
            backoff *= 2;
        }
        unreachable!("attempt loop always returns")
    }
}
