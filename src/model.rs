use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Sort order for index search results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SearchOrdering {
    /// Index-default relevance ranking.
    Relevance,
    /// Most recently created packages first (`o=-created`).
    Newest,
}

/// One row of a search results page, parsed from a result snippet.
///
/// Hits are produced by the collector in (page, in-page) order and consumed
/// once by the harvest pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub name: String,
}

impl SearchHit {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Normalized package metadata, one record per metadata document.
///
/// Records are immutable once constructed and are never merged from multiple
/// fetches. Field order here is the column order of the exported table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageRecord {
    pub name: String,
    /// Latest version reported by the index.
    pub version: String,
    pub summary: String,
    pub author: String,
    pub author_email: String,
    /// Canonical homepage URL.
    pub project_url: String,
    /// Version constraint expression, e.g. `>=3.8`. May be empty.
    pub requires_python: String,
    /// Self-reported, unreliable free text.
    pub license: String,
    /// Upload time of the first artifact of the latest release; empty when
    /// the release has no distribution files.
    pub last_release_date: String,
    /// Number of versions in the release history, counting releases with
    /// zero artifacts.
    pub release_count: usize,
    /// Sum of artifact sizes (bytes) for the latest release only.
    pub package_size: u64,
    pub has_wheel: bool,
    pub has_egg: bool,
    /// Derived from the trove classifier list; "Not specified" when absent.
    pub development_status: String,
    /// Derived from the trove classifier list; "Not specified" when absent.
    pub intended_audience: String,
}
