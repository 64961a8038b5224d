/// Raw indexing status labels reported by the URL Inspection API
///
/// This module defines the closed set of coverage states the pipeline understands,
/// plus the set of states that make a URL worth (re)submitting.
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Coverage state of a URL as reported by Search Console
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexingStatus {
    // ===== Reported by Search Console =====
    #[serde(rename = "Submitted and indexed")]
    SubmittedAndIndexed,

    #[serde(rename = "Duplicate without user-selected canonical")]
    DuplicateWithoutUserSelectedCanonical,

    #[serde(rename = "Crawled - currently not indexed")]
    CrawledCurrentlyNotIndexed,

    #[serde(rename = "Discovered - currently not indexed")]
    DiscoveredCurrentlyNotIndexed,

    #[serde(rename = "Page with redirect")]
    PageWithRedirect,

    #[serde(rename = "URL is unknown to Google")]
    URLIsUnknownToGoogle,

    // ===== Synthesized from the HTTP outcome of the check =====
    /// The inspection request itself returned HTTP 429
    RateLimited,

    /// The inspection request returned HTTP 403
    Forbidden,

    /// Any other failed inspection, or a coverage label we don't know
    ///
    /// Exclusion labels such as "Excluded by 'noindex' tag" or "Blocked by
    /// robots.txt" land here too. `Error` is indexable by default, so those
    /// URLs are queued again on every run and the pipeline warns when it
    /// selects them.
    Error,
}

impl IndexingStatus {
    /// Returns the label used by Search Console and in the cache file
    pub fn label(&self) -> &'static str {
        match self {
            Self::SubmittedAndIndexed => "Submitted and indexed",
            Self::DuplicateWithoutUserSelectedCanonical => {
                "Duplicate without user-selected canonical"
            }
            Self::CrawledCurrentlyNotIndexed => "Crawled - currently not indexed",
            Self::DiscoveredCurrentlyNotIndexed => "Discovered - currently not indexed",
            Self::PageWithRedirect => "Page with redirect",
            Self::URLIsUnknownToGoogle => "URL is unknown to Google",
            Self::RateLimited => "RateLimited",
            Self::Forbidden => "Forbidden",
            Self::Error => "Error",
        }
    }

    /// Parses a coverage label
    ///
    /// Returns None if the label isn't one of the nine known states.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all_statuses()
            .into_iter()
            .find(|status| status.label() == label)
    }

    /// Returns all possible indexing statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::SubmittedAndIndexed,
            Self::DuplicateWithoutUserSelectedCanonical,
            Self::CrawledCurrentlyNotIndexed,
            Self::DiscoveredCurrentlyNotIndexed,
            Self::PageWithRedirect,
            Self::URLIsUnknownToGoogle,
            Self::RateLimited,
            Self::Forbidden,
            Self::Error,
        ]
    }
}

impl fmt::Display for IndexingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Statuses that make a URL eligible for (re)submission
///
/// Membership is always an explicit list, never inferred from the labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexableSet {
    statuses: BTreeSet<IndexingStatus>,
}

impl IndexableSet {
    /// Builds a set from an explicit list of statuses
    pub fn new(statuses: impl IntoIterator<Item = IndexingStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
        }
    }

    /// The default set plus `RateLimited`
    pub fn with_rate_limited() -> Self {
        let mut set = Self::default();
        set.statuses.insert(IndexingStatus::RateLimited);
        set
    }

    pub fn contains(&self, status: IndexingStatus) -> bool {
        self.statuses.contains(&status)
    }

    pub fn iter(&self) -> impl Iterator<Item = IndexingStatus> + '_ {
        self.statuses.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }
}

impl Default for IndexableSet {
    fn default() -> Self {
        Self::new([
            IndexingStatus::DiscoveredCurrentlyNotIndexed,
            IndexingStatus::CrawledCurrentlyNotIndexed,
            IndexingStatus::URLIsUnknownToGoogle,
            IndexingStatus::Forbidden,
            IndexingStatus::Error,
        ])
    }
}
