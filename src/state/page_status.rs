/// Page status definitions and the raw-status classifier
///
/// `PageStatus` is the pipeline's own judgement of whether a URL needs work,
/// independent of the label Search Console reported for it.
use crate::state::{IndexableSet, IndexingStatus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Actionability of a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// Not indexed yet and eligible for submission
    Pending,

    /// A status check is in flight
    Processing,

    /// Indexed, or in a state resubmitting won't change
    Completed,

    /// The last check didn't produce a usable answer
    Failed,
}

impl PageStatus {
    /// Returns true if this status came out of a finished check
    ///
    /// `Processing` is the only unsettled state.
    pub fn is_settled(&self) -> bool {
        !matches!(self, Self::Processing)
    }

    /// Returns true if the URL should be queued for submission
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Processing,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maps a raw indexing status to a page status
///
/// | Raw status | Page status |
/// |------------|-------------|
/// | `RateLimited` | `Failed` |
/// | in `indexable` | `Pending` |
/// | anything else | `Completed` |
///
/// `RateLimited` is checked first, so it stays `Failed` even when the indexable
/// set includes it. The result is never cached on its own; callers recompute it
/// from the freshest raw status.
pub fn classify(raw: IndexingStatus, indexable: &IndexableSet) -> PageStatus {
    match raw {
        IndexingStatus::RateLimited => PageStatus::Failed,
        status if indexable.contains(status) => PageStatus::Pending,
        IndexingStatus::SubmittedAndIndexed
        | IndexingStatus::DuplicateWithoutUserSelectedCanonical
        | IndexingStatus::CrawledCurrentlyNotIndexed
        | IndexingStatus::DiscoveredCurrentlyNotIndexed
        | IndexingStatus::PageWithRedirect
        | IndexingStatus::URLIsUnknownToGoogle
        | IndexingStatus::Forbidden
        | IndexingStatus::Error => PageStatus::Completed,
    }
}
