//! Staleness rules for cached statuses
//!
//! A cached entry is re-verified when it is stale under the selected policy.
//! URLs with no cache entry at all are always checked by the caller; that is a
//! cold start, not a staleness question.

use crate::cache::CacheEntry;
use crate::state::{IndexableSet, PageStatus};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::fmt;

/// Which cached entries are worth checking again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalenessPolicy {
    /// Recheck failed checks right away, everything else once it ages out
    #[default]
    FailureOrAge,

    /// Recheck only not-yet-indexed URLs, and only once they age out
    ///
    /// A URL confirmed indexed is never checked again.
    IndexableAndAge,
}

impl StalenessPolicy {
    /// Decides whether a cached entry should be re-verified at `now`
    ///
    /// An entry is old when strictly more than `window` has passed since it
    /// was checked; an entry exactly `window` old is still fresh.
    pub fn should_recheck(
        &self,
        entry: &CacheEntry,
        now: DateTime<Utc>,
        window: Duration,
        indexable: &IndexableSet,
    ) -> bool {
        let is_old = now - entry.last_checked_at > window;

        match self {
            Self::FailureOrAge => {
                matches!(entry.status, PageStatus::Failed | PageStatus::Processing) || is_old
            }
            Self::IndexableAndAge => indexable.contains(entry.indexing_status) && is_old,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailureOrAge => "failure-or-age",
            Self::IndexableAndAge => "indexable-and-age",
        }
    }
}

impl fmt::Display for StalenessPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
