//! Per-URL status check
//!
//! The checker produces a `(url, CacheEntry)` pair and never touches the cache
//! map itself; the coordinator merges results once their batch has settled.

use crate::api::IndexingService;
use crate::cache::CacheEntry;
use crate::state::IndexableSet;
use chrono::{DateTime, Utc};

/// Everything a status check needs, shared by all checks of a run
pub struct StatusChecker<'a, S: IndexingService + ?Sized> {
    service: &'a S,
    token: &'a str,
    site_url: &'a str,
    indexable: &'a IndexableSet,
    checked_at: DateTime<Utc>,
}

impl<'a, S: IndexingService + ?Sized> StatusChecker<'a, S> {
    pub fn new(
        service: &'a S,
        token: &'a str,
        site_url: &'a str,
        indexable: &'a IndexableSet,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            service,
            token,
            site_url,
            indexable,
            checked_at,
        }
    }

    /// Inspects one URL and classifies the fresh status
    ///
    /// Always yields an entry: request failures arrive here already mapped to
    /// `RateLimited`, `Forbidden` or `Error`.
    pub async fn check(&self, url: String) -> (String, CacheEntry) {
        let indexing_status = self
            .service
            .page_indexing_status(self.token, self.site_url, &url)
            .await;

        let entry = CacheEntry::from_check(indexing_status, self.indexable, self.checked_at);
        tracing::debug!("{} -> {} ({})", url, entry.indexing_status, entry.status);

        (url, entry)
    }
}
