//! Statistics from a site's status cache
//!
//! Backs `--stats`: everything here works from the cache file alone, without
//! touching the network.

use crate::cache::SiteCache;
use crate::output::emoji_for_status;
use crate::state::{IndexingStatus, PageStatus};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Cache statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Total number of cached URLs
    pub total_urls: usize,

    /// Count of URLs by raw status
    pub by_indexing_status: BTreeMap<IndexingStatus, usize>,

    /// Count of URLs by page status
    pub by_page_status: BTreeMap<PageStatus, usize>,

    pub oldest_check: Option<DateTime<Utc>>,
    pub newest_check: Option<DateTime<Utc>>,
}

impl CacheStatistics {
    /// URLs still waiting to be submitted
    pub fn pending(&self) -> usize {
        self.by_page_status
            .get(&PageStatus::Pending)
            .copied()
            .unwrap_or(0)
    }
}

/// Computes statistics over every entry of a site cache
pub fn load_statistics(cache: &SiteCache) -> CacheStatistics {
    let mut stats = CacheStatistics {
        total_urls: cache.len(),
        ..CacheStatistics::default()
    };

    for entry in cache.values() {
        *stats
            .by_indexing_status
            .entry(entry.indexing_status)
            .or_insert(0) += 1;
        *stats.by_page_status.entry(entry.status).or_insert(0) += 1;

        let checked = entry.last_checked_at;
        stats.oldest_check = Some(stats.oldest_check.map_or(checked, |t| t.min(checked)));
        stats.newest_check = Some(stats.newest_check.map_or(checked, |t| t.max(checked)));
    }

    stats
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(site_url: &str, stats: &CacheStatistics) {
    println!("=== Cache Statistics: {} ===\n", site_url);

    if stats.total_urls == 0 {
        println!("No cached statuses yet, run without --stats first");
        return;
    }

    println!("Overview:");
    println!("  Cached URLs: {}", stats.total_urls);
    if let (Some(oldest), Some(newest)) = (stats.oldest_check, stats.newest_check) {
        println!("  Oldest check: {}", oldest.to_rfc3339());
        println!("  Newest check: {}", newest.to_rfc3339());
    }
    println!();

    println!("Indexing Status:");
    // Sort by count (descending)
    let mut counts: Vec<_> = stats.by_indexing_status.iter().collect();
    counts.sort_by(|a, b| b.1.cmp(a.1));

    for (status, count) in counts {
        let percentage = (*count as f64 / stats.total_urls as f64) * 100.0;
        println!(
            "  {} {}: {} ({:.1}%)",
            emoji_for_status(*status),
            status,
            count,
            percentage
        );
    }
    println!();

    println!("Page Status:");
    for (status, count) in &stats.by_page_status {
        println!("  {}: {}", status, count);
    }
    println!();

    let indexed = stats
        .by_indexing_status
        .get(&IndexingStatus::SubmittedAndIndexed)
        .copied()
        .unwrap_or(0);
    println!(
        "Indexed: {:.1}% ({} / {} pages), {} pending submission",
        (indexed as f64 / stats.total_urls as f64) * 100.0,
        indexed,
        stats.total_urls,
        stats.pending()
    );
}
