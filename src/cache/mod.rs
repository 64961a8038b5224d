//! Cache module for persisting URL statuses between runs
//!
//! This module handles:
//! - The per-URL cache entry and the per-site cache map
//! - Loading and saving one JSON file per site
//! - Deciding when a cached status is stale enough to re-verify

mod staleness;
mod store;

pub use staleness::StalenessPolicy;
pub use store::{cache_file_name, StatusCache};

use crate::state::{classify, IndexableSet, IndexingStatus, PageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Last known status of a single URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub indexing_status: IndexingStatus,
    pub status: PageStatus,
    pub last_checked_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Builds an entry from a fresh raw status, classifying it on the way
    pub fn from_check(
        indexing_status: IndexingStatus,
        indexable: &IndexableSet,
        checked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            indexing_status,
            status: classify(indexing_status, indexable),
            last_checked_at: checked_at,
        }
    }
}

/// All cached entries for one site, keyed by URL
pub type SiteCache = BTreeMap<String, CacheEntry>;

/// Errors that can occur while reading or writing the status cache
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to access cache file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache file {path} is corrupt, fix or delete it and re-run: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to serialize cache: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
