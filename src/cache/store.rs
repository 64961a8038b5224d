//! File-backed status cache
//!
//! One pretty-printed JSON file per site, rewritten wholesale on every save.

use crate::cache::{CacheError, CacheResult, SiteCache};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

/// Loads and saves per-site status caches under a directory
#[derive(Debug, Clone)]
pub struct StatusCache {
    dir: PathBuf,
}

impl StatusCache {
    /// Creates a cache rooted at `dir`
    ///
    /// The directory is created lazily on the first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the cache file path for a site
    pub fn path_for(&self, site_url: &str) -> PathBuf {
        self.dir.join(cache_file_name(site_url))
    }

    /// Loads the cache for a site
    ///
    /// # Returns
    ///
    /// * `Ok(SiteCache)` - The cached entries, empty if no file exists yet
    /// * `Err(CacheError::Corrupt)` - The file exists but can't be parsed
    pub fn load(&self, site_url: &str) -> CacheResult<SiteCache> {
        let path = self.path_for(site_url);

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache at {}, starting empty", path.display());
                return Ok(SiteCache::new());
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let cache: SiteCache =
            serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded {} cached entries from {}", cache.len(), path.display());
        Ok(cache)
    }

    /// Saves the cache for a site
    ///
    /// The JSON is written to a temp file next to the target and renamed over
    /// it, so a reader sees either the old file or the new one.
    pub fn save(&self, site_url: &str, cache: &SiteCache) -> CacheResult<()> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(site_url);
        let json = serde_json::to_string_pretty(cache)?;

        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|source| CacheError::Io {
            path: tmp_path.clone(),
            source,
        })?;

        #[cfg(target_os = "windows")]
        if path.exists() {
            fs::remove_file(&path).map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        }

        fs::rename(&tmp_path, &path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        debug!("Saved {} cache entries to {}", cache.len(), path.display());
        Ok(())
    }
}

/// Derives a cache file name from a site URL
///
/// `https://example.com/` becomes `https_example.com_.json` and
/// `sc-domain:example.com` becomes `sc-domain_example.com.json`.
pub fn cache_file_name(site_url: &str) -> String {
    let stem = site_url
        .replacen("https://", "https_", 1)
        .replacen("http://", "http_", 1)
        .replace(['/', ':'], "_");
    format!("{}.json", stem)
}
