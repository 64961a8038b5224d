//! End-to-end pipeline runs against an in-memory Search Console

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use gsc_indexer::api::{ApiError, ApiResult, IndexingService};
use gsc_indexer::cache::CacheError;
use gsc_indexer::pipeline::{Pipeline, RunRequest, SubmissionOutcome};
use gsc_indexer::{
    CacheEntry, Config, IndexableSet, IndexerError, IndexingStatus, PageStatus, SiteCache,
    StatusCache,
};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tempfile::TempDir;

const SITE_URL: &str = "sc-domain:example.com";
const SITEMAP: &str = "https://example.com/sitemap.xml";
const NEWS_SITEMAP: &str = "https://example.com/news.xml";

const DISCOVERED: &str = "https://example.com/new-post";
const INDEXED: &str = "https://example.com/";
const THROTTLED: &str = "https://example.com/busy";

/// Search Console stand-in with scripted answers
///
/// `publish_metadata` reports 200 for URLs that were submitted earlier and 404
/// for the rest, like the real Indexing API.
#[derive(Default)]
struct FakeSearchConsole {
    sites: Vec<String>,
    sitemaps: HashMap<String, Vec<String>>,
    statuses: HashMap<String, IndexingStatus>,
    inspected: Mutex<Vec<String>>,
    submitted: Mutex<HashSet<String>>,
    publish_requests: Mutex<Vec<String>>,
}

impl FakeSearchConsole {
    fn new() -> Self {
        Self {
            sites: vec![SITE_URL.to_string(), "https://other.org/".to_string()],
            ..Self::default()
        }
    }

    fn with_sitemap(mut self, sitemap: &str, urls: &[&str]) -> Self {
        self.sitemaps.insert(
            sitemap.to_string(),
            urls.iter().map(|u| u.to_string()).collect(),
        );
        self
    }

    fn with_status(mut self, url: &str, status: IndexingStatus) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    /// The three-URL site: one discovered, one indexed, one rate limited
    fn three_page_site() -> Self {
        Self::new()
            .with_sitemap(SITEMAP, &[DISCOVERED, INDEXED, THROTTLED])
            .with_status(DISCOVERED, IndexingStatus::DiscoveredCurrentlyNotIndexed)
            .with_status(INDEXED, IndexingStatus::SubmittedAndIndexed)
            .with_status(THROTTLED, IndexingStatus::RateLimited)
    }

    fn inspected(&self) -> Vec<String> {
        self.inspected.lock().unwrap().clone()
    }

    fn publish_requests(&self) -> Vec<String> {
        self.publish_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl IndexingService for FakeSearchConsole {
    async fn list_sites(&self, _token: &str) -> ApiResult<Vec<String>> {
        Ok(self.sites.clone())
    }

    async fn list_sitemaps(&self, _token: &str, _site_url: &str) -> ApiResult<Vec<String>> {
        let mut sitemaps: Vec<String> = self.sitemaps.keys().cloned().collect();
        sitemaps.sort();
        Ok(sitemaps)
    }

    async fn sitemap_urls(&self, sitemap_url: &str) -> ApiResult<Vec<String>> {
        self.sitemaps
            .get(sitemap_url)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                url: sitemap_url.to_string(),
                status: 404,
                body: String::new(),
            })
    }

    async fn page_indexing_status(
        &self,
        _token: &str,
        _site_url: &str,
        url: &str,
    ) -> IndexingStatus {
        self.inspected.lock().unwrap().push(url.to_string());
        self.statuses
            .get(url)
            .copied()
            .unwrap_or(IndexingStatus::URLIsUnknownToGoogle)
    }

    async fn publish_metadata(&self, _token: &str, url: &str) -> ApiResult<u16> {
        if self.submitted.lock().unwrap().contains(url) {
            Ok(200)
        } else {
            Ok(404)
        }
    }

    async fn request_indexing(&self, _token: &str, url: &str) -> ApiResult<()> {
        self.publish_requests.lock().unwrap().push(url.to_string());
        self.submitted.lock().unwrap().insert(url.to_string());
        Ok(())
    }
}

fn pipeline(service: FakeSearchConsole, dir: &TempDir) -> Pipeline<FakeSearchConsole> {
    Pipeline::with_cache(service, StatusCache::new(dir.path()), Config::default())
}

fn request() -> RunRequest {
    RunRequest {
        site: "example.com".to_string(),
        token: "test-token".to_string(),
        ..RunRequest::default()
    }
}

fn run_time() -> DateTime<Utc> {
    "2024-06-01T09:30:00Z".parse().unwrap()
}

#[tokio::test]
async fn test_three_page_site() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);
    let now = run_time();

    let report = pipeline.run_at(&request(), now).await.unwrap();

    assert_eq!(report.site_url, SITE_URL);
    assert_eq!(report.total_urls, 3);
    assert_eq!(report.checked, 3);
    assert_eq!(report.from_cache, 0);
    assert_eq!(report.page_counts.get(&PageStatus::Pending), Some(&1));
    assert_eq!(report.page_counts.get(&PageStatus::Completed), Some(&1));
    assert_eq!(report.page_counts.get(&PageStatus::Failed), Some(&1));
    assert_eq!(report.queued, vec![DISCOVERED]);

    assert_eq!(report.submissions.len(), 1);
    assert_eq!(report.submissions[0].url, DISCOVERED);
    assert_eq!(
        report.submissions[0].outcome,
        SubmissionOutcome::NewlySubmitted
    );
    assert_eq!(pipeline.service().publish_requests(), vec![DISCOVERED]);

    let cache = pipeline.cache().load(SITE_URL).unwrap();
    assert_eq!(cache.len(), 3);
    assert!(cache.values().all(|entry| entry.last_checked_at == now));
    assert_eq!(cache[THROTTLED].status, PageStatus::Failed);
    assert_eq!(cache[INDEXED].status, PageStatus::Completed);
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);

    pipeline.run_at(&request(), run_time()).await.unwrap();
    let report = pipeline
        .run_at(&request(), run_time() + Duration::hours(1))
        .await
        .unwrap();

    // Only the failed entry is re-verified inside the freshness window
    assert_eq!(report.checked, 1);
    assert_eq!(report.from_cache, 2);
    assert_eq!(
        pipeline
            .service()
            .inspected()
            .iter()
            .filter(|url| *url == THROTTLED)
            .count(),
        2
    );

    assert_eq!(report.queued, vec![DISCOVERED]);
    assert_eq!(
        report.submissions[0].outcome,
        SubmissionOutcome::AlreadyRequested
    );
    assert_eq!(pipeline.service().publish_requests(), vec![DISCOVERED]);
}

#[tokio::test]
async fn test_earlier_clock_never_rewinds_last_checked() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);

    pipeline.run_at(&request(), run_time()).await.unwrap();
    let report = pipeline
        .run_at(&request(), run_time() - Duration::hours(1))
        .await
        .unwrap();

    // The failed entry is checked again, but keeps the later timestamp
    assert_eq!(report.checked, 1);
    let cache = pipeline.cache().load(SITE_URL).unwrap();
    assert_eq!(cache[THROTTLED].status, PageStatus::Failed);
    assert!(cache.values().all(|entry| entry.last_checked_at == run_time()));
}

#[tokio::test]
async fn test_dry_run_submits_nothing() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);
    let request = RunRequest {
        dry_run: true,
        ..request()
    };

    let report = pipeline.run_at(&request, run_time()).await.unwrap();

    assert!(report.dry_run);
    assert_eq!(report.queued, vec![DISCOVERED]);
    assert!(report.submissions.is_empty());
    assert!(pipeline.service().publish_requests().is_empty());
    // Statuses are still cached
    assert_eq!(pipeline.cache().load(SITE_URL).unwrap().len(), 3);
}

#[tokio::test]
async fn test_urls_are_deduplicated_across_sitemaps() {
    let dir = TempDir::new().unwrap();
    let service = FakeSearchConsole::three_page_site()
        .with_sitemap(NEWS_SITEMAP, &[DISCOVERED, "https://example.com/extra"]);
    let pipeline = pipeline(service, &dir);

    let report = pipeline.run_at(&request(), run_time()).await.unwrap();

    assert_eq!(report.total_urls, 4);
    let mut inspected = pipeline.service().inspected();
    inspected.sort();
    inspected.dedup();
    assert_eq!(inspected.len(), 4);
    assert_eq!(pipeline.service().inspected().len(), 4);
}

#[tokio::test]
async fn test_custom_urls_bypass_sitemaps() {
    let dir = TempDir::new().unwrap();
    let service = FakeSearchConsole::new()
        .with_status(DISCOVERED, IndexingStatus::CrawledCurrentlyNotIndexed);
    let pipeline = pipeline(service, &dir);
    let request = RunRequest {
        urls: Some(vec![
            "/new-post".to_string(),
            "https://other.org/elsewhere".to_string(),
        ]),
        ..request()
    };

    let report = pipeline.run_at(&request, run_time()).await.unwrap();

    assert_eq!(report.total_urls, 1);
    assert_eq!(pipeline.service().inspected(), vec![DISCOVERED]);
    assert_eq!(report.queued, vec![DISCOVERED]);
}

#[tokio::test]
async fn test_cached_entries_respect_freshness_window() {
    let dir = TempDir::new().unwrap();
    let now = run_time();
    let indexable = IndexableSet::default();

    // Seed the cache: one entry exactly at the window edge, one just past it
    let mut seeded = SiteCache::new();
    seeded.insert(
        INDEXED.to_string(),
        CacheEntry::from_check(
            IndexingStatus::SubmittedAndIndexed,
            &indexable,
            now - Duration::days(14),
        ),
    );
    seeded.insert(
        DISCOVERED.to_string(),
        CacheEntry::from_check(
            IndexingStatus::SubmittedAndIndexed,
            &indexable,
            now - Duration::days(14) - Duration::seconds(1),
        ),
    );
    StatusCache::new(dir.path()).save(SITE_URL, &seeded).unwrap();

    let service = FakeSearchConsole::new()
        .with_sitemap(SITEMAP, &[DISCOVERED, INDEXED])
        .with_status(DISCOVERED, IndexingStatus::DiscoveredCurrentlyNotIndexed)
        .with_status(INDEXED, IndexingStatus::SubmittedAndIndexed);
    let pipeline = pipeline(service, &dir);

    let report = pipeline.run_at(&request(), now).await.unwrap();

    assert_eq!(pipeline.service().inspected(), vec![DISCOVERED]);
    assert_eq!(report.checked, 1);
    assert_eq!(report.queued, vec![DISCOVERED]);

    let cache = pipeline.cache().load(SITE_URL).unwrap();
    assert_eq!(cache[INDEXED].last_checked_at, now - Duration::days(14));
    assert_eq!(cache[DISCOVERED].last_checked_at, now);
}

#[tokio::test]
async fn test_small_batches_check_every_url() {
    let dir = TempDir::new().unwrap();
    let urls: Vec<String> = (0..7)
        .map(|i| format!("https://example.com/page-{}", i))
        .collect();
    let url_refs: Vec<&str> = urls.iter().map(String::as_str).collect();
    let service = FakeSearchConsole::new().with_sitemap(SITEMAP, &url_refs);

    let mut config = Config::default();
    config.policy.batch_size = 3;
    let pipeline = Pipeline::with_cache(service, StatusCache::new(dir.path()), config);

    let report = pipeline.run_at(&request(), run_time()).await.unwrap();

    assert_eq!(report.checked, 7);
    assert_eq!(
        report
            .indexing_counts
            .get(&IndexingStatus::URLIsUnknownToGoogle),
        Some(&7)
    );
    assert_eq!(pipeline.service().publish_requests().len(), 7);
}

#[tokio::test]
async fn test_missing_site_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);
    let request = RunRequest {
        site: "  ".to_string(),
        ..request()
    };

    let result = pipeline.run_at(&request, run_time()).await;
    assert!(matches!(result, Err(IndexerError::MissingSite)));
}

#[tokio::test]
async fn test_inaccessible_site_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);
    let request = RunRequest {
        site: "not-mine.com".to_string(),
        ..request()
    };

    let result = pipeline.run_at(&request, run_time()).await;

    assert!(matches!(
        result,
        Err(IndexerError::SiteAccessDenied { ref site_url }) if site_url == "sc-domain:not-mine.com"
    ));
    assert!(pipeline.service().inspected().is_empty());
}

#[tokio::test]
async fn test_no_sitemaps_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::new(), &dir);

    let result = pipeline.run_at(&request(), run_time()).await;

    assert!(matches!(result, Err(IndexerError::NoSitemaps { .. })));
    assert!(!pipeline.cache().path_for(SITE_URL).exists());
}

#[tokio::test]
async fn test_empty_sitemaps_are_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::new().with_sitemap(SITEMAP, &[]), &dir);

    let result = pipeline.run_at(&request(), run_time()).await;

    assert!(matches!(result, Err(IndexerError::NoUrls { .. })));
    assert!(!pipeline.cache().path_for(SITE_URL).exists());
}

#[tokio::test]
async fn test_corrupt_cache_is_fatal() {
    let dir = TempDir::new().unwrap();
    let pipeline = pipeline(FakeSearchConsole::three_page_site(), &dir);
    let path = pipeline.cache().path_for(SITE_URL);
    std::fs::write(&path, "{ not json").unwrap();

    let result = pipeline.run_at(&request(), run_time()).await;

    assert!(matches!(
        result,
        Err(IndexerError::Cache(CacheError::Corrupt { .. }))
    ));
    assert!(pipeline.service().inspected().is_empty());
    // The broken file is left for the operator
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}
