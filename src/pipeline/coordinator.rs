//! Pipeline coordinator - one end-to-end run for one site
//!
//! A run moves through its stages strictly in order:
//! `ResolveSite -> EnumerateUrls -> CheckStatuses -> PersistCache ->
//! SelectEligible -> Submit -> Done`.
//!
//! Failures before `CheckStatuses` are fatal and leave the cache file as it
//! was. After that point, per-URL failures are only counted in the report.

use crate::api::{check_custom_urls, check_site_url, convert_to_site_url};
use crate::api::{AuthProvider, Credentials, IndexingService};
use crate::cache::{CacheEntry, SiteCache, StatusCache};
use crate::config::Config;
use crate::pipeline::batch::run_batches;
use crate::pipeline::checker::StatusChecker;
use crate::pipeline::submission::{
    QuotaPolicy, RetryPolicy, SubmissionAttempt, SubmissionController, SubmissionOutcome,
};
use crate::state::{IndexingStatus, PageStatus};
use crate::IndexerError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Stages of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunStage {
    ResolveSite,
    EnumerateUrls,
    CheckStatuses,
    PersistCache,
    SelectEligible,
    Submit,
    Done,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ResolveSite => "resolve site",
            Self::EnumerateUrls => "enumerate URLs",
            Self::CheckStatuses => "check statuses",
            Self::PersistCache => "persist cache",
            Self::SelectEligible => "select eligible",
            Self::Submit => "submit",
            Self::Done => "done",
        };
        write!(f, "{}", name)
    }
}

/// Inputs for one run
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    /// A bare domain, `sc-domain:` property or URL-prefix property
    pub site: String,
    /// Bearer token for every API call of the run
    pub token: String,
    /// Explicit URL list; sitemaps are used when `None`
    pub urls: Option<Vec<String>>,
    pub rpm_retry: bool,
    /// Check and persist statuses but submit nothing
    pub dry_run: bool,
}

/// Summary of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Site URL as Search Console lists it
    pub site_url: String,
    /// Run timestamp, written to every entry checked by this run
    pub started_at: DateTime<Utc>,
    /// Enumerated URLs after deduplication
    pub total_urls: usize,
    /// URLs whose status was fetched in this run
    pub checked: usize,
    /// URLs answered from a fresh cache entry
    pub from_cache: usize,
    pub indexing_counts: BTreeMap<IndexingStatus, usize>,
    pub page_counts: BTreeMap<PageStatus, usize>,
    /// URLs selected for submission, in enumeration order
    pub queued: Vec<String>,
    pub submissions: Vec<SubmissionAttempt>,
    pub dry_run: bool,
}

impl RunReport {
    /// Number of URLs with the given outcome
    pub fn outcome_count(&self, outcome: fn(&SubmissionOutcome) -> bool) -> usize {
        self.submissions
            .iter()
            .filter(|attempt| outcome(&attempt.outcome))
            .count()
    }

    pub fn newly_submitted(&self) -> usize {
        self.outcome_count(|o| matches!(o, SubmissionOutcome::NewlySubmitted))
    }

    pub fn already_requested(&self) -> usize {
        self.outcome_count(|o| matches!(o, SubmissionOutcome::AlreadyRequested))
    }

    pub fn failed_submissions(&self) -> usize {
        self.outcome_count(SubmissionOutcome::is_failure)
    }
}

/// Obtains the run's bearer token
///
/// # Returns
///
/// * `Ok(String)` - A non-empty token
/// * `Err(IndexerError::MissingCredentials)` - The provider produced nothing
pub async fn obtain_token(
    provider: &dyn AuthProvider,
    credentials: &Credentials,
) -> Result<String, IndexerError> {
    provider
        .access_token(credentials)
        .await?
        .ok_or(IndexerError::MissingCredentials)
}

/// Drives a full run against an `IndexingService`
pub struct Pipeline<S: IndexingService> {
    service: S,
    cache: StatusCache,
    config: Config,
}

impl<S: IndexingService> Pipeline<S> {
    /// Creates a pipeline with the cache directory from `config`
    pub fn new(service: S, config: Config) -> Self {
        let cache = StatusCache::new(config.cache.directory.clone());
        Self::with_cache(service, cache, config)
    }

    pub fn with_cache(service: S, cache: StatusCache, config: Config) -> Self {
        Self {
            service,
            cache,
            config,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn cache(&self) -> &StatusCache {
        &self.cache
    }

    /// Runs the pipeline now
    pub async fn run(&self, request: &RunRequest) -> Result<RunReport, IndexerError> {
        self.run_at(request, Utc::now()).await
    }

    /// Runs the pipeline with `now` as the run timestamp
    ///
    /// `now` drives both staleness decisions and the `lastCheckedAt` written
    /// for every check of this run, unless the cache already holds a later
    /// timestamp for that URL.
    pub async fn run_at(
        &self,
        request: &RunRequest,
        now: DateTime<Utc>,
    ) -> Result<RunReport, IndexerError> {
        if request.site.trim().is_empty() {
            return Err(IndexerError::MissingSite);
        }
        let token = request.token.as_str();

        enter(RunStage::ResolveSite);
        let site_url = self.resolve_site(token, &request.site).await?;

        enter(RunStage::EnumerateUrls);
        let urls = self
            .enumerate_urls(token, &site_url, request.urls.as_deref())
            .await?;
        tracing::info!("{} URLs to consider for {}", urls.len(), site_url);

        let mut cache = self.cache.load(&site_url)?;

        enter(RunStage::CheckStatuses);
        let to_check = self.select_for_check(&urls, &cache, now);
        let checked = to_check.len();
        tracing::info!(
            "Checking {} URLs, {} answered from cache",
            checked,
            urls.len() - checked
        );
        self.check_statuses(token, &site_url, to_check, &mut cache, now)
            .await;

        enter(RunStage::PersistCache);
        self.cache.save(&site_url, &cache)?;

        enter(RunStage::SelectEligible);
        let queued = select_eligible(&urls, &cache);
        tracing::info!("{} URLs eligible for submission", queued.len());

        let submissions = if request.dry_run {
            tracing::info!("Dry run, skipping submission");
            Vec::new()
        } else {
            enter(RunStage::Submit);
            let controller = SubmissionController::new(
                &self.service,
                token,
                RetryPolicy::from(&self.config.quota),
            );
            controller
                .submit_all(
                    &queued,
                    &QuotaPolicy {
                        rpm_retry: request.rpm_retry,
                    },
                )
                .await
        };

        enter(RunStage::Done);
        let (indexing_counts, page_counts) = count_statuses(&urls, &cache);

        Ok(RunReport {
            site_url,
            started_at: now,
            total_urls: urls.len(),
            checked,
            from_cache: urls.len() - checked,
            indexing_counts,
            page_counts,
            queued,
            submissions,
            dry_run: request.dry_run,
        })
    }

    async fn resolve_site(&self, token: &str, site: &str) -> Result<String, IndexerError> {
        let candidate = convert_to_site_url(site);
        let site_url = check_site_url(&self.service, token, &candidate).await?;
        if site_url != candidate {
            tracing::info!("{} is registered as {}", candidate, site_url);
        }
        Ok(site_url)
    }

    /// Collects the URLs of a run, deduplicated in first-seen order
    async fn enumerate_urls(
        &self,
        token: &str,
        site_url: &str,
        custom: Option<&[String]>,
    ) -> Result<Vec<String>, IndexerError> {
        let found = match custom {
            Some(custom) => check_custom_urls(site_url, custom),
            None => {
                let sitemaps = self.service.list_sitemaps(token, site_url).await?;
                if sitemaps.is_empty() {
                    return Err(IndexerError::NoSitemaps {
                        site_url: site_url.to_string(),
                    });
                }

                let mut found = Vec::new();
                for sitemap in &sitemaps {
                    match self.service.sitemap_urls(sitemap).await {
                        Ok(urls) => {
                            tracing::debug!("{} URLs in {}", urls.len(), sitemap);
                            found.extend(urls);
                        }
                        Err(e) => tracing::warn!("Skipping sitemap {}: {}", sitemap, e),
                    }
                }
                found
            }
        };

        let urls = dedupe(found);
        if urls.is_empty() {
            return Err(IndexerError::NoUrls {
                site_url: site_url.to_string(),
            });
        }
        Ok(urls)
    }

    /// URLs with no cache entry, or whose entry the staleness policy rejects
    fn select_for_check(&self, urls: &[String], cache: &SiteCache, now: DateTime<Utc>) -> Vec<String> {
        let policy = &self.config.policy;
        let window = policy.freshness_window();
        let indexable = policy.indexable_set();

        urls.iter()
            .filter(|url| match cache.get(*url) {
                None => true,
                Some(entry) => policy
                    .staleness
                    .should_recheck(entry, now, window, &indexable),
            })
            .cloned()
            .collect()
    }

    async fn check_statuses(
        &self,
        token: &str,
        site_url: &str,
        urls: Vec<String>,
        cache: &mut SiteCache,
        now: DateTime<Utc>,
    ) {
        let indexable = self.config.policy.indexable_set();
        let checker = StatusChecker::new(&self.service, token, site_url, &indexable, now);
        let checker = &checker;

        run_batches(
            urls,
            self.config.policy.batch_size,
            move |url, _| checker.check(url),
            |progress, results: &[(String, CacheEntry)]| {
                for (url, entry) in results {
                    merge_check(cache, url, entry.clone());
                }
                tracing::info!(
                    "Batch {}/{} checked ({} URLs)",
                    progress.batch_index + 1,
                    progress.batch_count,
                    results.len()
                );
                if progress.is_last() {
                    tracing::info!("All {} batches checked", progress.batch_count);
                }
            },
        )
        .await;
    }
}

fn enter(stage: RunStage) {
    tracing::info!("Stage: {}", stage);
}

fn dedupe(urls: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.into_iter()
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

/// Stores a fresh check, keeping `lastCheckedAt` from moving backwards
///
/// The new status always wins. Only the timestamp is clamped, for runs whose
/// clock is behind the one that wrote the cache.
fn merge_check(cache: &mut SiteCache, url: &str, mut entry: CacheEntry) {
    if let Some(previous) = cache.get(url) {
        entry.last_checked_at = entry.last_checked_at.max(previous.last_checked_at);
    }
    cache.insert(url.to_string(), entry);
}

/// Enumerated URLs whose cached status is `Pending`, in enumeration order
fn select_eligible(urls: &[String], cache: &SiteCache) -> Vec<String> {
    urls.iter()
        .filter(|url| match cache.get(*url) {
            Some(entry) if entry.status.is_eligible() => {
                if entry.indexing_status == IndexingStatus::Error {
                    tracing::warn!(
                        "Queuing {} although its last check failed or reported an \
                         unrecognised coverage state",
                        url
                    );
                }
                true
            }
            _ => false,
        })
        .cloned()
        .collect()
}

/// Counts cached statuses of the enumerated URLs
fn count_statuses(
    urls: &[String],
    cache: &SiteCache,
) -> (BTreeMap<IndexingStatus, usize>, BTreeMap<PageStatus, usize>) {
    let mut indexing_counts = BTreeMap::new();
    let mut page_counts = BTreeMap::new();

    for entry in urls.iter().filter_map(|url| cache.get(url)) {
        *indexing_counts.entry(entry.indexing_status).or_insert(0) += 1;
        *page_counts.entry(entry.status).or_insert(0) += 1;
    }

    (indexing_counts, page_counts)
}
