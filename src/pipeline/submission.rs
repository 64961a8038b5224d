//! Indexing submissions
//!
//! # Request Flow
//!
//! 1. Query the Indexing API notification metadata for the URL
//! 2. Act on the status code:
//!
//! | Metadata status | Action |
//! |-----------------|--------|
//! | 404 | Request indexing → `NewlySubmitted` |
//! | < 400 | Nothing to do → `AlreadyRequested` |
//! | 429, retry enabled | Wait, query again (bounded) |
//! | 429, retry disabled or budget spent | `PermanentFailure` |
//! | anything else | `PermanentFailure` |
//!
//! URLs are submitted one at a time so quota use stays attributable to a URL.

use crate::api::IndexingService;
use crate::config::QuotaConfig;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Caller's choice for the current run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuotaPolicy {
    /// Wait and retry when the metadata query is rate limited
    pub rpm_retry: bool,
}

/// How rate-limited metadata queries are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first rate-limited reply
    pub retries_on_rate_limit: u32,
    pub backoff: Duration,
}

impl From<&QuotaConfig> for RetryPolicy {
    fn from(config: &QuotaConfig) -> Self {
        Self {
            retries_on_rate_limit: config.retries_on_rate_limit,
            backoff: config.backoff(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&QuotaConfig::default())
    }
}

/// Result of submitting one URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    /// A submission already existed; no request was sent
    AlreadyRequested,
    /// Indexing was requested in this run
    NewlySubmitted,
    /// Gave up on this URL for this run
    PermanentFailure(String),
}

impl SubmissionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::PermanentFailure(_))
    }
}

impl fmt::Display for SubmissionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRequested => write!(f, "already requested"),
            Self::NewlySubmitted => write!(f, "submitted"),
            Self::PermanentFailure(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// One submission with its diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionAttempt {
    pub url: String,
    pub outcome: SubmissionOutcome,
    /// Backoff waits spent on rate-limited metadata queries
    pub rate_limit_waits: u32,
}

/// Submits eligible URLs to the Indexing API
pub struct SubmissionController<'a, S: IndexingService + ?Sized> {
    service: &'a S,
    token: &'a str,
    retry: RetryPolicy,
}

impl<'a, S: IndexingService + ?Sized> SubmissionController<'a, S> {
    pub fn new(service: &'a S, token: &'a str, retry: RetryPolicy) -> Self {
        Self {
            service,
            token,
            retry,
        }
    }

    /// Submits one URL unless a submission already exists
    pub async fn submit(&self, url: &str, quota: &QuotaPolicy) -> SubmissionAttempt {
        let retries = if quota.rpm_retry {
            self.retry.retries_on_rate_limit
        } else {
            0
        };
        let mut rate_limit_waits = 0;

        let outcome = loop {
            let status = match self.service.publish_metadata(self.token, url).await {
                Ok(status) => status,
                Err(e) => break SubmissionOutcome::PermanentFailure(e.to_string()),
            };

            match status {
                404 => break self.request(url).await,
                429 if rate_limit_waits < retries => {
                    rate_limit_waits += 1;
                    tracing::warn!(
                        "Rate limited checking {}, retry {}/{} in {:?}",
                        url,
                        rate_limit_waits,
                        retries,
                        self.retry.backoff
                    );
                    tokio::time::sleep(self.retry.backoff).await;
                }
                429 => {
                    break SubmissionOutcome::PermanentFailure(format!(
                        "rate limited (HTTP 429) after {} retries",
                        rate_limit_waits
                    ))
                }
                status if status < 400 => break SubmissionOutcome::AlreadyRequested,
                status => {
                    break SubmissionOutcome::PermanentFailure(format!(
                        "metadata query returned HTTP {}",
                        status
                    ))
                }
            }
        };

        match &outcome {
            SubmissionOutcome::PermanentFailure(reason) => {
                tracing::warn!("Not submitting {}: {}", url, reason)
            }
            other => tracing::info!("{}: {}", url, other),
        }

        SubmissionAttempt {
            url: url.to_string(),
            outcome,
            rate_limit_waits,
        }
    }

    /// Submits URLs strictly one after another
    ///
    /// A failed URL is recorded and the loop moves on.
    pub async fn submit_all(&self, urls: &[String], quota: &QuotaPolicy) -> Vec<SubmissionAttempt> {
        let mut attempts = Vec::with_capacity(urls.len());
        for url in urls {
            attempts.push(self.submit(url, quota).await);
        }
        attempts
    }

    async fn request(&self, url: &str) -> SubmissionOutcome {
        match self.service.request_indexing(self.token, url).await {
            Ok(()) => SubmissionOutcome::NewlySubmitted,
            Err(e) => SubmissionOutcome::PermanentFailure(format!("indexing request failed: {}", e)),
        }
    }
}
