//! Indexing pipeline
//!
//! This module contains the run logic, including:
//! - Bounded-concurrency status checks in sequential batches
//! - Per-URL classification into cache entries
//! - Sequential submission with rate-limit backoff
//! - Overall run coordination and reporting

mod batch;
mod checker;
mod coordinator;
mod submission;

pub use batch::{run_batches, BatchProgress, ItemContext};
pub use checker::StatusChecker;
pub use coordinator::{obtain_token, Pipeline, RunReport, RunRequest, RunStage};
pub use submission::{
    QuotaPolicy, RetryPolicy, SubmissionAttempt, SubmissionController, SubmissionOutcome,
};

use crate::api::{AuthProvider, GoogleClient};
use crate::config::{Config, ResolvedOptions};
use crate::IndexerError;

/// Runs a complete indexing pass for one site against the Google APIs
///
/// This is the main entry point. It will:
/// 1. Obtain a bearer token from `auth`
/// 2. Build the HTTP client
/// 3. Resolve the site and enumerate its URLs
/// 4. Check and cache statuses
/// 5. Submit the URLs that still need indexing (unless `dry_run`)
pub async fn index_site(
    config: Config,
    auth: &dyn AuthProvider,
    site: &str,
    options: ResolvedOptions,
    dry_run: bool,
) -> Result<RunReport, IndexerError> {
    let token = obtain_token(auth, &options.credentials).await?;
    let client = GoogleClient::new(&config.api)?;

    let request = RunRequest {
        site: site.to_string(),
        token,
        urls: options.urls,
        rpm_retry: options.rpm_retry,
        dry_run,
    };

    Pipeline::new(client, config).run(&request).await
}
