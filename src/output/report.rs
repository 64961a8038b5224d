//! Run report display

use crate::pipeline::{RunReport, SubmissionOutcome};
use crate::state::IndexingStatus;

/// Returns the emoji shown next to a raw status
pub fn emoji_for_status(status: IndexingStatus) -> &'static str {
    match status {
        IndexingStatus::SubmittedAndIndexed => "✅",
        IndexingStatus::DuplicateWithoutUserSelectedCanonical => "😵",
        IndexingStatus::CrawledCurrentlyNotIndexed
        | IndexingStatus::DiscoveredCurrentlyNotIndexed => "👀",
        IndexingStatus::PageWithRedirect => "🔀",
        IndexingStatus::URLIsUnknownToGoogle => "❓",
        IndexingStatus::RateLimited => "🚦",
        IndexingStatus::Forbidden | IndexingStatus::Error => "❌",
    }
}

/// Renders the status breakdown of a report, one line per non-empty status
pub fn format_status_lines(report: &RunReport) -> Vec<String> {
    report
        .indexing_counts
        .iter()
        .filter(|(_, count)| **count > 0)
        .map(|(status, count)| {
            format!(
                "{} {}: {} {}",
                emoji_for_status(*status),
                status,
                count,
                if *count == 1 { "page" } else { "pages" }
            )
        })
        .collect()
}

/// Prints a run report to stdout
pub fn print_report(report: &RunReport) {
    println!("=== {} ===\n", report.site_url);

    println!("Overview:");
    println!("  Run started: {}", report.started_at.to_rfc3339());
    println!("  URLs: {}", report.total_urls);
    println!("  Checked this run: {}", report.checked);
    println!("  Answered from cache: {}", report.from_cache);
    println!();

    println!("Indexing Status:");
    for line in format_status_lines(report) {
        println!("  {}", line);
    }
    println!();

    println!("Page Status:");
    for (status, count) in &report.page_counts {
        println!("  {}: {}", status, count);
    }
    println!();

    if report.queued.is_empty() {
        println!("✨ Nothing to submit, every page is indexed or settled");
        return;
    }

    if report.dry_run {
        println!("Would submit ({}):", report.queued.len());
        for url in &report.queued {
            println!("  - {}", url);
        }
        return;
    }

    println!("Submissions ({}):", report.submissions.len());
    for attempt in &report.submissions {
        let marker = match attempt.outcome {
            SubmissionOutcome::NewlySubmitted => "🚀",
            SubmissionOutcome::AlreadyRequested => "🕛",
            SubmissionOutcome::PermanentFailure(_) => "❌",
        };
        if attempt.rate_limit_waits > 0 {
            println!(
                "  {} {} ({}, {} rate-limit waits)",
                marker, attempt.url, attempt.outcome, attempt.rate_limit_waits
            );
        } else {
            println!("  {} {} ({})", marker, attempt.url, attempt.outcome);
        }
    }
    println!();

    println!(
        "Submitted: {}, already requested: {}, failed: {}",
        report.newly_submitted(),
        report.already_requested(),
        report.failed_submissions()
    );
}
