//! Output module for run reports and cache statistics
//!
//! This module handles:
//! - Printing the summary of a finished run
//! - Printing status counts straight from the cache

mod report;
pub mod stats;

pub use report::{emoji_for_status, format_status_lines, print_report};
pub use stats::{load_statistics, print_statistics, CacheStatistics};
