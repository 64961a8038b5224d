//! State module for URL statuses
//!
//! # Components
//!
//! - `IndexingStatus`: the raw coverage state Search Console reports for a URL
//! - `IndexableSet`: the statuses that make a URL worth (re)submitting
//! - `PageStatus`: the pipeline's own actionability state, derived by `classify`

mod indexing_status;
mod page_status;

// Re-export main types
pub use indexing_status::{IndexableSet, IndexingStatus};
pub use page_status::{classify, PageStatus};
