//! Configuration module for gsc-indexer
//!
//! This module handles the optional TOML policy file (batch size, freshness
//! window, retry budget, cache location, API endpoints) and the run options
//! that resolve from explicit values, command-line flags and the environment.
//!
//! # Example
//!
//! ```no_run
//! use gsc_indexer::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("gsc-indexer.toml")).unwrap();
//! println!("Checking {} URLs at a time", config.policy.batch_size);
//! ```

mod options;
mod parser;
mod types;
mod validation;

// Re-export types
pub use options::{split_url_list, ResolvedOptions, RunOptions};
pub use types::{ApiConfig, CacheConfig, Config, PolicyConfig, QuotaConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
