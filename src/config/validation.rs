use crate::cache::StalenessPolicy;
use crate::config::types::{ApiConfig, CacheConfig, Config, PolicyConfig};
use crate::state::IndexingStatus;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_policy_config(&config.policy)?;
    validate_cache_config(&config.cache)?;
    validate_api_config(&config.api)?;
    Ok(())
}

/// Validates status-check policy
fn validate_policy_config(config: &PolicyConfig) -> Result<(), ConfigError> {
    if config.batch_size < 1 || config.batch_size > 200 {
        return Err(ConfigError::Validation(format!(
            "batch-size must be between 1 and 200, got {}",
            config.batch_size
        )));
    }

    let indexable = config.indexable_set();
    if indexable.is_empty() {
        return Err(ConfigError::Validation(
            "indexable-statuses cannot be empty".to_string(),
        ));
    }

    // Under indexable-and-age a rate-limited entry is only rechecked when it
    // is indexable, so without RateLimited in the set it stays cached forever
    if config.staleness == StalenessPolicy::IndexableAndAge
        && !indexable.contains(IndexingStatus::RateLimited)
    {
        return Err(ConfigError::Validation(
            "staleness = \"indexable-and-age\" needs \"RateLimited\" in indexable-statuses"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates API endpoints and timeouts
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    for (name, endpoint) in [
        ("webmasters-endpoint", &config.webmasters_endpoint),
        ("inspection-endpoint", &config.inspection_endpoint),
        ("indexing-endpoint", &config.indexing_endpoint),
    ] {
        let url = Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "{} must be an http(s) URL, got '{}'",
                name, endpoint
            )));
        }
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}
