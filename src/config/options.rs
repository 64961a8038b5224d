//! Run options and their precedence
//!
//! Each option resolves from, in order: an explicit value given by the caller,
//! a command-line flag, then an environment variable.

use crate::api::Credentials;
use std::path::PathBuf;

pub const ENV_CLIENT_EMAIL: &str = "GSC_CLIENT_EMAIL";
pub const ENV_PRIVATE_KEY: &str = "GSC_PRIVATE_KEY";
pub const ENV_PATH: &str = "GSC_PATH";
pub const ENV_ACCESS_TOKEN: &str = "GSC_ACCESS_TOKEN";
pub const ENV_URLS: &str = "GSC_URLS";
pub const ENV_RPM_RETRY: &str = "GSC_QUOTA_RPM_RETRY";

/// One layer of run options, any of which may be unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    /// Path to a service account key file
    pub path: Option<PathBuf>,
    pub access_token: Option<String>,
    /// Explicit URL list, bypassing sitemap discovery
    pub urls: Option<Vec<String>>,
    /// Wait and retry when the publish-metadata query is rate limited
    pub rpm_retry: Option<bool>,
}

/// Options after precedence has been applied
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub credentials: Credentials,
    pub urls: Option<Vec<String>>,
    pub rpm_retry: bool,
}

impl RunOptions {
    /// Reads the environment layer through `lookup`
    ///
    /// `lookup` is normally `|key| std::env::var(key).ok()`.
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            client_email: non_empty(ENV_CLIENT_EMAIL),
            private_key: non_empty(ENV_PRIVATE_KEY),
            path: non_empty(ENV_PATH).map(PathBuf::from),
            access_token: non_empty(ENV_ACCESS_TOKEN),
            urls: non_empty(ENV_URLS).map(|value| split_url_list(&value)),
            rpm_retry: non_empty(ENV_RPM_RETRY).map(|value| parse_flag(&value)),
        }
    }

    /// Fills every unset field of `self` from `fallback`
    pub fn or(self, fallback: RunOptions) -> RunOptions {
        RunOptions {
            client_email: self.client_email.or(fallback.client_email),
            private_key: self.private_key.or(fallback.private_key),
            path: self.path.or(fallback.path),
            access_token: self.access_token.or(fallback.access_token),
            urls: self.urls.or(fallback.urls),
            rpm_retry: self.rpm_retry.or(fallback.rpm_retry),
        }
    }

    /// Applies explicit > flag > environment precedence
    pub fn resolve(explicit: RunOptions, flags: RunOptions, env: RunOptions) -> ResolvedOptions {
        let merged = explicit.or(flags).or(env);

        ResolvedOptions {
            credentials: Credentials {
                client_email: merged.client_email,
                private_key: merged.private_key,
                path: merged.path,
                access_token: merged.access_token,
            },
            urls: merged.urls,
            rpm_retry: merged.rpm_retry.unwrap_or(false),
        }
    }
}

/// Splits a comma-separated URL list, dropping blanks
pub fn split_url_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(String::from)
        .collect()
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
