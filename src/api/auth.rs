//! Bearer token acquisition

use crate::api::ApiResult;
use async_trait::async_trait;
use std::path::PathBuf;

/// Credential sources a token can be obtained from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    /// Path to a service account JSON key file
    pub path: Option<PathBuf>,
    /// A bearer token minted elsewhere (e.g. `gcloud auth print-access-token`)
    pub access_token: Option<String>,
}

impl Credentials {
    /// Returns true if a service account is configured
    pub fn has_service_account(&self) -> bool {
        self.path.is_some() || (self.client_email.is_some() && self.private_key.is_some())
    }
}

/// Produces the bearer token used for every API call in a run
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Returns a token, or `None` when the credentials can't produce one
    async fn access_token(&self, credentials: &Credentials) -> ApiResult<Option<String>>;
}

/// Uses the pre-minted `access_token` as is
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTokenProvider;

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn access_token(&self, credentials: &Credentials) -> ApiResult<Option<String>> {
        match credentials.access_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(Some(token.to_string())),
            _ => {
                if credentials.has_service_account() {
                    tracing::warn!(
                        "Service account credentials need to be exchanged for an access token \
                         first; pass one with --access-token or GSC_ACCESS_TOKEN"
                    );
                }
                Ok(None)
            }
        }
    }
}
