//! Site URL resolution
//!
//! Search Console knows a site either as a domain property (`sc-domain:host`)
//! or as a URL-prefix property (`https://host/path/`). These helpers normalize
//! user input into one of those forms and validate custom URL lists against it.

use crate::api::IndexingService;
use crate::IndexerError;
use url::Url;

const DOMAIN_PREFIX: &str = "sc-domain:";

/// Converts user input into a Search Console site URL
///
/// A bare domain becomes a domain property; an http(s) URL becomes a
/// URL-prefix property with a trailing slash.
///
/// # Examples
///
/// ```
/// use gsc_indexer::api::convert_to_site_url;
///
/// assert_eq!(convert_to_site_url("example.com"), "sc-domain:example.com");
/// assert_eq!(convert_to_site_url("https://example.com"), "https://example.com/");
/// ```
pub fn convert_to_site_url(input: &str) -> String {
    let input = input.trim();

    if input.starts_with(DOMAIN_PREFIX) {
        input.to_string()
    } else if input.starts_with("http://") || input.starts_with("https://") {
        if input.ends_with('/') {
            input.to_string()
        } else {
            format!("{}/", input)
        }
    } else {
        format!("{}{}", DOMAIN_PREFIX, input.trim_end_matches('/'))
    }
}

/// Returns the forms a site may be registered under, preferred form first
pub fn site_url_variants(site_url: &str) -> Vec<String> {
    if let Some(domain) = site_url.strip_prefix(DOMAIN_PREFIX) {
        return vec![
            site_url.to_string(),
            format!("https://{}/", domain),
            format!("http://{}/", domain),
        ];
    }

    let mut variants = vec![site_url.to_string()];
    if let Some(host) = Url::parse(site_url)
        .ok()
        .and_then(|url| url.host_str().map(String::from))
    {
        variants.push(format!("{}{}", DOMAIN_PREFIX, host));
    }
    if let Some(rest) = site_url.strip_prefix("https://") {
        variants.push(format!("http://{}", rest));
    } else if let Some(rest) = site_url.strip_prefix("http://") {
        variants.push(format!("https://{}", rest));
    }
    variants
}

/// Finds the registered form of `site_url` among the account's sites
///
/// # Returns
///
/// * `Ok(String)` - The site URL exactly as Search Console lists it
/// * `Err(IndexerError::SiteAccessDenied)` - The account can't access the site
pub async fn check_site_url<S: IndexingService + ?Sized>(
    service: &S,
    token: &str,
    site_url: &str,
) -> Result<String, IndexerError> {
    let sites = service.list_sites(token).await?;
    tracing::debug!("Account has access to {} sites", sites.len());

    site_url_variants(site_url)
        .into_iter()
        .find(|variant| sites.iter().any(|site| site == variant))
        .ok_or_else(|| IndexerError::SiteAccessDenied {
            site_url: site_url.to_string(),
        })
}

/// Turns a user-supplied URL list into absolute URLs belonging to the site
///
/// Relative paths and bare hostnames are completed with the site's scheme and
/// domain. URLs that end up outside the property are dropped with a warning.
pub fn check_custom_urls(site_url: &str, urls: &[String]) -> Vec<String> {
    let scheme = if site_url.starts_with("http://") {
        "http"
    } else {
        "https"
    };
    let domain = site_url
        .trim_start_matches("https://")
        .trim_start_matches("http://")
        .trim_start_matches(DOMAIN_PREFIX)
        .trim_end_matches('/');

    urls.iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .filter_map(|raw| {
            let absolute = if raw.starts_with('/') {
                format!("{}://{}{}", scheme, domain, raw)
            } else if raw.starts_with("http://") || raw.starts_with("https://") {
                raw.to_string()
            } else if raw.starts_with(domain) {
                format!("{}://{}", scheme, raw)
            } else {
                format!("{}://{}/{}", scheme, domain, raw)
            };

            if belongs_to_site(site_url, &absolute) {
                Some(absolute)
            } else {
                tracing::warn!("Skipping {}: not part of {}", raw, site_url);
                None
            }
        })
        .collect()
}

/// Checks that a URL falls inside a Search Console property
fn belongs_to_site(site_url: &str, url: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };

    match site_url.strip_prefix(DOMAIN_PREFIX) {
        Some(domain) => parsed
            .host_str()
            .map(|host| host == domain || host.ends_with(&format!(".{}", domain)))
            .unwrap_or(false),
        None => url.starts_with(site_url) || format!("{}/", url) == site_url,
    }
}
