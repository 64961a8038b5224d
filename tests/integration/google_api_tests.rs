//! HTTP-level tests for the Google API client

use gsc_indexer::api::{ApiError, GoogleClient, IndexingService};
use gsc_indexer::config::ApiConfig;
use gsc_indexer::IndexingStatus;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const SITE: &str = "sc-domain:example.com";
const PAGE: &str = "https://example.com/page";

/// Points every endpoint at the mock server
fn client_for(server: &MockServer) -> GoogleClient {
    let uri = server.uri();
    let config = ApiConfig {
        webmasters_endpoint: uri.clone(),
        inspection_endpoint: uri.clone(),
        indexing_endpoint: uri,
        timeout_secs: 5,
    };
    GoogleClient::new(&config).expect("Failed to build client")
}

async fn inspection_status(response: ResponseTemplate) -> IndexingStatus {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/urlInspection/index:inspect"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "inspectionUrl": PAGE, "siteUrl": SITE })))
        .respond_with(response)
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .page_indexing_status(TOKEN, SITE, PAGE)
        .await
}

fn coverage(label: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "inspectionResult": {
            "inspectionResultLink": "https://search.google.com/search-console/inspect",
            "indexStatusResult": {
                "verdict": "PASS",
                "coverageState": label
            }
        }
    }))
}

#[tokio::test]
async fn test_list_sites() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "siteEntry": [
                { "siteUrl": "sc-domain:example.com", "permissionLevel": "siteOwner" },
                { "siteUrl": "https://other.org/", "permissionLevel": "siteFullUser" }
            ]
        })))
        .mount(&server)
        .await;

    let sites = client_for(&server).list_sites(TOKEN).await.unwrap();
    assert_eq!(sites, vec!["sc-domain:example.com", "https://other.org/"]);
}

#[tokio::test]
async fn test_list_sites_empty_account() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let sites = client_for(&server).list_sites(TOKEN).await.unwrap();
    assert!(sites.is_empty());
}

#[tokio::test]
async fn test_list_sites_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sites"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Credentials"))
        .mount(&server)
        .await;

    let err = client_for(&server).list_sites(TOKEN).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
}

#[tokio::test]
async fn test_list_sitemaps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/sites/.+/sitemaps$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sitemap": [
                { "path": "https://example.com/sitemap.xml", "isPending": false },
                { "path": "https://example.com/news.xml" }
            ]
        })))
        .mount(&server)
        .await;

    let sitemaps = client_for(&server).list_sitemaps(TOKEN, SITE).await.unwrap();
    assert_eq!(
        sitemaps,
        vec!["https://example.com/sitemap.xml", "https://example.com/news.xml"]
    );
}

#[tokio::test]
async fn test_sitemap_index_is_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap_index.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
  <sitemap><loc>{base}/sitemap-missing.xml</loc></sitemap>
</sitemapindex>"#
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-pages.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://example.com/</loc></url>
  <url><loc>https://example.com/about</loc></url>
</urlset>"#,
        ))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/sitemap-missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let urls = client_for(&server)
        .sitemap_urls(&format!("{}/sitemap_index.xml", base))
        .await
        .unwrap();

    // The missing child is skipped, the rest still counts
    assert_eq!(urls, vec!["https://example.com/", "https://example.com/about"]);
}

#[tokio::test]
async fn test_unreadable_sitemap_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset><url><loc>x</url>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .sitemap_urls(&format!("{}/sitemap.xml", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Sitemap { .. }));
}

#[tokio::test]
async fn test_inspection_coverage_states() {
    assert_eq!(
        inspection_status(coverage("Submitted and indexed")).await,
        IndexingStatus::SubmittedAndIndexed
    );
    assert_eq!(
        inspection_status(coverage("Discovered - currently not indexed")).await,
        IndexingStatus::DiscoveredCurrentlyNotIndexed
    );
    assert_eq!(
        inspection_status(coverage("URL is unknown to Google")).await,
        IndexingStatus::URLIsUnknownToGoogle
    );
}

#[tokio::test]
async fn test_inspection_http_failures() {
    assert_eq!(
        inspection_status(ResponseTemplate::new(429)).await,
        IndexingStatus::RateLimited
    );
    assert_eq!(
        inspection_status(ResponseTemplate::new(403)).await,
        IndexingStatus::Forbidden
    );
    assert_eq!(
        inspection_status(ResponseTemplate::new(500)).await,
        IndexingStatus::Error
    );
}

#[tokio::test]
async fn test_inspection_unexpected_bodies() {
    assert_eq!(
        inspection_status(coverage("Blocked by robots.txt")).await,
        IndexingStatus::Error
    );
    assert_eq!(
        inspection_status(ResponseTemplate::new(200).set_body_json(json!({}))).await,
        IndexingStatus::Error
    );
    assert_eq!(
        inspection_status(ResponseTemplate::new(200).set_body_string("not json")).await,
        IndexingStatus::Error
    );
}

#[tokio::test]
async fn test_publish_metadata_returns_status_code() {
    for status in [200u16, 404, 429] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/urlNotifications/metadata"))
            .and(query_param("url", PAGE))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let code = client_for(&server)
            .publish_metadata(TOKEN, PAGE)
            .await
            .unwrap();
        assert_eq!(code, status);
    }
}

#[tokio::test]
async fn test_request_indexing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/urlNotifications:publish"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({ "url": PAGE, "type": "URL_UPDATED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "urlNotificationMetadata": { "url": PAGE }
        })))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .request_indexing(TOKEN, PAGE)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_request_indexing_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/urlNotifications:publish"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Permission denied"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .request_indexing(TOKEN, PAGE)
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(403));
}
