//! End-to-end scrape tests against a local mock server.
//!
//! Covers retry on rate limiting, cache short-circuit and population,
//! credential headers, and the error statuses surfaced to callers.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use assert_json_diff::assert_json_include;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use orgscope::fetch::{
    CapturedFailure, FailureCategory, FetchConfig, FetchRequest, HttpTransport, RawResponse,
    ResilientFetcher, Transport,
};
use orgscope::ports::{CacheStore, FileCacheStore, MemoryCacheStore, StaticCredentialStore};
use orgscope::{EntityRecord, InputMethod, ScrapeError, ScrapeRequest, Scraper, ScraperConfig};

// ─────────────────────── helpers ───────────────────────

const PROFILE: &str = include_str!("fixtures/acme_profile.html");

/// Config with millisecond backoff so retry tests stay fast.
fn fast_config() -> ScraperConfig {
    ScraperConfig {
        fetch: FetchConfig {
            max_retries: 3,
            base_delay: Duration::from_millis(5),
            timeout: Duration::from_secs(2),
            ..FetchConfig::default()
        },
        ..ScraperConfig::default()
    }
}

fn scraper_with(cache: Arc<dyn CacheStore>, credentials: StaticCredentialStore) -> Scraper {
    Scraper::with_http(cache, Arc::new(credentials), fast_config())
}

async fn mount_profile(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/company/acme"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE))
        .mount(server)
        .await;
}

/// Real HTTP transport that counts attempts.
struct CountingTransport {
    inner: HttpTransport,
    calls: AtomicU32,
}

#[async_trait]
impl Transport for CountingTransport {
    async fn send(&self, request: &FetchRequest) -> Result<RawResponse, CapturedFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.send(request).await
    }
}

// ─────────────────────── tests ───────────────────────

#[tokio::test]
async fn test_rate_limited_twice_then_profile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company/acme"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_profile(&server).await;

    let scraper = scraper_with(Arc::new(MemoryCacheStore::new()), StaticCredentialStore::new());
    let url = format!("{}/company/acme", server.uri());
    let records = scraper.scrape(&ScrapeRequest::post(&url)).await.unwrap();

    assert_eq!(records.len(), 1);
    let value = serde_json::to_value(&records).unwrap();
    assert_json_include!(
        actual: value,
        expected: json!([{
            "company_info": {
                "company_name": "Acme Corp",
                "company_slogan": "Everything for the discerning coyote",
                "company_website": "https://acme.example",
                "company_linkedin_url": url,
                "founded_year": 1949,
                "specialties": "Anvils, Rockets, and Portable Holes",
                "industry": "Machinery Manufacturing",
                "headquarters": "Desert, AZ",
                "company_address": {
                    "full_address": "1 Main St, Desert, 85001, US",
                    "street_address": "1 Main St",
                    "address_locality": "Desert",
                    "postal_code": "85001",
                    "country": "US"
                },
                "number_of_employees": 250,
                "followers": "12345"
            },
            "recent_publications": [
                {"date": "2024-03-05", "text": "We just shipped a new anvil.",
                 "url": "https://example.com/posts/anvil"},
                {"date": "2024-02-20", "text": "No text",
                 "url": "https://example.com/posts/rocket"}
            ],
            "similar_companies": [
                {"name": "Beta Tools", "industry": "Hardware", "location": "Phoenix, AZ",
                 "url": "https://example.com/company/beta-tools"},
                {"name": "Gamma", "industry": "Software", "location": "Paris",
                 "url": "https://example.com/company/gamma"}
            ]
        }])
    );
}

#[tokio::test]
async fn test_retries_exhausted_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(4)
        .mount(&server)
        .await;

    let scraper = scraper_with(Arc::new(MemoryCacheStore::new()), StaticCredentialStore::new());
    let err = scraper
        .scrape(&ScrapeRequest::post(format!("{}/company/acme", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, ScrapeError::Fetch(_)));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_cache_hit_skips_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/company/acme", server.uri());
    let cached = orgscope::extract_record(PROFILE, &url).unwrap();
    let cache = Arc::new(MemoryCacheStore::new());
    cache
        .store(&url, &[cached.clone()], Duration::from_secs(60))
        .await
        .unwrap();

    let scraper = scraper_with(cache, StaticCredentialStore::new());
    let records = scraper.scrape(&ScrapeRequest::post(&url)).await.unwrap();
    assert_eq!(records, vec![cached]);
}

#[tokio::test]
async fn test_scrape_populates_cache() {
    let server = MockServer::start().await;
    mount_profile(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let cache = Arc::new(FileCacheStore::new(dir.path()));
    let scraper = scraper_with(cache.clone(), StaticCredentialStore::new());

    let url = format!("{}/company/acme", server.uri());
    let records = scraper.scrape(&ScrapeRequest::post(&url)).await.unwrap();

    scraper.flush().await;
    let stored: Vec<EntityRecord> = cache.lookup(&url).await.unwrap().expect("entry cached");
    assert_eq!(stored, records);
}

#[tokio::test]
async fn test_bypassing_cache_still_refreshes_entry() {
    let server = MockServer::start().await;
    mount_profile(&server).await;

    let url = format!("{}/company/acme", server.uri());
    let cache = Arc::new(MemoryCacheStore::new());
    let mut stale = orgscope::extract_record(PROFILE, &url).unwrap();
    stale.company_info.company_name = "Stale Name".to_string();
    cache.store(&url, &[stale], Duration::from_secs(60)).await.unwrap();

    let scraper = scraper_with(cache.clone(), StaticCredentialStore::new());
    let request = ScrapeRequest {
        use_cache: false,
        ..ScrapeRequest::post(&url)
    };
    let records = scraper.scrape(&request).await.unwrap();
    assert_eq!(records[0].company_info.company_name, "Acme Corp");

    scraper.flush().await;
    let entry = cache.lookup(&url).await.unwrap().unwrap();
    assert_eq!(entry[0].company_info.company_name, "Acme Corp");
}

#[tokio::test]
async fn test_proxy_credential_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company/acme"))
        .and(header("X-Proxy", "user:pass@proxy.example:8080"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PROFILE))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = StaticCredentialStore::new().with("proxy", "user:pass@proxy.example:8080");
    let scraper = scraper_with(Arc::new(MemoryCacheStore::new()), credentials);
    let records = scraper
        .scrape(&ScrapeRequest::post(format!("{}/company/acme", server.uri())))
        .await
        .unwrap();
    assert_eq!(records[0].company_info.company_name, "Acme Corp");
}

#[tokio::test]
async fn test_page_without_organization_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html><body>Page not found</body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let scraper = scraper_with(Arc::new(MemoryCacheStore::new()), StaticCredentialStore::new());
    let err = scraper
        .scrape(&ScrapeRequest::post(format!("{}/company/missing", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 404);
    assert_eq!(
        serde_json::to_value(err.to_error_body()).unwrap(),
        json!({"error": "Company data not found"})
    );
}

#[tokio::test]
async fn test_non_post_and_missing_url_are_rejected() {
    let scraper = scraper_with(Arc::new(MemoryCacheStore::new()), StaticCredentialStore::new());

    let get = ScrapeRequest {
        method: "GET".parse::<InputMethod>().unwrap(),
        ..ScrapeRequest::post("https://example.com/company/acme")
    };
    let err = scraper.scrape(&get).await.unwrap_err();
    assert_eq!(err.status_code(), 405);
    assert_eq!(err.to_error_body().error, "Only POST requests are allowed");

    let missing = ScrapeRequest {
        url: None,
        ..ScrapeRequest::post("")
    };
    let err = scraper.scrape(&missing).await.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_error_body().error, "URL is required");
}

#[tokio::test]
async fn test_slow_server_times_out_each_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PROFILE)
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fetch = FetchConfig {
        max_retries: 1,
        base_delay: Duration::from_millis(5),
        timeout: Duration::from_millis(150),
        ..FetchConfig::default()
    };
    let transport = Arc::new(CountingTransport {
        inner: HttpTransport::new(&fetch.user_agent),
        calls: AtomicU32::new(0),
    });
    let fetcher = ResilientFetcher::new(transport.clone(), fetch.clone());
    let scraper = Scraper::new(
        fetcher,
        Arc::new(MemoryCacheStore::new()),
        Arc::new(StaticCredentialStore::new()),
        ScraperConfig {
            fetch,
            ..ScraperConfig::default()
        },
    );

    let err = scraper
        .scrape(&ScrapeRequest::post(format!("{}/company/acme", server.uri())))
        .await
        .unwrap_err();

    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    match err {
        ScrapeError::Fetch(failure) => {
            assert_eq!(failure.category, FailureCategory::Timeout);
            assert_eq!(failure.cause.name, "TimeoutError");
        }
        other => panic!("expected fetch failure, got {other:?}"),
    }
}
