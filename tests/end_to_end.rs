//! Integration tests for the crawl coordination core
//!
//! These exercise the full processing loop (seed → frontier → dispatch →
//! route → frontier) against the in-memory store, and the production
//! fetcher against a wiremock HTTP server.

use async_trait::async_trait;
use driftnet::config::Config;
use driftnet::crawler::{
    FetchError, FetchedPage, HttpFetcher, PageFetcher, ResultRouter, Supervisor,
};
use driftnet::scope::ScopePolicy;
use driftnet::store::{FrontierStore, MemoryStore, ProcessingOutcome};
use driftnet::url::Fingerprint;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetcher returning canned pages; unknown URLs fail with a 404
struct ScriptedFetcher {
    pages: HashMap<String, FetchedPage>,
}

impl ScriptedFetcher {
    fn new(pages: Vec<(&str, FetchedPage)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(url, page)| (url.to_string(), page))
                .collect(),
        }
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url.as_str()) {
            Some(page) => Ok(page.clone()),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn page(emails: &[&str], links: &[&str]) -> FetchedPage {
    FetchedPage {
        emails: emails.iter().map(|s| s.to_string()).collect(),
        links: links.iter().map(|s| Url::parse(s).unwrap()).collect(),
    }
}

fn fast_config() -> Config {
    let mut config = Config::default();
    config.dispatcher.poll_interval_ms = 10;
    config.dispatcher.sweep_interval_secs = 1;
    config.dispatcher.processing_timeout_secs = 1;
    config
}

/// The single-round scenario: seed a.example with domain scope "example";
/// the fetch yields one email, one in-scope link, and one out-of-scope
/// link. After routing, the source is visited, the artifact recorded, and
/// the frontier holds exactly the in-scope link.
#[tokio::test]
async fn test_one_processing_round() {
    let store = Arc::new(MemoryStore::new());
    let router = ResultRouter::new(
        store.clone(),
        ScopePolicy::DomainSuffix {
            suffix: "example".to_string(),
        },
        false,
    );

    driftnet::seed::ingest(store.as_ref(), &["https://a.example/".to_string()])
        .await
        .unwrap();

    let batch = store.pop_batch(8).await.unwrap();
    assert_eq!(batch.len(), 1);
    let source = &batch[0];

    router
        .route_success(
            source,
            page(
                &["x@a.example"],
                &["https://a.example/page2", "https://other.com"],
            ),
        )
        .await
        .unwrap();

    assert!(store
        .is_visited(&Fingerprint::of("https://a.example/"))
        .await
        .unwrap());
    assert_eq!(
        store.artifact_backlog().await.unwrap(),
        vec!["x@a.example".to_string()]
    );

    let remaining = store.pop_batch(8).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].record.url.as_str(), "https://a.example/page2");
}

/// Every fingerprint that ever entered the frontier ends in exactly one
/// of visited/failed once the system is quiescent.
#[tokio::test]
async fn test_no_silent_loss() {
    let store = Arc::new(MemoryStore::new());

    let seeds: Vec<String> = vec![
        "https://a.example/ok1".to_string(),
        "https://a.example/ok2".to_string(),
        "https://a.example/broken".to_string(),
        "https://b.example/ok".to_string(),
    ];
    driftnet::seed::ingest(store.as_ref(), &seeds).await.unwrap();

    // /broken is not scripted, so its fetch 404s
    let fetcher = ScriptedFetcher::new(vec![
        ("https://a.example/ok1", page(&[], &["https://a.example/ok2"])),
        ("https://a.example/ok2", page(&[], &[])),
        ("https://b.example/ok", page(&["c@b.example"], &[])),
    ]);

    let supervisor = Supervisor::new(
        store.clone(),
        Arc::new(fetcher),
        ScopePolicy::Unrestricted,
        fast_config(),
    )
    .with_worker_id("loss-test".to_string());
    supervisor.run().await.unwrap();

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.frontier, 0, "quiescent frontier must be empty");
    assert_eq!(counts.processing, 0, "nothing may remain in flight");
    assert_eq!(counts.visited + counts.failed, 4);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.processed, 4, "audit set must cover every seed");

    assert!(!store
        .is_visited(&Fingerprint::of("https://a.example/broken"))
        .await
        .unwrap());
}

/// Two workers sharing one store never fetch the same fingerprint twice.
#[tokio::test]
async fn test_two_workers_split_the_frontier() {
    let store = Arc::new(MemoryStore::new());

    let seeds: Vec<String> = (0..20)
        .map(|i| format!("https://a.example/page{}", i))
        .collect();
    driftnet::seed::ingest(store.as_ref(), &seeds).await.unwrap();

    let scripted: Vec<(String, FetchedPage)> = seeds
        .iter()
        .map(|s| (s.clone(), FetchedPage::default()))
        .collect();

    let mut handles = Vec::new();
    for worker in 0..2 {
        let store = store.clone();
        let fetcher = ScriptedFetcher {
            pages: scripted.iter().cloned().collect(),
        };
        handles.push(tokio::spawn(async move {
            Supervisor::new(
                store,
                Arc::new(fetcher),
                ScopePolicy::Unrestricted,
                fast_config(),
            )
            .with_worker_id(format!("split-test-{}", worker))
            .run()
            .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let counts = store.counts().await.unwrap();
    // 20 distinct fingerprints, each delivered to exactly one worker:
    // the audit set would exceed 20 if anything were double-processed.
    assert_eq!(counts.visited, 20);
    assert_eq!(counts.processed, 20);
    assert_eq!(counts.frontier, 0);
    assert_eq!(counts.processing, 0);
}

/// A dead worker's checked-out entries come back via the sweep and are
/// then fetched by a healthy worker.
#[tokio::test(start_paused = true)]
async fn test_crash_recovery_via_sweep() {
    let store = Arc::new(MemoryStore::new());
    driftnet::seed::ingest(store.as_ref(), &["https://a.example/".to_string()])
        .await
        .unwrap();

    // The "crashed" worker checked the entry out and disappeared.
    let lost = store.pop_batch(1).await.unwrap();
    assert_eq!(lost.len(), 1);
    assert_eq!(store.frontier_len().await.unwrap(), 0);

    let fetcher = ScriptedFetcher::new(vec![(
        "https://a.example/",
        page(&["x@a.example"], &[]),
    )]);
    let supervisor = Supervisor::new(
        store.clone(),
        Arc::new(fetcher),
        ScopePolicy::Unrestricted,
        fast_config(),
    )
    .with_worker_id("recovery-test".to_string());
    supervisor.run().await.unwrap();

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.visited, 1);
    assert_eq!(counts.processing, 0);
    assert_eq!(counts.artifacts, 1);
}

/// Seeding twice then crawling produces the same result as seeding once.
#[tokio::test]
async fn test_repeated_seeding_then_crawl() {
    let store = Arc::new(MemoryStore::new());
    let seeds = vec!["https://a.example/".to_string()];

    driftnet::seed::ingest(store.as_ref(), &seeds).await.unwrap();
    driftnet::seed::ingest(store.as_ref(), &seeds).await.unwrap();

    assert_eq!(store.frontier_len().await.unwrap(), 1);
    assert_eq!(store.domain_count_snapshot("a.example"), 1);
}

/// A fingerprint completed as failed is not re-enqueued when rediscovered.
#[tokio::test]
async fn test_failed_entries_not_requeued() {
    let store = Arc::new(MemoryStore::new());
    let fp = Fingerprint::of("https://a.example/flaky");
    store
        .complete(&fp, ProcessingOutcome::Failed)
        .await
        .unwrap();

    let report = driftnet::seed::ingest(store.as_ref(), &["https://a.example/flaky".to_string()])
        .await
        .unwrap();

    assert_eq!(report.inserted, 0);
    assert_eq!(store.frontier_len().await.unwrap(), 0);
}

// ===== Production fetcher against a mock HTTP server =====

#[tokio::test]
async fn test_http_fetcher_extracts_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><head><title>Home</title></head><body>
                    <p>Reach us at contact@a.example for details.</p>
                    <a href="{0}/page1">Page 1</a>
                    <a href="/page2">Page 2</a>
                    <a href="mailto:contact@a.example">mail</a>
                    </body></html>"#,
                    mock_server.uri()
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let base = Url::parse(&format!("{}/", mock_server.uri())).unwrap();

    let fetched = fetcher.fetch(&base).await.unwrap();
    assert_eq!(fetched.emails, vec!["contact@a.example"]);

    let links: Vec<String> = fetched.links.iter().map(|u| u.to_string()).collect();
    assert_eq!(
        links,
        vec![
            format!("{}/page1", mock_server.uri()),
            format!("{}/page2", mock_server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_http_fetcher_maps_status_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
    let url = Url::parse(&format!("{}/gone", mock_server.uri())).unwrap();

    match fetcher.fetch(&url).await {
        Err(FetchError::Status { status, .. }) => assert_eq!(status, 404),
        other => panic!("expected status error, got {:?}", other.map(|_| ())),
    }
}

/// Full loop with the production fetcher: seed the mock server's root,
/// scope to its host, crawl to quiescence.
#[tokio::test]
async fn test_full_crawl_against_mock_server() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let host = Url::parse(&base).unwrap().host_str().unwrap().to_string();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(
                    r#"<html><body>
                    <a href="{0}/page1">One</a>
                    <a href="{0}/page2">Two</a>
                    <a href="https://outside.example/">Outside</a>
                    </body></html>"#,
                    base
                ))
                .insert_header("content-type", "text/html"),
        )
        .mount(&mock_server)
        .await;

    for (page_path, body) in [
        ("/page1", "<html><body>first@crawl.example</body></html>"),
        ("/page2", "<html><body>second@crawl.example</body></html>"),
    ] {
        Mock::given(method("GET"))
            .and(path(page_path))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("content-type", "text/html"),
            )
            .mount(&mock_server)
            .await;
    }

    let store = Arc::new(MemoryStore::new());
    driftnet::seed::ingest(store.as_ref(), &[format!("{}/", base)])
        .await
        .unwrap();

    let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(5)).unwrap());
    let supervisor = Supervisor::new(
        store.clone(),
        fetcher,
        ScopePolicy::DomainSuffix { suffix: host },
        fast_config(),
    )
    .with_worker_id("mock-crawl".to_string());
    supervisor.run().await.unwrap();

    let counts = store.counts().await.unwrap();
    assert_eq!(counts.visited, 3);
    assert_eq!(counts.failed, 0);
    assert_eq!(counts.frontier, 0);

    let mut backlog = store.artifact_backlog().await.unwrap();
    backlog.sort();
    assert_eq!(
        backlog,
        vec![
            "first@crawl.example".to_string(),
            "second@crawl.example".to_string()
        ]
    );

    // The out-of-scope link was never enqueued or fetched
    assert!(!store
        .is_visited(&Fingerprint::of("https://outside.example/"))
        .await
        .unwrap());
}
