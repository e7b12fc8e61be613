//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a fake listing site and run the full
//! harvest cycle end-to-end through the HTTP driver binding.

use gleaner::config::{
    Config, DelayConfig, DriverConfig, DriverKind, HarvestConfig, OutputConfig, SearchConfig,
    SearchMode,
};
use gleaner::crawler::Coordinator;
use gleaner::driver::build_factory;
use gleaner::model::Catalog;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str, catalog_path: &str, workers: u32, max_pages: u32) -> Config {
    Config {
        search: SearchConfig {
            mode: SearchMode::Keyword,
            query: "rust".to_string(),
            base_url: base_url.to_string(),
        },
        harvest: HarvestConfig {
            workers,
            max_pages,
            retry_attempts: 3,
        },
        driver: DriverConfig {
            kind: DriverKind::Http,
            endpoint: String::new(),
        },
        delay: DelayConfig { min_ms: 0, max_ms: 0 }, // No politeness delay in tests
        output: OutputConfig {
            catalog_path: catalog_path.to_string(),
        },
    }
}

/// Renders a listing page with the given job ids
fn listing_page(ids: &[&str], next_page: Option<u32>, max_page: u32) -> String {
    let cards: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<article class="job-card" data-job-id="{id}">
                    <a href="/jobs/{id}">Details</a>
                    <h2 class="job-title">Job {id}</h2>
                    <span class="company-name">Acme Corp</span>
                    <span class="job-location">Remote</span>
                </article>"#
            )
        })
        .collect();

    let pagination_numbers: String = (1..=max_page)
        .map(|n| format!(r#"<a href="?page={n}">{n}</a>"#))
        .collect();

    let next = match next_page {
        Some(n) => format!(r#"<a rel="next" href="?page={n}">Next</a>"#),
        None => r##"<a rel="next" class="disabled" href="#">Next</a>"##.to_string(),
    };

    format!(
        r#"<html><body>
            <div class="results-count">{} jobs found</div>
            {cards}
            <nav class="pagination">{pagination_numbers}{next}</nav>
        </body></html>"#,
        ids.len()
    )
}

/// Renders a detail page for one job id
fn detail_page(id: &str) -> String {
    format!(
        r#"<html><body data-job-id="{id}">
            <h1 class="job-title">Senior Job {id}</h1>
            <div class="company-name">Acme Corp</div>
            <span class="job-location">Berlin</span>
            <span class="salary-range">$100,000 per year</span>
            <div class="job-description">Do the work for {id}.</div>
        </body></html>"#
    )
}

/// Mounts a detail-page mock for each id
async fn mount_detail_pages(server: &MockServer, ids: &[&str]) {
    for id in ids {
        Mock::given(method("GET"))
            .and(path(format!("/jobs/{}", id)))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(id)))
            .mount(server)
            .await;
    }
}

fn read_catalog(path: &std::path::Path) -> Catalog {
    let content = std::fs::read_to_string(path).expect("catalog file exists");
    serde_json::from_str(&content).expect("catalog is valid JSON")
}

#[tokio::test]
async fn test_full_harvest_single_page() {
    let mock_server = MockServer::start().await;
    let ids = ["j-1", "j-2", "j-3", "j-4", "j-5"];

    // Single listing page with a disabled next affordance
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&ids, None, 1)))
        .mount(&mock_server)
        .await;
    mount_detail_pages(&mock_server, &ids).await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 2, 0);

    let factory = build_factory(&config.driver).expect("factory");
    let coordinator = Coordinator::new(config, factory);
    let summary = coordinator.run().await.expect("harvest failed");

    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.completed, 5);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.stored, 5);
    assert!(summary.listing_aborted.is_none());

    // The catalog on disk is a complete, self-describing document
    let catalog = read_catalog(&catalog_path);
    assert_eq!(catalog.metadata.total_records, 5);
    assert_eq!(catalog.records.len(), 5);
    let ids_on_disk: Vec<_> = catalog.records.iter().map(|r| r.id.as_str()).collect();
    for id in ids {
        assert!(ids_on_disk.contains(&id), "missing {}", id);
    }

    // Extraction filled detail fields
    assert!(catalog.records[0].title.starts_with("Senior Job"));
    assert_eq!(catalog.records[0].company, "Acme Corp");
    assert_eq!(catalog.records[0].salary, "$100,000 per year");

    // A backup snapshot was written at shutdown
    let backups: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_str()
                .map(|n| n.starts_with("catalog.backup-"))
                .unwrap_or(false)
        })
        .collect();
    assert_eq!(backups.len(), 1);
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let mock_server = MockServer::start().await;
    let ids = ["j-1", "j-2", "j-3"];

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&ids, None, 1)))
        .mount(&mock_server)
        .await;
    mount_detail_pages(&mock_server, &ids).await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");

    // First run harvests everything
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 2, 0);
    let summary = gleaner::crawler::harvest(config).await.expect("first run failed");
    assert_eq!(summary.stored, 3);

    // Second run against the same catalog finds nothing new
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 2, 0);
    let summary = gleaner::crawler::harvest(config).await.expect("second run failed");

    assert_eq!(summary.completed, 0);
    assert_eq!(summary.stored, 3);

    let catalog = read_catalog(&catalog_path);
    assert_eq!(catalog.metadata.total_records, 3);
}

#[tokio::test]
async fn test_page_cap_stops_walk() {
    let mock_server = MockServer::start().await;

    // Pages 2 and 3 mounted first so their query matchers take precedence
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["j-2"], Some(3), 10)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["j-3"], Some(4), 10)),
        )
        .mount(&mock_server)
        .await;
    // Page 4 must never be requested with max_pages = 3
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["j-4"], Some(5), 10)),
        )
        .expect(0)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["j-1"], Some(2), 10)),
        )
        .mount(&mock_server)
        .await;

    mount_detail_pages(&mock_server, &["j-1", "j-2", "j-3"]).await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 1, 3);

    let factory = build_factory(&config.driver).expect("factory");
    let summary = Coordinator::new(config, factory)
        .run()
        .await
        .expect("harvest failed");

    // Next affordance was available on every page; the cap alone stops the walk
    assert_eq!(summary.pages_visited, 3);
    assert_eq!(summary.completed, 3);
    assert_eq!(summary.stored, 3);
}

#[tokio::test]
async fn test_transient_detail_failures_are_retried() {
    let mock_server = MockServer::start().await;
    let ids = ["j-flaky"];

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&ids, None, 1)))
        .mount(&mock_server)
        .await;

    // First two detail fetches fail, the third succeeds
    Mock::given(method("GET"))
        .and(path("/jobs/j-flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs/j-flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("j-flaky")))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 1, 0);

    let factory = build_factory(&config.driver).expect("factory");
    let summary = Coordinator::new(config, factory)
        .run()
        .await
        .expect("harvest failed");

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.stored, 1);
}

#[tokio::test]
async fn test_permanently_failing_detail_is_bounded() {
    let mock_server = MockServer::start().await;
    let ids = ["j-ok", "j-dead"];

    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&ids, None, 1)))
        .mount(&mock_server)
        .await;
    mount_detail_pages(&mock_server, &["j-ok"]).await;

    // j-dead always fails; with retry_attempts = 3 it must be fetched
    // exactly three times and then parked in the failed partition
    Mock::given(method("GET"))
        .and(path("/jobs/j-dead"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 1, 0);

    let factory = build_factory(&config.driver).expect("factory");
    let summary = Coordinator::new(config, factory)
        .run()
        .await
        .expect("harvest failed");

    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.stored, 1);

    let catalog = read_catalog(&catalog_path);
    assert_eq!(catalog.records.len(), 1);
    assert_eq!(catalog.records[0].id, "j-ok");
}

#[tokio::test]
async fn test_listing_abort_preserves_queued_work() {
    let mock_server = MockServer::start().await;

    // Page 1 works and points at page 2; page 2 always errors, so the walk
    // aborts after its retry budget while page 1's candidates survive
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(listing_page(&["j-1", "j-2"], Some(2), 10)),
        )
        .mount(&mock_server)
        .await;
    mount_detail_pages(&mock_server, &["j-1", "j-2"]).await;

    let dir = TempDir::new().unwrap();
    let catalog_path = dir.path().join("catalog.json");
    let config = create_test_config(&mock_server.uri(), catalog_path.to_str().unwrap(), 2, 0);

    let factory = build_factory(&config.driver).expect("factory");
    let summary = Coordinator::new(config, factory)
        .run()
        .await
        .expect("harvest failed");

    assert!(summary.listing_aborted.is_some());
    assert_eq!(summary.pages_visited, 1);
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.stored, 2);
}
