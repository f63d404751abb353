//! Integration tests for the crawler
//!
//! These tests use wiremock to serve a small site and run complete audits
//! against it, checking the records that come out the other end.

use site_auditor::config::{parse_config, Config, OutputFormat};
use site_auditor::output::{write_outputs, CrawlSummary};
use site_auditor::run_audit;
use site_auditor::store::{ErrorKind, PageType};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server's `/en/`
fn create_test_config(server: &MockServer) -> Config {
    parse_config(&format!(
        r#"
        [crawler]
        seed-url = "{}/en/"
        max-depth = 3
        max-pages = 50
        concurrency = 4
        request-delay-ms = 0
        request-timeout-secs = 5
        "#,
        server.uri()
    ))
    .expect("test config should parse")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_audit_single_language_section() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/en/",
        r#"<h1>Home</h1>
           <a href="/en/about/history">About</a>
           <a href="/en/news/open-day">News</a>
           <a href="/ru/about">Russian</a>
           <a href="https://other.example.org/en/">Elsewhere</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/en/about/history",
        r#"<h1>History</h1><p>Founded long ago.</p><a href="/en/">Home</a>"#,
    )
    .await;
    mount_page(
        &server,
        "/en/news/open-day",
        r#"<h1>Open day</h1><p>Come visit.</p><a href="/en/about/history">About</a>"#,
    )
    .await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.inventory.len(), 3);
    let seed = format!("{}/en/", server.uri());
    let home = records.inventory.iter().find(|e| e.url == seed).unwrap();
    assert_eq!(home.depth, 0);
    assert_eq!(home.page_type, PageType::Home);

    for entry in records.inventory.iter().filter(|e| e.url != seed) {
        assert_eq!(entry.depth, 1, "{} should be one level down", entry.url);
        assert_eq!(entry.discovered_from, seed);
    }

    // /ru/about and the foreign host, once each
    assert_eq!(records.skipped_out_of_scope, 2);
    assert_eq!(records.seo.len(), 3);
    assert!(records.errors.is_empty());
}

#[tokio::test]
async fn test_redirect_is_recorded_and_followed() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/old">Old</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/en/about/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/en/about/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/en/about/new", "<h1>New</h1>").await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.redirects.len(), 1);
    let redirect = &records.redirects[0];
    assert_eq!(redirect.from, format!("{}/en/about/old", server.uri()));
    assert_eq!(redirect.to, format!("{}/en/about/new", server.uri()));
    assert_eq!(redirect.http_status, 301);
    assert_eq!(redirect.via, "header");

    let target = records
        .inventory
        .iter()
        .find(|e| e.url.ends_with("/en/about/new"))
        .unwrap();
    assert_eq!(target.depth, 2);
    assert_eq!(
        target.redirected_from.as_deref(),
        Some(redirect.from.as_str())
    );
    assert!(records.errors.is_empty());
}

#[tokio::test]
async fn test_seed_redirect_produces_one_redirect_and_one_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/en/"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/en/about/home"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/en/about/home", "<h1>Welcome</h1>").await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.redirects.len(), 1);
    assert_eq!(records.redirects[0].from, format!("{}/en/", server.uri()));
    assert_eq!(records.redirects[0].http_status, 301);

    assert_eq!(records.inventory.len(), 1);
    assert_eq!(
        records.inventory[0].url,
        format!("{}/en/about/home", server.uri())
    );
    assert_eq!(records.inventory[0].depth, 1);
}

#[tokio::test]
async fn test_duplicate_content_recorded_once() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/en/",
        r#"<a href="/en/about/a">A</a><a href="/en/about/b">B</a>"#,
    )
    .await;
    mount_page(&server, "/en/about/a", "<h1>Same body</h1>").await;
    mount_page(&server, "/en/about/b", "<h1>Same body</h1>").await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.inventory.len(), 3);
    let duplicates: Vec<_> = records.inventory.iter().filter(|e| e.is_duplicate()).collect();
    assert_eq!(duplicates.len(), 1);

    let duplicate = duplicates[0];
    let original = duplicate.duplicate_of.as_deref().unwrap();
    assert_ne!(original, duplicate.url);
    assert!(original.ends_with("/en/about/a") || original.ends_with("/en/about/b"));

    // extractors only ran for the two distinct bodies
    assert_eq!(records.seo.len(), 2);
}

#[tokio::test]
async fn test_same_text_in_different_encodings_is_not_duplicate() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/en/",
        r#"<a href="/en/about/latin">Latin-1</a><a href="/en/about/utf8">UTF-8</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/en/about/latin"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><p>caf\xe9</p></body></html>".to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/en/about/utf8", "<p>café</p>").await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.inventory.len(), 3);
    assert!(records.inventory.iter().all(|e| !e.is_duplicate()));
    assert!(records.errors.is_empty());
}

#[tokio::test]
async fn test_http_error_becomes_error_entry() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/missing">Missing</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/en/about/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.inventory.len(), 1);
    assert_eq!(records.errors.len(), 1);
    let error = &records.errors[0];
    assert_eq!(error.kind, ErrorKind::HttpStatus);
    assert_eq!(error.status, Some(404));
    assert_eq!(error.url, format!("{}/en/about/missing", server.uri()));
    assert_eq!(error.referrer, format!("{}/en/", server.uri()));
}

#[tokio::test]
async fn test_timeout_becomes_error_entry() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/slow">Slow</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/en/about/slow"))
        .respond_with(html("late").set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.crawler.request_timeout_secs = 1;
    let records = run_audit(config).await.unwrap();

    assert_eq!(records.inventory.len(), 1);
    assert_eq!(records.errors.len(), 1);
    assert_eq!(records.errors[0].kind, ErrorKind::Timeout);
    assert_eq!(records.errors[0].status, None);
}

#[tokio::test]
async fn test_page_budget_respected() {
    let server = MockServer::start().await;

    let links: String = (0..5)
        .map(|i| format!(r#"<a href="/en/about/p{}">P{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/en/", &links).await;
    for i in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/en/about/p{}", i)))
            .respond_with(html(&format!("<h1>Page {}</h1>", i)))
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(&server);
    config.crawler.max_pages = 2;
    let records = run_audit(config).await.unwrap();

    assert_eq!(records.inventory.len(), 2);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_depth_ceiling_stops_traversal() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/a">A</a>"#).await;
    mount_page(&server, "/en/about/a", r#"<a href="/en/about/b">B</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/en/about/b"))
        .respond_with(html("too deep"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server);
    config.crawler.max_depth = 1;
    let records = run_audit(config).await.unwrap();

    assert_eq!(records.inventory.len(), 2);
    assert!(records.inventory.iter().all(|e| e.depth <= 1));
}

#[tokio::test]
async fn test_non_html_is_skipped_without_error() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/data.json">Data</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/en/about/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}", "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.inventory.len(), 1);
    assert!(records.errors.is_empty());
}

#[tokio::test]
async fn test_extractors_run_on_fetched_pages() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/en/",
        r#"<title>Campus</title>
           <script>gtag('config', 'G-ABC123');</script>
           <form name="contact" method="post" action="/en/contacts/send">
             <input name="email" type="email" required>
             <textarea name="message"></textarea>
           </form>
           <img src="/img/campus.jpg" alt="Campus">"#,
    )
    .await;

    let records = run_audit(create_test_config(&server)).await.unwrap();

    assert_eq!(records.seo.len(), 1);
    assert_eq!(records.seo[0].title, "Campus");

    assert_eq!(records.forms.len(), 1);
    assert_eq!(records.forms[0].method, "POST");
    assert_eq!(records.forms[0].fields_count, 2);

    assert!(records
        .integrations
        .iter()
        .any(|i| i.tool == "GA4" && i.id == "G-ABC123"));

    assert_eq!(records.media.len(), 1);
    assert_eq!(records.media[0].url, format!("{}/img/campus.jpg", server.uri()));
}

#[tokio::test]
async fn test_records_flushed_to_jsonl_and_sqlite() {
    let server = MockServer::start().await;

    mount_page(&server, "/en/", r#"<a href="/en/about/a">A</a>"#).await;
    mount_page(&server, "/en/about/a", "<h1>A</h1>").await;

    let temp = tempfile::TempDir::new().unwrap();
    let mut config = create_test_config(&server);
    config.output.directory = temp.path().to_string_lossy().to_string();

    let records = run_audit(config.clone()).await.unwrap();
    let now = chrono::Utc::now();
    let summary = CrawlSummary::from_records(&records, config.crawler.seed_url.clone(), "", now, now);
    assert_eq!(
        summary.to_string(),
        "DONE pages=2 articles=0 listings=0 static=1 forms=0 media=0 redirects=0 errors=0 apis=0"
    );

    let summary_path = write_outputs(&config.output, &records, &summary).unwrap();
    assert!(summary_path.exists());

    let urls = std::fs::read_to_string(temp.path().join("urls.jsonl")).unwrap();
    assert_eq!(urls.lines().count(), 2);

    config.output.format = OutputFormat::Sqlite;
    write_outputs(&config.output, &records, &summary).unwrap();
    let conn = rusqlite::Connection::open(temp.path().join("audit.db")).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM inventory", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 2);
}
