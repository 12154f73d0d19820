//! HTTP-level tests against a local mock server.

use mockito::{Matcher, Server, ServerGuard};
use puzzlescrape::config::{Config, FetchConfig};
use puzzlescrape::fetch::{Fetcher, PageSource, Provenance};
use puzzlescrape::output::PuzzleDocument;
use puzzlescrape::pipeline::{Pipeline, RunOptions, ScanMode};

/// Wraps markup in a page long enough to pass the blocked-page check.
fn padded_page(body: &str) -> String {
    format!(
        "<html><head><title>Walkthrough</title></head><body>{}<!-- {} --></body></html>",
        body,
        "x".repeat(4500)
    )
}

fn fetcher_for(server: &ServerGuard) -> Fetcher {
    Fetcher::new(FetchConfig {
        proxy_prefix: format!("{}/proxy/", server.url()),
        timeout_sec: 5,
        ..FetchConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_direct_fetch_accepted() {
    let mut server = Server::new_async().await;
    let page = server
        .mock("GET", "/puzzle001.html")
        .with_status(200)
        .with_body(padded_page("<h3>Puzzle 001</h3>"))
        .create_async()
        .await;
    let proxy = server
        .mock("GET", Matcher::Regex("^/proxy/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let result = fetcher
        .fetch(&format!("{}/puzzle001.html", server.url()))
        .await;

    assert_eq!(result.provenance, Provenance::Direct);
    assert_eq!(result.status, 200);
    assert!(result.is_success());
    page.assert_async().await;
    proxy.assert_async().await;
}

#[tokio::test]
async fn test_unusual_traffic_uses_proxy() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/puzzle002.html")
        .with_status(200)
        .with_body(padded_page(
            "<p>Our systems have detected unusual traffic from your network.</p>",
        ))
        .create_async()
        .await;
    let proxy = server
        .mock("GET", Matcher::Regex("^/proxy/http".to_string()))
        .with_status(200)
        .with_body("proxied content")
        .create_async()
        .await;

    let fetcher = fetcher_for(&server);
    let result = fetcher
        .fetch(&format!("{}/puzzle002.html", server.url()))
        .await;

    assert_eq!(result.provenance, Provenance::Proxy);
    assert_eq!(result.body, "proxied content");
    proxy.assert_async().await;
}

#[tokio::test]
async fn test_short_body_uses_proxy() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/puzzle003.html")
        .with_status(200)
        .with_body("<html><body>tiny</body></html>")
        .create_async()
        .await;
    let proxy = server
        .mock("GET", Matcher::Regex("^/proxy/".to_string()))
        .with_status(200)
        .with_body("from proxy")
        .create_async()
        .await;

    let result = fetcher_for(&server)
        .fetch(&format!("{}/puzzle003.html", server.url()))
        .await;

    assert_eq!(result.provenance, Provenance::Proxy);
    proxy.assert_async().await;
}

#[tokio::test]
async fn test_error_status_uses_proxy_and_keeps_its_status() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/puzzle004.html")
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("GET", Matcher::Regex("^/proxy/".to_string()))
        .with_status(404)
        .with_body("missing")
        .create_async()
        .await;

    let result = fetcher_for(&server)
        .fetch(&format!("{}/puzzle004.html", server.url()))
        .await;

    assert_eq!(result.provenance, Provenance::Proxy);
    assert_eq!(result.status, 404);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_proxy_transport_failure_is_reported_not_raised() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/puzzle005.html")
        .with_status(404)
        .create_async()
        .await;

    // Nothing listens on port 1.
    let fetcher = Fetcher::new(FetchConfig {
        proxy_prefix: "http://127.0.0.1:1/".to_string(),
        timeout_sec: 5,
        ..FetchConfig::default()
    })
    .unwrap();
    let result = fetcher
        .fetch(&format!("{}/puzzle005.html", server.url()))
        .await;

    assert_eq!(result.provenance, Provenance::Error);
    assert_eq!(result.status, 0);
    assert!(!result.body.is_empty());
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_discovery_run_end_to_end() {
    let mut server = Server::new_async().await;
    let base = server.url();
    let cdn = "https://blogger.googleusercontent.com/img/b";

    server
        .mock("GET", "/")
        .with_status(200)
        .with_body(padded_page(&format!(
            r#"<a href="{base}/2024/01/puzzle002.html">Two</a>
               <a href="https://elsewhere.example.org/puzzle001.html">Off site</a>
               <a href="{base}/2024/01/puzzle001.html">One</a>
               <a href="{base}/p/about.html">About</a>"#
        )))
        .create_async()
        .await;
    server
        .mock("GET", "/2024/01/puzzle001.html")
        .with_status(200)
        .with_body(padded_page(&format!(
            r#"<h3 class="post-title">Puzzle 001 - First Steps</h3>
               <div class="post-body entry-content">
                 <p>Puzzle 001</p><img src="{cdn}/p1.png">
                 <p>Hint 1</p><img src="{cdn}/h1.png">
                 <h4>Solution</h4><p>Turn left twice.</p>
                 <img src="{cdn}/s1.png"><img src="{cdn}/s2.png"><img src="{cdn}/s3.png">
                 <p>Progress</p><p>You earned 10 picarats.</p>
               </div>"#
        )))
        .create_async()
        .await;
    server
        .mock("GET", "/2024/01/puzzle002.html")
        .with_status(200)
        .with_body(padded_page(
            r#"<h3 class="post-title">Puzzle 002 - Second</h3>
               <div class="post-body entry-content"><p>Solution</p><p>Count again.</p></div>"#,
        ))
        .create_async()
        .await;
    let offsite_proxy = server
        .mock("GET", Matcher::Regex("^/proxy/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let mut config = Config::default();
    config.site.domain = base.trim_start_matches("http://").to_string();
    config.fetch.proxy_prefix = format!("{}/proxy/", base);
    config.fetch.timeout_sec = 5;
    config.scraping.delay_between_requests_sec = 0.0;
    config.scraping.seed_delay_sec = 0.0;

    let fetcher = Fetcher::new(config.fetch.clone()).unwrap();
    let options = RunOptions {
        mode: ScanMode::Discover,
        max_records: None,
    };
    let records = Pipeline::new(&fetcher, &config)
        .run(&[format!("{}/", base)], &options)
        .await;

    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first.id, 1);
    assert_eq!(first.title, "Puzzle 001 - First Steps");
    assert_eq!(first.solution_text, "Turn left twice.");
    assert_eq!(first.reward_text, "You earned 10 picarats.");
    assert_eq!(first.images.puzzle, vec![format!("{}/p1.png", cdn)]);
    assert_eq!(first.images.hint1, vec![format!("{}/h1.png", cdn)]);
    assert_eq!(first.images.solution.len(), 2);
    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].solution_text, "Count again.");
    offsite_proxy.assert_async().await;

    let doc = PuzzleDocument::new(&config.site.source_label, records);
    assert_eq!(doc.count, 2);
}
