//! End-to-end tests for the mirroring crawler
//!
//! These tests use wiremock to serve small fixture sites and drive full
//! runs into temporary output directories.

use kagami::config::Options;
use kagami::crawler::run_mirror;
use kagami::KagamiError;
use std::collections::HashSet;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_html(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_raw(server: &MockServer, route: &str, bytes: &[u8], content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(bytes.to_vec(), content_type))
        .mount(server)
        .await;
}

fn options(server: &MockServer, out: &Path) -> Options {
    Options::new(
        &format!("{}/", server.uri()),
        Some(out.to_path_buf()),
        0.0,
        false,
        false,
        false,
    )
    .expect("options")
}

fn manifest_lines(out: &Path) -> Vec<String> {
    std::fs::read_to_string(out.join("all_urls.txt"))
        .expect("manifest readable")
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_mirror_rewrites_links_and_writes_manifest() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_html(
        &server,
        "/",
        &format!(
            r#"<html><head><title>Home</title>
            <link rel="stylesheet" href="/css/site.css"></head>
            <body>
            <a href="{}/page1">One</a>
            <a href="page2">Two</a>
            <a href="https://external.example/x">Elsewhere</a>
            <img src="/img/logo.png">
            </body></html>"#,
            base
        ),
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><head><title>One</title></head><body>
        <a href="/">Home</a>
        <a href="/page1">Self</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/page2",
        r#"<html><head><title>Two</title></head><body>Done.</body></html>"#,
    )
    .await;
    mount_raw(&server, "/css/site.css", b"body { margin: 0; }", "text/css").await;
    mount_raw(&server, "/img/logo.png", b"\x89PNG-bytes", "image/png").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let stats = run_mirror(options(&server, &out)).await.expect("crawl ok");

    assert_eq!(stats.pages_downloaded, 3);
    assert_eq!(stats.resources_downloaded, 2);
    assert_eq!(stats.pages_failed, 0);

    // pages land on their mirrored paths
    let index = std::fs::read_to_string(out.join("index.html")).unwrap();
    assert!(out.join("page1.html").exists());
    assert!(out.join("page2.html").exists());

    // internal references are relative local paths now
    assert!(index.contains(r#"href="page1.html""#));
    assert!(index.contains(r#"href="page2.html""#));
    assert!(index.contains(r#"href="css/site.css""#));
    assert!(index.contains(r#"src="img/logo.png""#));

    // external links are left untouched
    assert!(index.contains(r#"href="https://external.example/x""#));

    // a page deeper in the tree links back up correctly
    let page1 = std::fs::read_to_string(out.join("page1.html")).unwrap();
    assert!(page1.contains(r#"href="index.html""#));

    // resources are materialized with their original bytes
    assert_eq!(
        std::fs::read(out.join("css/site.css")).unwrap(),
        b"body { margin: 0; }"
    );
    assert_eq!(
        std::fs::read(out.join("img/logo.png")).unwrap(),
        b"\x89PNG-bytes"
    );

    // manifest: entry first, everything discovered exactly once
    let lines = manifest_lines(&out);
    assert_eq!(lines[0], format!("{}/", base));
    assert!(lines.contains(&"https://external.example/x".to_string()));
    assert!(lines.contains(&format!("{}/css/site.css", base)));
    assert!(lines.contains(&format!("{}/img/logo.png", base)));

    let unique: HashSet<&String> = lines.iter().collect();
    assert_eq!(unique.len(), lines.len(), "manifest has duplicates");
    assert_eq!(stats.urls_discovered, lines.len());
}

#[tokio::test]
async fn test_page_only_mode_fetches_seed_and_resources_only() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title>
        <link rel="stylesheet" href="/site.css"></head>
        <body>
        <a href="/page1">One</a>
        <a href="/page2">Two</a>
        <img src="/logo.png">
        </body></html>"#,
    )
    .await;
    mount_raw(&server, "/site.css", b"css", "text/css").await;
    mount_raw(&server, "/logo.png", b"png", "image/png").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let mut opts = options(&server, &out);
    opts.page_only = true;

    let stats = run_mirror(opts).await.expect("crawl ok");

    // exactly one page: the seed
    assert_eq!(stats.pages_downloaded, 1);
    assert!(out.join("index.html").exists());
    assert!(!out.join("page1.html").exists());
    assert!(!out.join("page2.html").exists());

    // the seed page's resources are still fetched
    assert_eq!(stats.resources_downloaded, 2);
    assert!(out.join("site.css").exists());
    assert!(out.join("logo.png").exists());

    // discovered links still make it into the manifest
    let lines = manifest_lines(&out);
    assert!(lines.iter().any(|l| l.ends_with("/page1")));
    assert!(lines.iter().any(|l| l.ends_with("/page2")));
}

#[tokio::test]
async fn test_english_only_skips_locale_urls() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/de/seite">German</a>
        <a href="/docs/api">API docs</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/docs/api",
        r#"<html><head><title>API</title></head><body>reference</body></html>"#,
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let mut opts = options(&server, &out);
    opts.english_only = true;

    let stats = run_mirror(opts).await.expect("crawl ok");

    // the locale URL was never fetched and never materialized
    assert_eq!(stats.pages_skipped_language, 1);
    assert!(!out.join("de").exists());

    // the ambiguous URL was processed normally (fail open)
    assert!(out.join("docs/api.html").exists());
    assert_eq!(stats.pages_downloaded, 2);

    // skipped URLs still appear in the manifest
    let lines = manifest_lines(&out);
    assert!(lines.iter().any(|l| l.ends_with("/de/seite")));
}

#[tokio::test]
async fn test_markdown_mode_two_page_site() {
    let server = MockServer::start().await;
    let base = server.uri();
    let host = url::Url::parse(&base).unwrap().host_str().unwrap().to_string();

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Page A</title></head><body><main>
        <h1>Welcome</h1>
        <p>Go to <a href="/b">Page B</a>.</p>
        <img src="/img/pic.png" alt="Pic">
        </main></body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/b",
        r#"<html><head><title>Page B</title></head><body><p>Content of B.</p></body></html>"#,
    )
    .await;
    mount_raw(&server, "/img/pic.png", b"png-data", "image/png").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("export");

    let mut opts = options(&server, &out);
    opts.markdown = true;

    let stats = run_mirror(opts).await.expect("crawl ok");

    assert_eq!(stats.pages_downloaded, 2);
    assert_eq!(stats.images_downloaded, 1);

    // one document named after the host, plus the shared image folder
    let document = std::fs::read_to_string(out.join(format!("{}.md", host))).unwrap();
    assert_eq!(std::fs::read(out.join("images/pic.png")).unwrap(), b"png-data");

    // table of contents lists A then B, in visit order, before the sections
    let toc_a = document.find("1. [Page A](#page-a)").expect("toc entry A");
    let toc_b = document.find("2. [Page B](#page-b)").expect("toc entry B");
    let section_a = document.find("# Page A").expect("section A");
    let section_b = document.find("# Page B").expect("section B");
    assert!(toc_a < toc_b);
    assert!(toc_b < section_a);
    assert!(section_a < section_b);

    // A's image reference points into the shared folder
    assert!(document.contains("![Pic](images/pic.png)"));

    // sections carry their source annotation
    assert!(document.contains(&format!("*Source: [{base}/]({base}/)*")));
    assert!(document.contains(&format!("*Source: [{base}/b]({base}/b)*")));

    // no mirrored page tree in markdown mode
    assert!(!out.join("b.html").exists());
}

#[tokio::test]
async fn test_fetch_failure_is_skipped_and_crawl_continues() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <a href="/missing">Broken</a>
        <a href="/page1">Fine</a>
        </body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><head><title>One</title></head><body>ok</body></html>"#,
    )
    .await;
    // /missing has no mock: the server answers 404

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let stats = run_mirror(options(&server, &out)).await.expect("crawl ok");

    assert_eq!(stats.pages_downloaded, 2);
    assert_eq!(stats.pages_failed, 1);
    assert!(out.join("page1.html").exists());
    assert!(!out.join("missing.html").exists());

    // the failed URL is still part of the record
    let lines = manifest_lines(&out);
    assert!(lines.iter().any(|l| l.ends_with("/missing")));
}

#[tokio::test]
async fn test_unreachable_entry_page_is_fatal() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let result = run_mirror(options(&server, &out)).await;
    assert!(matches!(
        result,
        Err(KagamiError::EntryUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_non_html_entry_page_is_fatal() {
    let server = MockServer::start().await;
    mount_raw(&server, "/", b"%PDF-1.4", "application/pdf").await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let result = run_mirror(options(&server, &out)).await;
    assert!(matches!(
        result,
        Err(KagamiError::EntryUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_shared_resource_fetched_once() {
    let server = MockServer::start().await;

    mount_html(
        &server,
        "/",
        r#"<html><head><title>Home</title>
        <link rel="stylesheet" href="/shared.css"></head>
        <body><a href="/page1">One</a></body></html>"#,
    )
    .await;
    mount_html(
        &server,
        "/page1",
        r#"<html><head><title>One</title>
        <link rel="stylesheet" href="/shared.css"></head>
        <body>ok</body></html>"#,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/shared.css"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"css".to_vec(), "text/css"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mirror");

    let stats = run_mirror(options(&server, &out)).await.expect("crawl ok");

    assert_eq!(stats.resources_downloaded, 1);

    // both pages reference the same local file
    let index = std::fs::read_to_string(out.join("index.html")).unwrap();
    let page1 = std::fs::read_to_string(out.join("page1.html")).unwrap();
    assert!(index.contains(r#"href="shared.css""#));
    assert!(page1.contains(r#"href="shared.css""#));

    // wiremock verifies the expect(1) when the server drops
}
