use std::fs;

use httpmock::prelude::*;
use regex::Regex;
use tempfile::tempdir;
use unmap_core::download_manager::{read_url_list, save_downloads, DownloadResult};
use unmap_core::url_utils::{derive_map_urls, filename_from_url, filter_urls};
use unmap_core::{run_downloader, DownloadError, DownloadOptions, FetchError, MapUrlMode, MemoryReporter, Severity};

#[test]
fn filter_trims_dedups_and_matches_anywhere() {
    let lines = [
        "  https://example.com/static/js/main.js  ",
        "",
        "https://cdn.other.net/lib.js",
        "https://example.com/static/js/main.js",
        "   ",
        "https://example.com/static/css/app.css",
    ];
    let filter = Regex::new("example\\.com").unwrap();
    assert_eq!(
        filter_urls(lines, &filter),
        vec!["https://example.com/static/js/main.js", "https://example.com/static/css/app.css"]
    );

    let everything = Regex::new("").unwrap();
    assert_eq!(filter_urls(lines, &everything).len(), 3);
}

#[test]
fn map_urls_per_mode() {
    let urls = || vec!["https://a.com/x.js".to_string(), "https://a.com/y.css".to_string()];

    assert_eq!(derive_map_urls(urls(), MapUrlMode::Map), urls());
    assert_eq!(
        derive_map_urls(urls(), MapUrlMode::Js),
        vec!["https://a.com/x.js.map", "https://a.com/y.css.map"]
    );
    assert_eq!(derive_map_urls(urls(), MapUrlMode::Auto), vec!["https://a.com/x.js.map"]);
}

#[tokio::test]
async fn missing_url_list() {
    let dir = tempdir().unwrap();
    let err = read_url_list(dir.path().join("urls.txt")).await.unwrap_err();
    assert!(matches!(err, DownloadError::InputNotFound(_)));
}

#[tokio::test]
async fn invalid_filter_is_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("urls.txt"), "https://a.com/x.js\n").unwrap();
    let options = DownloadOptions {
        input: dir.path().join("urls.txt"),
        filter: "(".to_string(),
        output: dir.path().join("maps"),
        ..Default::default()
    };
    let err = run_downloader(&options, &MemoryReporter::new()).await.unwrap_err();
    assert!(matches!(err, DownloadError::InvalidFilter(_)));
}

#[tokio::test]
async fn save_skips_failures_and_nameless_urls() {
    let dir = tempdir().unwrap();
    let results = vec![
        DownloadResult {
            url: "https://a.com/static/main.js.map".to_string(),
            body: Ok("{\"version\":3}".to_string()),
        },
        DownloadResult {
            url: "https://a.com/static/".to_string(),
            body: Ok("{}".to_string()),
        },
        DownloadResult {
            url: "https://a.com/broken.js.map".to_string(),
            body: Err(FetchError::NotSourceMap("https://a.com/broken.js.map".to_string())),
        },
    ];
    let reporter = MemoryReporter::new();

    let summary = save_downloads(&results, &dir.path().join("maps"), &reporter).await.unwrap();

    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("maps/main.js.map")).unwrap(),
        "{\"version\":3}"
    );
    assert_eq!(reporter.messages(Severity::Error).len(), 2);
    assert_eq!(fs::read_dir(dir.path().join("maps")).unwrap().count(), 1);
}

#[tokio::test]
async fn end_to_end_auto_mode() {
    let server = MockServer::start_async().await;
    let main_map = server.mock(|when, then| {
        when.method(GET).path("/static/main.js.map");
        then.status(200).body("{\"version\":3,\"sources\":[]}");
    });
    let other_map = server.mock(|when, then| {
        when.method(GET).path("/static/other.js.map");
        then.status(200).body("<!doctype html>");
    });

    let dir = tempdir().unwrap();
    let list = format!(
        "{}\n{}\n{}\n{}\n",
        server.url("/static/main.js"),
        server.url("/static/main.js"),
        server.url("/static/other.js"),
        server.url("/static/app.css"),
    );
    fs::write(dir.path().join("urls.txt"), list).unwrap();

    let options = DownloadOptions {
        input: dir.path().join("urls.txt"),
        output: dir.path().join("maps"),
        concurrency: 2,
        ..Default::default()
    };
    let summary = run_downloader(&options, &MemoryReporter::new()).await.unwrap();

    main_map.assert_hits(1);
    other_map.assert_hits(1);
    assert_eq!(summary.saved, 1);
    assert_eq!(summary.failed, 1);
    assert!(dir.path().join("maps/main.js.map").is_file());
    assert!(!dir.path().join("maps/other.js.map").exists());
}

#[test]
fn default_options_match_cli_defaults() {
    let options = DownloadOptions::default();
    assert_eq!(options.mode, MapUrlMode::Auto);
    assert_eq!(options.filter, "");
    assert_eq!(options.concurrency, 8);
    assert_eq!(options.output.to_str(), Some("maps_files"));
}

#[test]
fn url_type_parses_and_displays() {
    assert_eq!("js".parse::<MapUrlMode>(), Ok(MapUrlMode::Js));
    assert_eq!("auto".parse::<MapUrlMode>(), Ok(MapUrlMode::Auto));
    assert!("css".parse::<MapUrlMode>().is_err());
    assert_eq!(MapUrlMode::Map.to_string(), "map");
}

#[test]
fn file_name_is_the_last_path_segment() {
    assert_eq!(
        filename_from_url("https://cdn.example.com/static/js/main.js.map?v=2").as_deref(),
        Some("main.js.map")
    );
    assert_eq!(filename_from_url("https://example.com/static/"), None);
    assert_eq!(filename_from_url("not a url"), None);
}
