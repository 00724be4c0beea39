//! End-to-end runs of the digest pipeline against mock servers

use chrono::NaiveDate;
use scipan::config::{Config, Overrides};
use scipan::run;
use serde_json::json;
use std::num::NonZeroUsize;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title>Only Paper</title>
    <summary>One. Two. Three. Four.</summary>
    <author><name>Marie Curie</name></author>
    <link href="http://arxiv.org/abs/2410.00009v1" rel="alternate"/>
  </entry>
</feed>"#;

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 10, 7).unwrap()
}

fn config_for(arxiv: &MockServer, output_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.arxiv.base_url = format!("{}/api/query", arxiv.uri());
    config.apply_overrides(&Overrides {
        topic: Some("diamond".to_string()),
        max_results: NonZeroUsize::new(3),
        output_dir: Some(output_dir.to_path_buf()),
    });
    config
}

/// Test that a run creates the directory and writes the dated digest
#[tokio::test]
async fn test_run_writes_dated_digest() {
    let arxiv_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/query"))
        .and(query_param("search_query", "all:diamond"))
        .and(query_param("max_results", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .expect(1)
        .mount(&arxiv_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("nested").join("digests");
    let config = config_for(&arxiv_server, &out);

    let report = run::run(&config, date()).await.unwrap();

    assert_eq!(report.path, out.join("digest_2024-10-07.md"));
    assert_eq!(report.digest.papers, 1);
    // No key configured
    assert_eq!(report.digest.fallbacks, 1);

    let written = std::fs::read_to_string(&report.path).unwrap();
    assert_eq!(written, report.digest.markdown);
    assert!(written.starts_with("# Weekly Digest: diamond (2024-10-07)\n"));
    assert!(written.contains("### 1. Only Paper"));
    assert!(written.contains("**Summary:** One. Two. Three.\n"));
}

/// Test that a failed fetch still produces a title-only digest file
#[tokio::test]
async fn test_run_with_failed_fetch_still_writes() {
    let arxiv_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&arxiv_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("digests");
    let config = config_for(&arxiv_server, &out);

    let report = run::run(&config, date()).await.unwrap();

    assert!(out.is_dir());
    assert_eq!(
        std::fs::read_to_string(report.path).unwrap(),
        "# Weekly Digest: diamond (2024-10-07)\n"
    );
}

/// Test that a keyed run uses the completion API per paper
#[tokio::test]
async fn test_run_with_api_key() {
    let arxiv_server = MockServer::start().await;
    let llm_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/query"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED))
        .mount(&arxiv_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"choices": [{"message": {"content": "Short."}}]})),
        )
        .expect(1)
        .mount(&llm_server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let mut config = config_for(&arxiv_server, tmp.path());
    config.llm.url = format!("{}/v1/chat/completions", llm_server.uri());
    config.api.openrouter_key = Some("sk-test".to_string());

    let report = run::run(&config, date()).await.unwrap();

    assert_eq!(report.digest.fallbacks, 0);
    assert!(report.digest.markdown.contains("**Summary:** Short.\n"));
}

/// Test that an unwritable output location is the one reported error
#[tokio::test]
async fn test_run_fails_only_on_local_io() {
    let arxiv_server = MockServer::start().await;

    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("taken");
    std::fs::write(&blocker, "file, not a directory").unwrap();
    let config = config_for(&arxiv_server, &blocker);

    assert!(run::run(&config, date()).await.is_err());
}
