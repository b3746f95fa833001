// tests/json_store.rs
//
// The wired App with an on-disk store: ingest writes one JSON file per
// domain, and a fresh App over the same directory serves those documents.

mod common;

use std::sync::Arc;

use serde_json::Value as Json;

use common::*;
use market_bites::config::AppConfig;
use market_bites::model::{RawItem, SocialMeta};
use market_bites::store::{DocumentStore, JsonFileStore};
use market_bites::App;

fn post(key: &str, subreddit: &str, score: i64) -> RawItem {
    RawItem {
        natural_key: key.into(),
        title: format!("Thoughts on {key}"),
        body: "I bought more index funds this month. Fees are low and returns are steady.".into(),
        link: format!("https://www.reddit.com/r/{subreddit}/comments/{key}"),
        published_at: Some(t0()),
        source: "someone".into(),
        social: Some(SocialMeta {
            subreddit: subreddit.into(),
            score,
            num_comments: 2,
        }),
    }
}

fn config(dir: &std::path::Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.store.dir = Some(dir.to_path_buf());
    cfg.ingest.social_posts_per_channel = 1;
    cfg
}

#[tokio::test]
async fn ingested_documents_persist_per_domain_and_reload() {
    let tmp = tempfile::tempdir().unwrap();

    let news = Arc::new(StubProvider::with_keys(&["https://news.example/a"]));
    let social = Arc::new(StubProvider::with_items(vec![post("p1", "Bogleheads", 120)]));

    let app = App::build(config(tmp.path()), news, social).await.unwrap();
    let report = app.ingest.refresh_cycle().await;
    assert_eq!(report.news.stored, 1);
    // The stub ignores the channel, so each of the 7 fetches returns p1.
    assert_eq!(report.social.drained, 7);
    assert_eq!(report.social.stored, 7);

    // One document per natural key on disk, rendered in the wire format.
    let raw = std::fs::read_to_string(tmp.path().join("social.json")).unwrap();
    let on_disk: Json = serde_json::from_str(&raw).unwrap();
    let arr = on_disk.as_array().unwrap();
    assert_eq!(arr.len(), 1);
    assert_eq!(arr[0]["id"], "p1");
    assert_eq!(arr[0]["subreddit"], "Bogleheads");
    assert!(tmp.path().join("news.json").exists());

    // A second App over the same directory, with a dead provider, still
    // serves the stored post through the fallback.
    let app2 = App::build(
        config(tmp.path()),
        Arc::new(StubProvider::failing()),
        Arc::new(StubProvider::failing()),
    )
    .await
    .unwrap();
    let docs = app2.retriever.search_social("bogleheads").await.unwrap();
    assert_eq!(keys(&docs), vec!["p1"]);

    let reopened = JsonFileStore::open(tmp.path().join("news.json")).await.unwrap();
    let found = reopened
        .get_by_keys(&["https://news.example/a".to_string()].into_iter().collect())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn corrupt_store_file_fails_startup() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("news.json"), "{ not json").unwrap();

    let res = App::build(
        config(tmp.path()),
        Arc::new(StubProvider::default()),
        Arc::new(StubProvider::default()),
    )
    .await;
    assert!(res.is_err());
}
