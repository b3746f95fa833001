// tests/common/mod.rs
//
// Shared builders and in-test doubles for the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use market_bites::error::{Error, Result};
use market_bites::model::{EnrichedDocument, Entity, RawItem, SentimentResult, SocialMeta};
use market_bites::provider::{ContentProvider, SearchTarget};
use market_bites::store::{DocumentStore, FallbackQuery, InMemoryStore};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

pub fn raw(key: &str) -> RawItem {
    RawItem {
        natural_key: key.to_string(),
        title: format!("Headline {key}"),
        body: format!("Markets moved on {key}. Investors reacted quickly."),
        link: format!("https://news.example/{key}"),
        published_at: Some(t0()),
        source: "Example Wire".into(),
        social: None,
    }
}

pub fn doc(key: &str, minutes: Option<i64>) -> EnrichedDocument {
    EnrichedDocument {
        natural_key: key.to_string(),
        title: format!("Headline {key}"),
        body: "body".into(),
        link: format!("https://news.example/{key}"),
        source: "Example Wire".into(),
        sentiment: SentimentResult {
            label: "Neutral".into(),
            score: 3,
            confidence: 0.5,
        },
        topics: vec![],
        entities: vec![],
        summary: format!("summary {key}"),
        published_at: minutes.map(|m| t0() + Duration::minutes(m)),
        processed_at: t0(),
        social: None,
    }
}

pub fn news_doc(key: &str, minutes: Option<i64>, entity: Option<&str>) -> EnrichedDocument {
    let mut d = doc(key, minutes);
    if let Some(text) = entity {
        d.entities.push(Entity {
            text: text.to_string(),
            label: "ORG".into(),
        });
    }
    d
}

pub fn social_doc(key: &str, minutes: Option<i64>, subreddit: &str, score: i64) -> EnrichedDocument {
    let mut d = doc(key, minutes);
    d.social = Some(SocialMeta {
        subreddit: subreddit.to_string(),
        score,
        num_comments: 3,
    });
    d
}

pub fn keys(docs: &[EnrichedDocument]) -> Vec<String> {
    docs.iter().map(|d| d.natural_key.clone()).collect()
}

/// Newest first, missing timestamps last.
pub fn assert_sorted_desc(docs: &[EnrichedDocument]) {
    for w in docs.windows(2) {
        match (w[0].published_at, w[1].published_at) {
            (Some(a), Some(b)) => assert!(a >= b, "{} before {}", w[0].natural_key, w[1].natural_key),
            (None, Some(_)) => panic!("missing timestamp sorted before a dated document"),
            _ => {}
        }
    }
}

pub fn assert_unique(docs: &[EnrichedDocument]) {
    let set: HashSet<_> = docs.iter().map(|d| &d.natural_key).collect();
    assert_eq!(set.len(), docs.len(), "duplicate natural keys in result");
}

/// Returns fixed keys (or full items) and counts calls.
#[derive(Default)]
pub struct StubProvider {
    pub items: Vec<RawItem>,
    pub fail: bool,
    pub calls: AtomicUsize,
    pub targets: Mutex<Vec<SearchTarget>>,
}

impl StubProvider {
    pub fn with_keys<S: AsRef<str>>(keys: &[S]) -> Self {
        Self {
            items: keys.iter().map(|k| raw(k.as_ref())).collect(),
            ..Default::default()
        }
    }

    pub fn with_items(items: Vec<RawItem>) -> Self {
        Self {
            items,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for StubProvider {
    async fn fetch(&self, target: &SearchTarget, count: usize) -> Result<Vec<RawItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(target.clone());
        if self.fail {
            return Err(Error::provider("stub", "connection reset"));
        }
        Ok(self.items.iter().take(count).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Wraps an in-memory store; can fail either read path and counts calls.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_lookup: bool,
    pub fail_fallback: bool,
    pub calls: AtomicUsize,
}

impl FlakyStore {
    pub fn new(docs: Vec<EnrichedDocument>) -> Self {
        Self {
            inner: InMemoryStore::from_docs(docs),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_by_keys(&self, keys: &HashSet<String>) -> Result<Vec<EnrichedDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookup {
            return Err(Error::store("lookup timed out"));
        }
        self.inner.get_by_keys(keys).await
    }

    async fn query_fallback(&self, query: &FallbackQuery) -> Result<Vec<EnrichedDocument>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_fallback {
            return Err(Error::store("query timed out"));
        }
        self.inner.query_fallback(query).await
    }

    async fn upsert(&self, doc: EnrichedDocument) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.upsert(doc).await
    }
}

pub fn arc<T>(v: T) -> Arc<T> {
    Arc::new(v)
}
