// src/store/mod.rs
//! Document store interface: point/set lookup, predicate query with sort and
//! limit, and whole-document upsert keyed by `natural_key`.
//!
//! The storage engine is pluggable. `InMemoryStore` backs tests and the
//! default runtime, `JsonFileStore` adds an on-disk snapshot.

pub mod json_file;
pub mod memory;

use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::EnrichedDocument;

pub use json_file::JsonFileStore;
pub use memory::InMemoryStore;

/// Relevance predicate for the fallback query.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Any entity text contains `needle` (case-insensitive).
    EntityTextContains(String),
    /// Social channel equals `subreddit` AND score strictly above `min_score`.
    ChannelWithMinScore { subreddit: String, min_score: i64 },
}

impl Predicate {
    pub fn matches(&self, doc: &EnrichedDocument) -> bool {
        match self {
            Predicate::EntityTextContains(needle) => {
                doc.has_entity_containing(&needle.to_lowercase())
            }
            Predicate::ChannelWithMinScore {
                subreddit,
                min_score,
            } => doc
                .social
                .as_ref()
                .is_some_and(|m| m.subreddit == *subreddit && m.score > *min_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Newest `published_at` first; missing timestamps last.
    #[default]
    PublishedDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackQuery {
    pub exclude_keys: HashSet<String>,
    pub predicate: Predicate,
    pub sort: SortOrder,
    pub limit: usize,
}

impl FallbackQuery {
    /// Exclusion AND relevance predicate.
    pub fn matches(&self, doc: &EnrichedDocument) -> bool {
        !self.exclude_keys.contains(&doc.natural_key) && self.predicate.matches(doc)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents whose key is in `keys`. Order unspecified.
    async fn get_by_keys(&self, keys: &HashSet<String>) -> Result<Vec<EnrichedDocument>>;

    /// Documents matching `query`, sorted and truncated to `query.limit`.
    async fn query_fallback(&self, query: &FallbackQuery) -> Result<Vec<EnrichedDocument>>;

    /// Insert or fully replace the document with the same `natural_key`.
    async fn upsert(&self, doc: EnrichedDocument) -> Result<()>;
}

/// Descending by `published_at`, documents without a timestamp after all others.
pub fn compare_published_desc(a: &EnrichedDocument, b: &EnrichedDocument) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn sort_docs(docs: &mut [EnrichedDocument], order: SortOrder) {
    match order {
        SortOrder::PublishedDesc => docs.sort_by(compare_published_desc),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::model::{EnrichedDocument, Entity, SentimentResult, SocialMeta};

    pub fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    pub fn news_doc(key: &str, minutes: Option<i64>, entities: &[&str]) -> EnrichedDocument {
        EnrichedDocument {
            natural_key: key.to_string(),
            title: format!("title {key}"),
            body: "body".into(),
            link: key.to_string(),
            source: "Test".into(),
            sentiment: SentimentResult {
                label: "Neutral".into(),
                score: 3,
                confidence: 0.5,
            },
            topics: vec![],
            entities: entities
                .iter()
                .map(|t| Entity {
                    text: t.to_string(),
                    label: "ORG".into(),
                })
                .collect(),
            summary: "summary".into(),
            published_at: minutes.map(|m| base_time() + Duration::minutes(m)),
            processed_at: base_time(),
            social: None,
        }
    }

    pub fn social_doc(key: &str, minutes: Option<i64>, sub: &str, score: i64) -> EnrichedDocument {
        let mut d = news_doc(key, minutes, &[]);
        d.social = Some(SocialMeta {
            subreddit: sub.to_string(),
            score,
            num_comments: 0,
        });
        d
    }
}
