// src/store/memory.rs
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::EnrichedDocument;
use crate::store::{compare_published_desc, DocumentStore, FallbackQuery, SortOrder};

/// One logical collection keyed by `natural_key`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<HashMap<String, EnrichedDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_docs<I: IntoIterator<Item = EnrichedDocument>>(docs: I) -> Self {
        let map = docs
            .into_iter()
            .map(|d| (d.natural_key.clone(), d))
            .collect();
        Self {
            docs: RwLock::new(map),
        }
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    pub async fn get(&self, key: &str) -> Option<EnrichedDocument> {
        self.docs.read().await.get(key).cloned()
    }

    /// All documents, newest first.
    pub async fn snapshot(&self) -> Vec<EnrichedDocument> {
        let mut all: Vec<_> = self.docs.read().await.values().cloned().collect();
        sort_stable(&mut all, SortOrder::PublishedDesc);
        all
    }
}

/// Sort with a key tiebreak so equal timestamps come out deterministically.
fn sort_stable(docs: &mut [EnrichedDocument], order: SortOrder) {
    match order {
        SortOrder::PublishedDesc => docs.sort_by(|a, b| {
            compare_published_desc(a, b).then_with(|| a.natural_key.cmp(&b.natural_key))
        }),
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get_by_keys(&self, keys: &HashSet<String>) -> Result<Vec<EnrichedDocument>> {
        let docs = self.docs.read().await;
        Ok(keys.iter().filter_map(|k| docs.get(k).cloned()).collect())
    }

    async fn query_fallback(&self, query: &FallbackQuery) -> Result<Vec<EnrichedDocument>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        let mut hits: Vec<EnrichedDocument> = {
            let docs = self.docs.read().await;
            docs.values().filter(|d| query.matches(d)).cloned().collect()
        };
        sort_stable(&mut hits, query.sort);
        hits.truncate(query.limit);
        Ok(hits)
    }

    async fn upsert(&self, doc: EnrichedDocument) -> Result<()> {
        let mut docs = self.docs.write().await;
        docs.insert(doc.natural_key.clone(), doc);
        Ok(())
    }
}
