//! # Retrieval Engine
//! Hybrid, freshness-first retrieval over the document store.
//!
//! Four strictly ordered phases:
//! 1. live identification: ask the provider for `fetch_budget` items, keep their keys;
//! 2. freshness match: load those keys from the store, accept every hit;
//! 3. fallback: if under `min_results`, query the store with the domain's
//!    relevance predicate, excluding already-found keys, newest first,
//!    limited to exactly the shortfall;
//! 4. final ordering: newest first over the whole set, missing timestamps last.
//!
//! Provider and store failures never abort a call: each is captured in the
//! [`RetrievalReport`] and the next phase proceeds with what was gathered.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{info, warn};

use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::model::EnrichedDocument;
use crate::policy::DomainPolicy;
use crate::provider::{fetch_logged, ContentProvider, SearchTarget};
use crate::store::{sort_docs, DocumentStore, FallbackQuery, SortOrder};

/// What happened in each phase of one retrieval call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalReport {
    pub fresh_keys: HashSet<String>,
    pub found_keys: HashSet<String>,
    /// Shortfall requested from the fallback query (0 when skipped).
    pub needed: usize,
    pub fallback_keys: Vec<String>,
    pub provider_error: Option<Error>,
    pub lookup_error: Option<Error>,
    pub fallback_error: Option<Error>,
}

impl RetrievalReport {
    pub fn had_failures(&self) -> bool {
        self.provider_error.is_some() || self.lookup_error.is_some() || self.fallback_error.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub documents: Vec<EnrichedDocument>,
    pub report: RetrievalReport,
}

/// Generic engine; the policy decides which domain it serves.
pub struct RetrievalEngine {
    policy: DomainPolicy,
    provider: Arc<dyn ContentProvider>,
    store: Arc<dyn DocumentStore>,
}

impl RetrievalEngine {
    pub fn new(
        policy: DomainPolicy,
        provider: Arc<dyn ContentProvider>,
        store: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            policy,
            provider,
            store,
        }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Ordered, de-duplicated documents for `target`.
    pub async fn search(&self, target: &SearchTarget) -> Result<Vec<EnrichedDocument>> {
        Ok(self.retrieve(target).await?.documents)
    }

    /// Run all four phases and return the documents with a per-phase report.
    /// Only a target from the wrong domain is rejected; I/O failures are reported.
    pub async fn retrieve(&self, target: &SearchTarget) -> Result<RetrievalOutcome> {
        if !self.policy.accepts(target) {
            return Err(Error::InvalidQuery(format!(
                "{} engine cannot serve {}",
                self.policy.domain.as_str(),
                target.describe()
            )));
        }

        let t0 = Instant::now();
        let domain = self.policy.domain.as_str();
        counter!("retrieval_requests_total", "domain" => domain).increment(1);

        let mut report = RetrievalReport::default();
        let mut results: Vec<EnrichedDocument> = Vec::new();

        // (1) Live identification
        let (items, provider_error) =
            fetch_logged(self.provider.as_ref(), target, self.policy.fetch_budget).await;
        report.fresh_keys = items.into_iter().map(|it| it.natural_key).collect();
        if let Some(e) = provider_error {
            counter!("retrieval_phase_errors_total", "phase" => "identify").increment(1);
            report.provider_error = Some(e);
        }

        // (2) Freshness match
        if !report.fresh_keys.is_empty() {
            match self.store.get_by_keys(&report.fresh_keys).await {
                Ok(docs) => {
                    for doc in docs {
                        if report.found_keys.insert(doc.natural_key.clone()) {
                            results.push(doc);
                        }
                    }
                }
                Err(e) => {
                    warn!(target: "retrieval", error = %e, domain, "freshness lookup failed");
                    counter!("retrieval_phase_errors_total", "phase" => "lookup").increment(1);
                    report.lookup_error = Some(e);
                }
            }
        }
        counter!("retrieval_fresh_matches_total", "domain" => domain)
            .increment(results.len() as u64);

        // (3) Fallback
        let needed = self.policy.min_results.saturating_sub(results.len());
        if needed > 0 {
            report.needed = needed;
            let query = FallbackQuery {
                exclude_keys: report.found_keys.clone(),
                predicate: self.policy.fallback_predicate(target),
                sort: SortOrder::PublishedDesc,
                limit: needed,
            };
            match self.store.query_fallback(&query).await {
                Ok(docs) => {
                    for doc in docs.into_iter().take(needed) {
                        // Keys stay unique even if a store ignores the exclusion.
                        if report.found_keys.contains(&doc.natural_key) {
                            warn!(target: "retrieval", key = %doc.natural_key, "store ignored exclusion");
                            continue;
                        }
                        report.fallback_keys.push(doc.natural_key.clone());
                        results.push(doc);
                    }
                }
                Err(e) => {
                    warn!(target: "retrieval", error = %e, domain, "fallback query failed");
                    counter!("retrieval_phase_errors_total", "phase" => "fallback").increment(1);
                    report.fallback_error = Some(e);
                }
            }
        }
        counter!("retrieval_fallback_docs_total", "domain" => domain)
            .increment(report.fallback_keys.len() as u64);

        // (4) Final ordering
        sort_docs(&mut results, SortOrder::PublishedDesc);

        histogram!("retrieval_ms", "domain" => domain).record(t0.elapsed().as_secs_f64() * 1_000.0);
        info!(
            target: "retrieval",
            domain,
            request = %target.describe(),
            fresh = report.fresh_keys.len(),
            matched = report.found_keys.len(),
            fallback = report.fallback_keys.len(),
            total = results.len(),
            "retrieval finished"
        );

        Ok(RetrievalOutcome {
            documents: results,
            report,
        })
    }
}

/// The retrieval surface: one engine per domain plus input validation.
pub struct Retriever {
    news: RetrievalEngine,
    social: RetrievalEngine,
}

impl Retriever {
    pub fn new(news: RetrievalEngine, social: RetrievalEngine) -> Self {
        Self { news, social }
    }

    /// Case-normalized news query. Empty input is an `InvalidQuery`.
    pub fn news_target(query: &str) -> Result<SearchTarget> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Err(Error::InvalidQuery("query must not be empty".into()));
        }
        Ok(SearchTarget::News { query })
    }

    /// Resolves the channel through the canonical map before any I/O.
    pub fn social_target(channel: &str) -> Result<SearchTarget> {
        Ok(SearchTarget::Social {
            channel: Channel::resolve(channel)?,
        })
    }

    pub async fn search_news(&self, query: &str) -> Result<Vec<EnrichedDocument>> {
        let target = Self::news_target(query)?;
        self.news.search(&target).await
    }

    pub async fn search_social(&self, channel: &str) -> Result<Vec<EnrichedDocument>> {
        let target = Self::social_target(channel)?;
        self.social.search(&target).await
    }

    pub fn news_engine(&self) -> &RetrievalEngine {
        &self.news
    }

    pub fn social_engine(&self) -> &RetrievalEngine {
        &self.social
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawItem;
    use crate::store::test_support::*;
    use crate::store::InMemoryStore;
    use async_trait::async_trait;

    struct KeysProvider(Vec<String>);

    #[async_trait]
    impl ContentProvider for KeysProvider {
        async fn fetch(&self, _t: &SearchTarget, count: usize) -> Result<Vec<RawItem>> {
            Ok(self
                .0
                .iter()
                .take(count)
                .map(|k| RawItem {
                    natural_key: k.to_string(),
                    title: String::new(),
                    body: String::new(),
                    link: String::new(),
                    published_at: None,
                    source: "Test".into(),
                    social: None,
                })
                .collect())
        }
        fn name(&self) -> &'static str {
            "keys"
        }
    }

    fn news_engine(keys: &[&str], store: InMemoryStore) -> RetrievalEngine {
        RetrievalEngine::new(
            DomainPolicy::news(),
            Arc::new(KeysProvider(keys.iter().map(|k| k.to_string()).collect())),
            Arc::new(store),
        )
    }

    #[tokio::test]
    async fn fresh_matches_are_accepted_without_relevance_check() {
        // "x" has no entity matching the query but is fresh upstream.
        let store = InMemoryStore::from_docs(vec![news_doc("x", Some(1), &[])]);
        let engine = news_engine(&["x", "x", "unknown"], store);
        let out = engine
            .retrieve(&SearchTarget::News {
                query: "tesla".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.documents.len(), 1);
        assert_eq!(out.report.fresh_keys.len(), 2);
        assert_eq!(out.report.needed, 9);
        assert!(!out.report.had_failures());
    }

    #[tokio::test]
    async fn fallback_is_skipped_when_floor_is_met() {
        let docs: Vec<_> = (0..12)
            .map(|i| news_doc(&format!("k{i}"), Some(i), &[]))
            .collect();
        let keys: Vec<&str> = docs.iter().map(|d| d.natural_key.as_str()).collect();
        let engine = news_engine(&keys, InMemoryStore::from_docs(docs.clone()));
        let out = engine
            .retrieve(&SearchTarget::News { query: "q".into() })
            .await
            .unwrap();
        assert_eq!(out.documents.len(), 12);
        assert_eq!(out.report.needed, 0);
        assert!(out.report.fallback_keys.is_empty());
    }

    #[tokio::test]
    async fn wrong_domain_target_is_rejected() {
        let engine = news_engine(&[], InMemoryStore::new());
        let err = engine
            .retrieve(&SearchTarget::Social {
                channel: Channel::Stocks,
            })
            .await
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn targets_are_validated_and_normalized() {
        assert_eq!(
            Retriever::news_target("  TeSLA ").unwrap(),
            SearchTarget::News {
                query: "tesla".into()
            }
        );
        assert!(matches!(
            Retriever::news_target("   "),
            Err(Error::InvalidQuery(_))
        ));
        assert!(matches!(
            Retriever::social_target("notreal"),
            Err(Error::UnsupportedChannel(_))
        ));
    }
}
