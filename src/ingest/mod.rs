// src/ingest/mod.rs
//! Ingestion: provider → queue → enrichment worker → store.
//!
//! Runs independently of retrieval; the two flows share only the store.

pub mod scheduler;

use std::sync::Arc;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge};
use once_cell::sync::OnceCell;

use crate::channel::Channel;
use crate::config::IngestConfig;
use crate::enrich::{EnrichmentWorker, WorkerReport};
use crate::provider::{fetch_logged, ContentProvider, SearchTarget};
use crate::queue::IngestionQueue;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_enqueued_total", "Raw items placed on a queue.");
        describe_counter!(
            "ingest_provider_errors_total",
            "Provider fetch/parse errors during ingestion."
        );
        describe_counter!(
            "provider_errors_total",
            "Failed provider fetches, from retrieval or ingestion."
        );
        describe_counter!("ingest_runs_total", "Scheduled refresh cycles run.");
        describe_gauge!(
            "ingest_cycle_last_run_ts",
            "Unix ts when the refresh cycle last finished."
        );
        describe_counter!("enrich_items_total", "Items taken off a queue by a worker.");
        describe_counter!("enrich_stored_total", "Enriched documents upserted.");
        describe_counter!(
            "enrich_skipped_empty_summary_total",
            "Items dropped because their summary was empty."
        );
        describe_counter!("enrich_failed_total", "Items whose enrichment failed.");
        describe_histogram!("enrich_item_ms", "Per-item enrichment time in milliseconds.");
        describe_counter!("retrieval_requests_total", "Retrieval calls.");
        describe_counter!(
            "retrieval_fresh_matches_total",
            "Documents returned by the freshness match."
        );
        describe_counter!(
            "retrieval_fallback_docs_total",
            "Documents returned by the fallback query."
        );
        describe_counter!(
            "retrieval_phase_errors_total",
            "Swallowed failures per retrieval phase."
        );
    });
}

/// Fetch one batch and enqueue it. A failed fetch enqueues nothing.
pub async fn fetch_to_queue(
    provider: &dyn ContentProvider,
    queue: &IngestionQueue,
    target: &SearchTarget,
    count: usize,
) -> usize {
    ensure_metrics_described();
    let (items, err) = fetch_logged(provider, target, count).await;
    if err.is_some() {
        counter!("ingest_provider_errors_total", "provider" => provider.name()).increment(1);
    }
    let n = queue.enqueue_all(items);
    counter!("ingest_enqueued_total", "provider" => provider.name()).increment(n as u64);
    tracing::debug!(target: "ingest", target_desc = %target.describe(), enqueued = n, "batch enqueued");
    n
}

/// A provider and the worker draining the queue it feeds.
#[derive(Clone)]
pub struct DomainIngest {
    pub provider: Arc<dyn ContentProvider>,
    pub worker: Arc<EnrichmentWorker>,
}

impl DomainIngest {
    pub fn new(provider: Arc<dyn ContentProvider>, worker: Arc<EnrichmentWorker>) -> Self {
        Self { provider, worker }
    }

    pub async fn fetch(&self, target: &SearchTarget, count: usize) -> usize {
        fetch_to_queue(self.provider.as_ref(), self.worker.queue(), target, count).await
    }

    pub async fn drain(&self) -> WorkerReport {
        self.worker.run_once().await
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub social_enqueued: usize,
    pub news_enqueued: usize,
    pub social: WorkerReport,
    pub news: WorkerReport,
}

/// Both domains plus the job settings.
#[derive(Clone)]
pub struct IngestPipeline {
    pub news: DomainIngest,
    pub social: DomainIngest,
    pub settings: IngestConfig,
}

impl IngestPipeline {
    pub fn new(news: DomainIngest, social: DomainIngest, settings: IngestConfig) -> Self {
        Self {
            news,
            social,
            settings,
        }
    }

    /// Fetch every seed query, then drain the news queue once.
    pub async fn populate_news(&self, seed_queries: &[String], page_size: usize) -> WorkerReport {
        let mut enqueued = 0;
        for q in seed_queries {
            let target = SearchTarget::News {
                query: q.trim().to_lowercase(),
            };
            enqueued += self.news.fetch(&target, page_size).await;
        }
        tracing::info!(target: "ingest", queries = seed_queries.len(), enqueued, "news populate fetched");
        self.news.drain().await
    }

    /// Fetch `posts` from every supported channel, then drain the social queue once.
    pub async fn populate_social(&self, posts: usize) -> WorkerReport {
        let enqueued = self.fetch_all_channels(posts).await;
        tracing::info!(target: "ingest", channels = Channel::ALL.len(), enqueued, "social populate fetched");
        self.social.drain().await
    }

    /// Seed both domains using the configured queries and page sizes.
    pub async fn populate(&self) -> (WorkerReport, WorkerReport) {
        let s = &self.settings;
        let news = self
            .populate_news(&s.seed_queries, s.populate_page_size)
            .await;
        let social = self.populate_social(s.populate_page_size).await;
        (news, social)
    }

    /// One periodic refresh: trending posts for every channel, then the latest news.
    pub async fn refresh_cycle(&self) -> CycleReport {
        let s = &self.settings;
        let mut report = CycleReport {
            social_enqueued: self.fetch_all_channels(s.social_posts_per_channel).await,
            ..Default::default()
        };
        report.social = self.social.drain().await;

        let latest = SearchTarget::News {
            query: String::new(),
        };
        report.news_enqueued = self.news.fetch(&latest, s.news_page_size).await;
        report.news = self.news.drain().await;

        gauge!("ingest_cycle_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);
        tracing::info!(
            target: "ingest",
            social_enqueued = report.social_enqueued,
            social_stored = report.social.stored,
            news_enqueued = report.news_enqueued,
            news_stored = report.news.stored,
            "refresh cycle finished"
        );
        report
    }

    async fn fetch_all_channels(&self, posts: usize) -> usize {
        let mut enqueued = 0;
        for channel in Channel::ALL {
            enqueued += self.social.fetch(&SearchTarget::Social { channel }, posts).await;
        }
        enqueued
    }
}
