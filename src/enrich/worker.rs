//! # Enrichment worker
//! Drains one domain's queue, enriches every item and upserts the result.
//!
//! Stage order per item: sentiment(full text), topics(full text),
//! summary(body), entities(title, summary). An item whose cleaned summary is
//! empty is dropped without touching the store. A failing stage or upsert
//! aborts that item only; the drain always runs to completion.
//!
//! At most one drain runs per worker at a time (`drain_lock`).

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::enrich::Enrichers;
use crate::error::Result;
use crate::model::{EnrichedDocument, RawItem};
use crate::policy::Domain;
use crate::queue::IngestionQueue;
use crate::store::DocumentStore;
use crate::text::collapse_whitespace;

/// Outcome of one drain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub drained: usize,
    pub stored: usize,
    pub skipped_empty_summary: usize,
    pub failed: usize,
}

pub struct EnrichmentWorker {
    domain: Domain,
    queue: Arc<IngestionQueue>,
    store: Arc<dyn DocumentStore>,
    enrichers: Enrichers,
    drain_lock: Mutex<()>,
}

impl EnrichmentWorker {
    pub fn new(
        domain: Domain,
        queue: Arc<IngestionQueue>,
        store: Arc<dyn DocumentStore>,
        enrichers: Enrichers,
    ) -> Self {
        Self {
            domain,
            queue,
            store,
            enrichers,
            drain_lock: Mutex::new(()),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn queue(&self) -> &Arc<IngestionQueue> {
        &self.queue
    }

    /// Run every stage for one item. `Ok(None)` means the summary came out
    /// empty and the item must not be stored.
    pub fn enrich_item(&self, item: &RawItem) -> Result<Option<EnrichedDocument>> {
        let full_text = item.full_text();

        let sentiment = self.enrichers.sentiment.analyze(&full_text)?;
        let topics = self.enrichers.topics.extract(&full_text)?;
        let summary = collapse_whitespace(&self.enrichers.summarizer.summarize(&item.body)?);
        if summary.is_empty() {
            return Ok(None);
        }
        let entities = self.enrichers.entities.extract(&item.title, &summary)?;

        Ok(Some(EnrichedDocument {
            natural_key: item.natural_key.clone(),
            title: item.title.clone(),
            body: item.body.clone(),
            link: item.link.clone(),
            source: item.source.clone(),
            sentiment,
            topics,
            entities,
            summary,
            published_at: item.published_at,
            processed_at: Utc::now(),
            social: item.social.clone(),
        }))
    }

    /// Drain the queue as observed now and process every drained item.
    pub async fn run_once(&self) -> WorkerReport {
        let _guard = self.drain_lock.lock().await;
        let domain = self.domain.as_str();

        let items = self.queue.drain_all();
        let mut report = WorkerReport {
            drained: items.len(),
            ..Default::default()
        };
        if items.is_empty() {
            debug!(target: "enrich", domain, "queue empty");
            return report;
        }

        for item in items {
            let t0 = Instant::now();
            counter!("enrich_items_total", "domain" => domain).increment(1);

            match self.process(&item).await {
                Ok(true) => {
                    report.stored += 1;
                    counter!("enrich_stored_total", "domain" => domain).increment(1);
                }
                Ok(false) => {
                    report.skipped_empty_summary += 1;
                    counter!("enrich_skipped_empty_summary_total", "domain" => domain)
                        .increment(1);
                    debug!(target: "enrich", domain, key = %item.natural_key, "empty summary, not stored");
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("enrich_failed_total", "domain" => domain).increment(1);
                    warn!(target: "enrich", domain, key = %item.natural_key, error = %e, "item enrichment failed");
                }
            }
            histogram!("enrich_item_ms", "domain" => domain)
                .record(t0.elapsed().as_secs_f64() * 1_000.0);
        }

        info!(
            target: "enrich",
            domain,
            drained = report.drained,
            stored = report.stored,
            skipped = report.skipped_empty_summary,
            failed = report.failed,
            "drain finished"
        );
        report
    }

    async fn process(&self, item: &RawItem) -> Result<bool> {
        match self.enrich_item(item)? {
            Some(doc) => {
                self.store.upsert(doc).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
