// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod channel;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod policy;
pub mod provider;
pub mod queue;
pub mod retrieval;
pub mod store;
pub mod text;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::error::{Error, Result};

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use shuttle_axum::axum::Router;
use tracing::info;

use crate::config::AppConfig;
use crate::enrich::{EnrichmentWorker, Enrichers};
use crate::ingest::{DomainIngest, IngestPipeline};
use crate::policy::Domain;
use crate::provider::finlight::FinlightProvider;
use crate::provider::reddit::RedditProvider;
use crate::provider::ContentProvider;
use crate::queue::IngestionQueue;
use crate::retrieval::{RetrievalEngine, Retriever};
use crate::store::{DocumentStore, InMemoryStore, JsonFileStore};

/// Fully wired service: one store, queue and worker per domain, shared by
/// the retrieval surface and the ingestion jobs.
pub struct App {
    pub config: AppConfig,
    pub retriever: Arc<Retriever>,
    pub ingest: Arc<IngestPipeline>,
}

impl App {
    /// Wire everything around the given providers. Stores come from
    /// `[store] dir` (one JSON file per domain) or live in memory.
    pub async fn build(
        config: AppConfig,
        news_provider: Arc<dyn ContentProvider>,
        social_provider: Arc<dyn ContentProvider>,
    ) -> anyhow::Result<Self> {
        let news_store = open_store(config.store.dir.as_deref(), Domain::News).await?;
        let social_store = open_store(config.store.dir.as_deref(), Domain::Social).await?;

        let retriever = Retriever::new(
            RetrievalEngine::new(
                config.news_policy(),
                news_provider.clone(),
                news_store.clone(),
            ),
            RetrievalEngine::new(
                config.social_policy(),
                social_provider.clone(),
                social_store.clone(),
            ),
        );

        let news_worker = EnrichmentWorker::new(
            Domain::News,
            Arc::new(IngestionQueue::new()),
            news_store,
            Enrichers::from_env(Domain::News).context("news enrichers")?,
        );
        let social_worker = EnrichmentWorker::new(
            Domain::Social,
            Arc::new(IngestionQueue::new()),
            social_store,
            Enrichers::from_env(Domain::Social).context("social enrichers")?,
        );
        let ingest = IngestPipeline::new(
            DomainIngest::new(news_provider, Arc::new(news_worker)),
            DomainIngest::new(social_provider, Arc::new(social_worker)),
            config.ingest.clone(),
        );

        Ok(Self {
            config,
            retriever: Arc::new(retriever),
            ingest: Arc::new(ingest),
        })
    }

    /// Finlight for news and Reddit for social, credentials from the environment.
    pub async fn from_env(config: AppConfig) -> anyhow::Result<Self> {
        let news: Arc<dyn ContentProvider> =
            Arc::new(FinlightProvider::from_env().context("finlight provider")?);
        let social: Arc<dyn ContentProvider> =
            Arc::new(RedditProvider::from_env().context("reddit provider")?);
        Self::build(config, news, social).await
    }

    /// The public HTTP routes (without `/metrics`).
    pub fn router(&self) -> Router {
        api::router(
            api::AppState::new(self.retriever.clone()),
            &self.config.server.frontend_url,
        )
    }
}

async fn open_store(dir: Option<&Path>, domain: Domain) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match dir {
        Some(dir) => {
            let path = dir.join(format!("{}.json", domain.as_str()));
            let store = JsonFileStore::open(&path)
                .await
                .with_context(|| format!("opening {} store", domain.as_str()))?;
            Ok(Arc::new(store))
        }
        None => {
            info!(target: "store", domain = domain.as_str(), "using in-memory store");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
