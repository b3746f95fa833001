//! # Enrichment
//! Capability seams for the four enrichment stages plus the queue-draining worker.
//!
//! Each stage is a plain synchronous trait object so models can be swapped
//! (or stubbed in tests) without touching the worker.

pub mod entities;
pub mod sentiment;
pub mod summarize;
pub mod topics;
pub mod worker;

use std::sync::Arc;

use crate::error::Result;
use crate::model::{Entity, SentimentResult, Topic};
use crate::policy::Domain;

pub use entities::PatternEntityExtractor;
pub use sentiment::LexiconSentiment;
pub use summarize::ExtractiveSummarizer;
pub use topics::KeywordTopicModel;
pub use worker::{EnrichmentWorker, WorkerReport};

pub trait SentimentModel: Send + Sync {
    fn analyze(&self, text: &str) -> Result<SentimentResult>;
}

pub trait TopicModel: Send + Sync {
    /// Topics ordered most relevant first.
    fn extract(&self, text: &str) -> Result<Vec<Topic>>;
}

pub trait Summarizer: Send + Sync {
    /// May return an empty string; the worker decides what that means.
    fn summarize(&self, body: &str) -> Result<String>;
}

pub trait EntityExtractor: Send + Sync {
    fn extract(&self, title: &str, summary: &str) -> Result<Vec<Entity>>;
}

/// The stage set one worker runs.
#[derive(Clone)]
pub struct Enrichers {
    pub sentiment: Arc<dyn SentimentModel>,
    pub topics: Arc<dyn TopicModel>,
    pub summarizer: Arc<dyn Summarizer>,
    pub entities: Arc<dyn EntityExtractor>,
}

impl Enrichers {
    /// Built-in models with the embedded topic set for `domain`.
    pub fn builtin(domain: Domain) -> Result<Self> {
        Ok(Self {
            sentiment: Arc::new(LexiconSentiment::new()),
            topics: Arc::new(KeywordTopicModel::builtin(domain)?),
            summarizer: Arc::new(ExtractiveSummarizer::new()),
            entities: Arc::new(PatternEntityExtractor::builtin()),
        })
    }

    /// Like [`Enrichers::builtin`], but entity patterns honour `ENTITY_CONFIG_DIR`.
    pub fn from_env(domain: Domain) -> Result<Self> {
        Ok(Self {
            entities: Arc::new(PatternEntityExtractor::from_env()),
            ..Self::builtin(domain)?
        })
    }
}
