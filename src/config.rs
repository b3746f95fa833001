// src/config.rs
//! Application configuration (`market_bites.toml`).
//!
//! Resolution order:
//! 1) `$MARKET_BITES_CONFIG` (must exist)
//! 2) `config/market_bites.toml`
//! 3) built-in defaults
//!
//! Credentials never live here; providers read them from the environment.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::policy::DomainPolicy;
use crate::provider::MAX_PAGE_SIZE;

pub const ENV_PATH: &str = "MARKET_BITES_CONFIG";
pub const DEFAULT_PATH: &str = "config/market_bites.toml";
pub const ENV_FRONTEND_URL: &str = "FRONTEND_URL";

pub const DEFAULT_SEED_QUERIES: &[&str] = &[
    "Apple",
    "Google",
    "Microsoft",
    "Tesla",
    "Amazon",
    "Nvidia",
    "Meta",
    "Netflix",
    "Intel",
    "JP Morgan",
    "Goldman Sachs",
    "Alibaba",
    "Samsung",
    "AMD",
    "Boeing",
    "Deepseek",
    "OpenAI",
];

/// Overrides for one domain's retrieval policy. Unset fields keep the
/// domain's built-in value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RetrievalSection {
    pub fetch_budget: Option<usize>,
    pub min_results: Option<usize>,
    pub min_fallback_score: Option<i64>,
}

impl RetrievalSection {
    fn apply(&self, base: DomainPolicy) -> DomainPolicy {
        DomainPolicy {
            fetch_budget: self
                .fetch_budget
                .unwrap_or(base.fetch_budget)
                .clamp(1, MAX_PAGE_SIZE),
            min_results: self.min_results.unwrap_or(base.min_results).max(1),
            min_fallback_score: self.min_fallback_score.unwrap_or(base.min_fallback_score),
            ..base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub interval_secs: u64,
    pub news_page_size: usize,
    pub social_posts_per_channel: usize,
    pub populate_page_size: usize,
    pub seed_queries: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            interval_secs: 3600,
            news_page_size: 75,
            social_posts_per_channel: 5,
            populate_page_size: 10,
            seed_queries: DEFAULT_SEED_QUERIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory holding `news.json` and `social.json`; absent means in-memory only.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub news: RetrievalSection,
    pub social: RetrievalSection,
    pub ingest: IngestConfig,
    pub store: StoreConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing market_bites config")?;
        Ok(cfg.sanitized())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Env path, then the default file, then defaults. `FRONTEND_URL`
    /// overrides the configured origin.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_PATH);
            if default.exists() {
                Self::load_from(&default)?
            } else {
                Self::default()
            }
        };

        if let Ok(url) = std::env::var(ENV_FRONTEND_URL) {
            if !url.trim().is_empty() {
                cfg.server.frontend_url = url.trim().to_string();
            }
        }
        Ok(cfg)
    }

    pub fn news_policy(&self) -> DomainPolicy {
        self.news.apply(DomainPolicy::news())
    }

    pub fn social_policy(&self) -> DomainPolicy {
        self.social.apply(DomainPolicy::social())
    }

    fn sanitized(mut self) -> Self {
        let i = &mut self.ingest;
        i.interval_secs = i.interval_secs.max(1);
        i.news_page_size = i.news_page_size.clamp(1, MAX_PAGE_SIZE);
        i.social_posts_per_channel = i.social_posts_per_channel.clamp(1, MAX_PAGE_SIZE);
        i.populate_page_size = i.populate_page_size.clamp(1, MAX_PAGE_SIZE);
        i.seed_queries = i
            .seed_queries
            .iter()
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .collect();
        self
    }
}
