// src/provider/finlight.rs
//! Finlight news API client (extended articles endpoint).

use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{iso_z, RawItem};
use crate::provider::{clamp_count, ContentProvider, SearchTarget};

const PROVIDER: &str = "finlight";
pub const DEFAULT_ENDPOINT: &str = "https://api.finlight.me/v1/articles/extended";
pub const ENV_API_KEY: &str = "FINLIGHT_API_KEY";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ArticlesReq<'a> {
    query: &'a str,
    page_size: usize,
    page: u32,
    order: &'a str,
}

#[derive(Debug, Deserialize)]
struct ArticlesResp {
    status: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Article {
    link: Option<String>,
    title: Option<String>,
    content: Option<String>,
    publish_date: Option<String>,
    source: Option<String>,
}

pub struct FinlightProvider {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl FinlightProvider {
    pub fn new(api_key: impl Into<String>, endpoint: Option<&str>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("market-bites/0.1")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Config(format!("finlight http client: {e}")))?;
        Ok(Self {
            http,
            api_key: api_key.into(),
            endpoint: endpoint.unwrap_or(DEFAULT_ENDPOINT).to_string(),
        })
    }

    /// Reads `FINLIGHT_API_KEY`; an empty key is allowed and fails at fetch time.
    pub fn from_env() -> Result<Self> {
        Self::new(std::env::var(ENV_API_KEY).unwrap_or_default(), None)
    }

    /// Parse an extended-articles payload. Non-`ok` status is a provider failure.
    pub fn parse_articles(body: &str) -> Result<Vec<RawItem>> {
        let t0 = std::time::Instant::now();
        let resp: ArticlesResp =
            serde_json::from_str(body).map_err(|e| Error::provider(PROVIDER, e))?;
        if resp.status.as_deref() != Some("ok") {
            return Err(Error::provider(
                PROVIDER,
                format!("invalid API response status: {:?}", resp.status),
            ));
        }

        let out: Vec<RawItem> = resp
            .articles
            .into_iter()
            .filter_map(|a| {
                let link = a.link.filter(|l| !l.trim().is_empty())?;
                Some(RawItem {
                    natural_key: link.clone(),
                    title: a.title.unwrap_or_default(),
                    body: a.content.unwrap_or_default(),
                    link,
                    published_at: a.publish_date.as_deref().and_then(iso_z::parse),
                    source: a.source.unwrap_or_else(|| "Unknown".to_string()),
                    social: None,
                })
            })
            .collect();

        histogram!("provider_parse_ms", "provider" => PROVIDER)
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("provider_items_total", "provider" => PROVIDER).increment(out.len() as u64);
        Ok(out)
    }
}

#[async_trait]
impl ContentProvider for FinlightProvider {
    async fn fetch(&self, target: &SearchTarget, count: usize) -> Result<Vec<RawItem>> {
        let SearchTarget::News { query } = target else {
            return Err(Error::provider(PROVIDER, "only news targets are served"));
        };
        if self.api_key.is_empty() {
            return Err(Error::provider(PROVIDER, "missing FINLIGHT_API_KEY"));
        }

        tracing::debug!(target: "provider", query = %query, "fetching news");
        let req = ArticlesReq {
            query,
            page_size: clamp_count(count),
            page: 1,
            order: "DESC",
        };
        let resp = self
            .http
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, e))?;

        if !resp.status().is_success() {
            return Err(Error::provider(
                PROVIDER,
                format!("http status {}", resp.status()),
            ));
        }
        let body = resp.text().await.map_err(|e| Error::provider(PROVIDER, e))?;
        Self::parse_articles(&body)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}
