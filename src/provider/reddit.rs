// src/provider/reddit.rs
//! Reddit client: OAuth password grant + `/r/{channel}/hot`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::{RawItem, SocialMeta};
use crate::provider::{clamp_count, ContentProvider, SearchTarget};

const PROVIDER: &str = "reddit";
const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
const API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Default)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl RedditCredentials {
    /// `REDDIT_CLIENT_ID`, `REDDIT_CLIENT_SECRET`, `REDDIT_USERNAME`, `REDDIT_PASSWORD`.
    pub fn from_env() -> Self {
        let var = |k: &str| std::env::var(k).unwrap_or_default();
        Self {
            client_id: var("REDDIT_CLIENT_ID"),
            client_secret: var("REDDIT_CLIENT_SECRET"),
            username: var("REDDIT_USERNAME"),
            password: var("REDDIT_PASSWORD"),
        }
    }

    fn is_complete(&self) -> bool {
        !(self.client_id.is_empty()
            || self.client_secret.is_empty()
            || self.username.is_empty()
            || self.password.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResp {
    access_token: String,
    #[serde(default = "default_expiry")]
    expires_in: u64,
}

fn default_expiry() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    score: i64,
    #[serde(default)]
    permalink: String,
    created_utc: Option<f64>,
    #[serde(default)]
    num_comments: u64,
    author: Option<String>,
    #[serde(default)]
    subreddit: String,
}

pub struct RedditProvider {
    http: reqwest::Client,
    creds: RedditCredentials,
    token: Mutex<Option<(String, Instant)>>,
}

impl RedditProvider {
    pub fn new(creds: RedditCredentials) -> Result<Self> {
        let user_agent = format!("rust:market-bites:v0.1 (by /u/{})", creds.username);
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| Error::Config(format!("reddit http client: {e}")))?;
        Ok(Self {
            http,
            creds,
            token: Mutex::new(None),
        })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(RedditCredentials::from_env())
    }

    async fn access_token(&self) -> Result<String> {
        let mut guard = self.token.lock().await;
        if let Some((tok, valid_until)) = guard.as_ref() {
            if Instant::now() < *valid_until {
                return Ok(tok.clone());
            }
        }

        let resp = self
            .http
            .post(TOKEN_URL)
            .basic_auth(&self.creds.client_id, Some(&self.creds.client_secret))
            .form(&[
                ("grant_type", "password"),
                ("username", self.creds.username.as_str()),
                ("password", self.creds.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, e))?;
        if !resp.status().is_success() {
            return Err(Error::provider(
                PROVIDER,
                format!("token http status {}", resp.status()),
            ));
        }
        let tok: TokenResp = resp.json().await.map_err(|e| Error::provider(PROVIDER, e))?;

        // Refresh a minute early.
        let ttl = Duration::from_secs(tok.expires_in.saturating_sub(60));
        *guard = Some((tok.access_token.clone(), Instant::now() + ttl));
        Ok(tok.access_token)
    }

    /// Parse a `hot` listing payload into raw items.
    pub fn parse_listing(body: &str) -> Result<Vec<RawItem>> {
        let t0 = Instant::now();
        let listing: Listing =
            serde_json::from_str(body).map_err(|e| Error::provider(PROVIDER, e))?;

        let out: Vec<RawItem> = listing
            .data
            .children
            .into_iter()
            .filter_map(|c| {
                let p = c.data;
                let id = p.id.filter(|id| !id.trim().is_empty())?;
                Some(RawItem {
                    natural_key: id,
                    title: p.title,
                    body: p.selftext,
                    link: format!("https://www.reddit.com{}", p.permalink),
                    published_at: p.created_utc.and_then(unix_to_utc),
                    source: p.author.unwrap_or_else(|| "[deleted]".to_string()),
                    social: Some(SocialMeta {
                        subreddit: p.subreddit,
                        score: p.score,
                        num_comments: p.num_comments,
                    }),
                })
            })
            .collect();

        histogram!("provider_parse_ms", "provider" => PROVIDER)
            .record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("provider_items_total", "provider" => PROVIDER).increment(out.len() as u64);
        Ok(out)
    }
}

fn unix_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    DateTime::<Utc>::from_timestamp(secs.trunc() as i64, 0)
}

#[async_trait]
impl ContentProvider for RedditProvider {
    async fn fetch(&self, target: &SearchTarget, count: usize) -> Result<Vec<RawItem>> {
        let SearchTarget::Social { channel } = target else {
            return Err(Error::provider(PROVIDER, "only social targets are served"));
        };
        if !self.creds.is_complete() {
            return Err(Error::provider(PROVIDER, "reddit credentials not configured"));
        }

        let token = self.access_token().await?;
        let url = format!("{API_BASE}/r/{}/hot", channel.canonical());
        tracing::debug!(target: "provider", channel = %channel, count, "fetching hot posts");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[("limit", clamp_count(count))])
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
        Self::parse_listing(&body)
    }

    fn name(&self) -> &'static str {
        PROVIDER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Channel;

    #[test]
    fn parses_listing_into_social_items() {
        let body = r#"{"data": {"children": [
            {"data": {"id": "abc1", "title": "BTC up", "selftext": "text", "score": 120,
                      "permalink": "/r/CryptoCurrency/comments/abc1/btc_up/",
                      "created_utc": 1735689600.0, "num_comments": 14,
                      "author": "satoshi", "subreddit": "CryptoCurrency"}},
            {"data": {"id": "abc2", "title": "gone", "score": 3, "permalink": "/x",
                      "created_utc": 1735689700.0, "author": null, "subreddit": "CryptoCurrency"}},
            {"data": {"title": "no id"}}
        ]}}"#;
        let items = RedditProvider::parse_listing(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].natural_key, "abc1");
        assert_eq!(
            items[0].link,
            "https://www.reddit.com/r/CryptoCurrency/comments/abc1/btc_up/"
        );
        let meta = items[0].social.as_ref().unwrap();
        assert_eq!(meta.score, 120);
        assert_eq!(meta.num_comments, 14);
        assert_eq!(
            items[0].published_at.unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert_eq!(items[1].source, "[deleted]");
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_network() {
        let p = RedditProvider::new(RedditCredentials::default()).unwrap();
        let target = SearchTarget::Social {
            channel: Channel::Stocks,
        };
        let err = p.fetch(&target, 5).await.unwrap_err();
        assert!(matches!(err, Error::ProviderFailure { .. }));
    }
}
