// src/provider/mod.rs
//! Content provider clients: live, unenriched items for a query or channel.
//!
//! One attempt per call, no retries. Callers treat an empty result and a
//! failure identically (degrade to store-only retrieval); the failure is kept
//! as a value so it can be logged and reported.

pub mod finlight;
pub mod reddit;

use async_trait::async_trait;
use metrics::counter;

use crate::channel::Channel;
use crate::error::Result;
use crate::model::RawItem;

/// Upper bound for `page_size` / `count` accepted by upstream APIs.
pub const MAX_PAGE_SIZE: usize = 75;

/// What to ask the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTarget {
    /// Free-text news query, already lowercased. May be empty for "latest".
    News { query: String },
    /// Trending posts of one supported channel.
    Social { channel: Channel },
}

impl SearchTarget {
    pub fn describe(&self) -> String {
        match self {
            SearchTarget::News { query } => format!("news:'{query}'"),
            SearchTarget::Social { channel } => format!("r/{channel}"),
        }
    }
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch at most `count` items (clamped to [`MAX_PAGE_SIZE`]).
    async fn fetch(&self, target: &SearchTarget, count: usize) -> Result<Vec<RawItem>>;
    fn name(&self) -> &'static str;
}

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn clamp_count(count: usize) -> usize {
    count.clamp(1, MAX_PAGE_SIZE)
}

/// Drop items without a derivable key and cap the batch at `count`.
pub fn finalize_items(items: Vec<RawItem>, count: usize) -> Vec<RawItem> {
    items
        .into_iter()
        .filter(|it| !it.natural_key.trim().is_empty())
        .take(clamp_count(count))
        .collect()
}

/// Single fetch attempt; a failure is logged, counted and handed back
/// alongside an empty batch.
pub async fn fetch_logged(
    provider: &dyn ContentProvider,
    target: &SearchTarget,
    count: usize,
) -> (Vec<RawItem>, Option<crate::error::Error>) {
    match provider.fetch(target, count).await {
        Ok(items) => (finalize_items(items, count), None),
        Err(e) => {
            tracing::warn!(
                target: "provider",
                error = %e,
                provider = provider.name(),
                target = %target.describe(),
                "provider fetch failed"
            );
            counter!("provider_errors_total", "provider" => provider.name()).increment(1);
            (Vec::new(), Some(e))
        }
    }
}
