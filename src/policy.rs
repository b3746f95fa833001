//! Per-domain parameters that turn the generic retrieval engine and
//! enrichment worker into the news or the social pipeline.

use crate::provider::SearchTarget;
use crate::store::Predicate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    News,
    Social,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::News => "news",
            Domain::Social => "social",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomainPolicy {
    pub domain: Domain,
    /// Live identifiers requested from the provider.
    pub fetch_budget: usize,
    /// Guaranteed-floor target for one retrieval call.
    pub min_results: usize,
    /// Social fallback keeps documents with `score > min_fallback_score`.
    pub min_fallback_score: i64,
}

impl DomainPolicy {
    pub const fn news() -> Self {
        Self {
            domain: Domain::News,
            fetch_budget: 20,
            min_results: 10,
            min_fallback_score: 0,
        }
    }

    pub const fn social() -> Self {
        Self {
            domain: Domain::Social,
            fetch_budget: 20,
            min_results: 15,
            min_fallback_score: 20,
        }
    }

    /// Store-only relevance predicate used when live matches under-fill.
    pub fn fallback_predicate(&self, target: &SearchTarget) -> Predicate {
        match target {
            SearchTarget::News { query } => Predicate::EntityTextContains(query.to_lowercase()),
            SearchTarget::Social { channel } => Predicate::ChannelWithMinScore {
                subreddit: channel.canonical().to_string(),
                min_score: self.min_fallback_score,
            },
        }
    }

    /// Whether `target` belongs to this policy's domain.
    pub fn accepts(&self, target: &SearchTarget) -> bool {
        matches!(
            (self.domain, target),
            (Domain::News, SearchTarget::News { .. }) | (Domain::Social, SearchTarget::Social { .. })
        )
    }
}
