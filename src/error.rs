//! Error taxonomy for the retrieval and enrichment pipelines.
//!
//! I/O-boundary failures (`ProviderFailure`, `StoreFailure`,
//! `EnrichmentStageFailure`) are non-fatal: the retrieval engine and the
//! enrichment worker catch them at their phase/item boundary. Input errors
//! (`UnsupportedChannel`, `InvalidQuery`) surface to the caller before any I/O.

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Upstream fetch error or malformed payload.
    #[error("provider {provider} failed: {message}")]
    ProviderFailure {
        provider: &'static str,
        message: String,
    },

    /// Store lookup, query or upsert error.
    #[error("store failure: {0}")]
    StoreFailure(String),

    /// One enrichment capability failed for one item.
    #[error("enrichment stage '{stage}' failed: {message}")]
    EnrichmentStageFailure {
        stage: &'static str,
        message: String,
    },

    /// Channel input did not resolve through the canonical map.
    #[error("unsupported channel: {0}")]
    UnsupportedChannel(String),

    /// Query input rejected before retrieval.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The final result could not be rendered for the caller (HTTP 500).
    #[error("retrieval failed: {0}")]
    RetrievalFailure(String),

    /// Configuration could not be loaded or validated.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn provider(provider: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::ProviderFailure {
            provider,
            message: msg.to_string(),
        }
    }

    pub fn store(msg: impl std::fmt::Display) -> Self {
        Self::StoreFailure(msg.to_string())
    }

    pub fn stage(stage: &'static str, msg: impl std::fmt::Display) -> Self {
        Self::EnrichmentStageFailure {
            stage,
            message: msg.to_string(),
        }
    }

    /// Caller-input errors are surfaced immediately and never retried.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedChannel(_) | Self::InvalidQuery(_))
    }
}
