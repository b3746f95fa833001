//! Fixed set of supported social channels (subreddits).
//!
//! Input is resolved case-insensitively through a canonical map; anything
//! unmapped is an input error and is rejected before any network call.

use crate::error::{Error, Result};

/// Canonical channel used when the caller supplies none.
pub const DEFAULT_CHANNEL: Channel = Channel::Stocks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    StockMarket,
    Stocks,
    ValueInvesting,
    Options,
    Investing,
    CryptoCurrency,
    Bogleheads,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::StockMarket,
        Channel::Stocks,
        Channel::ValueInvesting,
        Channel::Options,
        Channel::Investing,
        Channel::CryptoCurrency,
        Channel::Bogleheads,
    ];

    /// Canonical casing used by the provider and stored in documents.
    pub fn canonical(&self) -> &'static str {
        match self {
            Channel::StockMarket => "StockMarket",
            Channel::Stocks => "stocks",
            Channel::ValueInvesting => "ValueInvesting",
            Channel::Options => "Options",
            Channel::Investing => "investing",
            Channel::CryptoCurrency => "CryptoCurrency",
            Channel::Bogleheads => "Bogleheads",
        }
    }

    /// Resolve free-form user input (any casing, surrounding whitespace ok).
    pub fn resolve(input: &str) -> Result<Self> {
        let key = input.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.canonical().to_ascii_lowercase() == key)
            .ok_or_else(|| Error::UnsupportedChannel(input.trim().to_string()))
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.canonical())
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::resolve(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_case_insensitively_to_canonical() {
        assert_eq!(
            Channel::resolve("cryptocurrency").unwrap().canonical(),
            "CryptoCurrency"
        );
        assert_eq!(Channel::resolve("  STOCKS ").unwrap(), Channel::Stocks);
        assert_eq!(
            "valueInvesting".parse::<Channel>().unwrap(),
            Channel::ValueInvesting
        );
    }

    #[test]
    fn unmapped_input_is_rejected() {
        let err = Channel::resolve("notreal").unwrap_err();
        assert_eq!(err, Error::UnsupportedChannel("notreal".into()));
        assert!(Channel::resolve("").is_err());
    }
}
