//! Lexicon sentiment mapped onto the 1..=5 scale.

use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::enrich::SentimentModel;
use crate::error::{Error, Result};
use crate::model::SentimentResult;

static LEXICON: Lazy<HashMap<String, i32>> = Lazy::new(|| {
    let raw = include_str!("../../sentiment_lexicon.json");
    serde_json::from_str::<HashMap<String, i32>>(raw).unwrap_or_default()
});

const LABELS: [&str; 5] = [
    "Very negative",
    "Negative",
    "Neutral",
    "Positive",
    "Very positive",
];

/// Normalisation constant for the compound score (`s / sqrt(s² + ALPHA)`).
const ALPHA: f32 = 15.0;

#[derive(Debug, Clone, Default)]
pub struct LexiconSentiment;

impl LexiconSentiment {
    pub fn new() -> Self {
        Self
    }

    #[inline]
    fn word_score(&self, w: &str) -> i32 {
        *LEXICON.get(w).unwrap_or(&0)
    }

    /// Returns (raw score, number of lexicon hits).
    /// A negator within the previous 3 tokens flips the sign of a hit.
    pub fn score_text(&self, text: &str) -> (i32, usize) {
        let tokens: Vec<String> = tokenize(text).collect();
        let mut score = 0;
        let mut hits = 0;

        for i in 0..tokens.len() {
            let base = self.word_score(tokens[i].as_str());
            if base == 0 {
                continue;
            }
            let negated = (1..=3).any(|k| i >= k && is_negator(tokens[i - k].as_str()));
            score += if negated { -base } else { base };
            hits += 1;
        }

        (score, hits)
    }
}

impl SentimentModel for LexiconSentiment {
    fn analyze(&self, text: &str) -> Result<SentimentResult> {
        if LEXICON.is_empty() {
            return Err(Error::stage("sentiment", "sentiment lexicon failed to load"));
        }
        let (score, hits) = self.score_text(text);
        if hits == 0 {
            return Ok(SentimentResult {
                label: LABELS[2].to_string(),
                score: 3,
                confidence: 0.5,
            });
        }

        let s = score as f32;
        let compound = s / (s * s + ALPHA).sqrt();
        let class: u8 = match compound {
            c if c <= -0.6 => 1,
            c if c < -0.2 => 2,
            c if c <= 0.2 => 3,
            c if c < 0.6 => 4,
            _ => 5,
        };
        let confidence = if class == 3 {
            1.0 - compound.abs() * 2.5
        } else {
            0.5 + compound.abs() / 2.0
        };

        Ok(SentimentResult {
            label: LABELS[usize::from(class - 1)].to_string(),
            score: class,
            confidence: round4(confidence.clamp(0.0, 1.0)),
        })
    }
}

fn round4(v: f32) -> f32 {
    (v * 10_000.0).round() / 10_000.0
}

/// Lower-case word tokens; apostrophes stay inside words so "isn't" survives.
fn tokenize(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_negator(tok: &str) -> bool {
    matches!(
        tok,
        "not"
            | "no"
            | "never"
            | "isn't"
            | "wasn't"
            | "aren't"
            | "won't"
            | "can't"
            | "cannot"
            | "without"
            | "don't"
            | "doesn't"
            | "didn't"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_without_lexicon_hits() {
        let r = LexiconSentiment::new().analyze("The meeting is on Tuesday").unwrap();
        assert_eq!(r.score, 3);
        assert_eq!(r.label, "Neutral");
    }

    #[test]
    fn strong_positive_maps_high() {
        let r = LexiconSentiment::new()
            .analyze("Shares surge to a record as profits beat and analysts turn bullish")
            .unwrap();
        assert_eq!(r.score, 5);
        assert_eq!(r.label, "Very positive");
        assert!((0.0..=1.0).contains(&r.confidence));
    }

    #[test]
    fn negation_flips_sign() {
        let a = LexiconSentiment::new();
        let (plain, _) = a.score_text("growth is strong");
        let (negated, _) = a.score_text("growth isn't strong");
        assert!(plain > negated);
    }

    #[test]
    fn negative_news_maps_low() {
        let r = LexiconSentiment::new()
            .analyze("Stock plunges after fraud probe and bankruptcy fears")
            .unwrap();
        assert!(r.score <= 2);
    }
}
