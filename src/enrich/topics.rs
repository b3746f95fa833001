//! Keyword topic model: labelled keyword sets scored by share of hits.

use serde::Deserialize;

use crate::enrich::TopicModel;
use crate::error::{Error, Result};
use crate::model::Topic;
use crate::policy::Domain;

const NEWS_TOPICS: &str = include_str!("../../config/topics_news.toml");
const SOCIAL_TOPICS: &str = include_str!("../../config/topics_social.toml");

fn default_max_topics() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
struct TopicFile {
    #[serde(default = "default_max_topics")]
    max_topics: usize,
    #[serde(default)]
    topics: Vec<TopicCfg>,
}

#[derive(Debug, Clone, Deserialize)]
struct TopicCfg {
    label: String,
    keywords: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KeywordTopicModel {
    max_topics: usize,
    // (label, keywords as token sequences)
    topics: Vec<(String, Vec<Vec<String>>)>,
}

impl KeywordTopicModel {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let file: TopicFile =
            toml::from_str(s).map_err(|e| Error::Config(format!("topic config: {e}")))?;
        let topics = file
            .topics
            .into_iter()
            .map(|t| {
                let kws = t
                    .keywords
                    .iter()
                    .map(|k| tokenize(k))
                    .filter(|k| !k.is_empty())
                    .collect();
                (t.label, kws)
            })
            .collect();
        Ok(Self {
            max_topics: file.max_topics.max(1),
            topics,
        })
    }

    /// Embedded label set for `domain`.
    pub fn builtin(domain: Domain) -> Result<Self> {
        match domain {
            Domain::News => Self::from_toml_str(NEWS_TOPICS),
            Domain::Social => Self::from_toml_str(SOCIAL_TOPICS),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|(l, _)| l.as_str())
    }
}

impl TopicModel for KeywordTopicModel {
    fn extract(&self, text: &str) -> Result<Vec<Topic>> {
        let tokens = tokenize(text);
        let mut counts: Vec<(&str, usize)> = self
            .topics
            .iter()
            .map(|(label, kws)| {
                let hits = kws.iter().map(|kw| count_sequence(&tokens, kw)).sum();
                (label.as_str(), hits)
            })
            .filter(|(_, hits)| *hits > 0)
            .collect();

        let total: usize = counts.iter().map(|(_, h)| h).sum();
        if total == 0 {
            return Ok(Vec::new());
        }

        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        Ok(counts
            .into_iter()
            .take(self.max_topics)
            .map(|(label, hits)| Topic {
                label: label.to_string(),
                score: ((hits as f32 / total as f32) * 10_000.0).round() / 10_000.0,
            })
            .collect())
    }
}

fn tokenize(s: &str) -> Vec<String> {
    s.split(|c: char| !(c.is_alphanumeric() || c == '&'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

fn count_sequence(tokens: &[String], seq: &[String]) -> usize {
    if seq.is_empty() || tokens.len() < seq.len() {
        return 0;
    }
    tokens.windows(seq.len()).filter(|w| *w == seq).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sets_load() {
        assert!(KeywordTopicModel::builtin(Domain::News)
            .unwrap()
            .labels()
            .any(|l| l == "Tesla & Electric Vehicles"));
        assert!(KeywordTopicModel::builtin(Domain::Social)
            .unwrap()
            .labels()
            .any(|l| l == "Crypto Trading & Sentiment"));
    }

    #[test]
    fn most_relevant_first_and_capped() {
        let m = KeywordTopicModel::builtin(Domain::News).unwrap();
        let topics = m
            .extract("Tesla EV battery deliveries rise; Tesla charging network grows. Nvidia chip demand. Fed holds rates. Dividend from Exxon.")
            .unwrap();
        assert_eq!(topics.len(), 3);
        assert_eq!(topics[0].label, "Tesla & Electric Vehicles");
        assert!(topics.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn multi_word_keywords_match_as_sequences() {
        let m = KeywordTopicModel::from_toml_str(
            r#"
            [[topics]]
            label = "EV"
            keywords = ["electric vehicle"]
            "#,
        )
        .unwrap();
        let t = m.extract("An electric vehicle maker, not a vehicle electric").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].score, 1.0);
        assert!(m.extract("nothing relevant").unwrap().is_empty());
    }
}
