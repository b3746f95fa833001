//! # Data model
//! Live items (`RawItem`) and persisted, enriched documents (`EnrichedDocument`).
//!
//! `natural_key` is the join key between both views and is carried through
//! every layer unmodified. On the wire it is rendered as `id`; instants are
//! rendered as UTC ISO-8601 with a literal `Z` suffix.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain-specific extras carried by social posts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialMeta {
    pub subreddit: String,
    pub score: i64,
    pub num_comments: u64,
}

/// An item fetched live from a provider, not yet enriched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub natural_key: String,
    pub title: String,
    pub body: String,
    pub link: String,
    #[serde(with = "iso_z::option", default)]
    pub published_at: Option<DateTime<Utc>>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social: Option<SocialMeta>,
}

impl RawItem {
    /// `title + " " + body`, trimmed. Input for sentiment and topic stages.
    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.body).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub label: String,
    /// 1 (very negative) ..= 5 (very positive)
    pub score: u8,
    /// 0.0 ..= 1.0
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub label: String,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub label: String,
}

/// The persisted unit of retrieval. Exactly one per `natural_key` in a store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedDocument {
    #[serde(rename = "id")]
    pub natural_key: String,
    pub title: String,
    #[serde(rename = "content")]
    pub body: String,
    pub link: String,
    pub source: String,
    pub sentiment: SentimentResult,
    /// Most relevant first.
    pub topics: Vec<Topic>,
    #[serde(rename = "ner_results")]
    pub entities: Vec<Entity>,
    pub summary: String,
    #[serde(rename = "publishDate", with = "iso_z::option", default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(with = "iso_z")]
    pub processed_at: DateTime<Utc>,
    #[serde(default, flatten)]
    pub social: Option<SocialMeta>,
}

impl EnrichedDocument {
    /// Case-insensitive containment over entity texts.
    pub fn has_entity_containing(&self, needle_lower: &str) -> bool {
        self.entities
            .iter()
            .any(|e| e.text.to_lowercase().contains(needle_lower))
    }
}

/// UTC ISO-8601 with a literal `Z`. Unparseable input deserializes to `None`
/// in the optional variant so such documents sort last instead of failing.
pub mod iso_z {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(dt: &DateTime<Utc>) -> String {
        dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_str(&format(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(de)?;
        parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}")))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            ser: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => ser.serialize_some(&super::format(dt)),
                None => ser.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            de: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw: Option<String> = Option::deserialize(de)?;
            Ok(raw.as_deref().and_then(super::parse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn doc() -> EnrichedDocument {
        EnrichedDocument {
            natural_key: "https://news.test/a".into(),
            title: "Tesla beats".into(),
            body: "body".into(),
            link: "https://news.test/a".into(),
            source: "Reuters".into(),
            sentiment: SentimentResult {
                label: "Positive".into(),
                score: 4,
                confidence: 0.8,
            },
            topics: vec![],
            entities: vec![Entity {
                text: "Tesla Inc".into(),
                label: "ORG".into(),
            }],
            summary: "Tesla beats estimates.".into(),
            published_at: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap()),
            processed_at: Utc.with_ymd_and_hms(2025, 3, 1, 13, 0, 0).unwrap(),
            social: None,
        }
    }

    #[test]
    fn serializes_identity_as_id_and_instants_with_z() {
        let v = serde_json::to_value(doc()).unwrap();
        assert_eq!(v["id"], "https://news.test/a");
        assert!(v.get("natural_key").is_none());
        assert_eq!(v["publishDate"], "2025-03-01T12:30:00Z");
        assert_eq!(v["processed_at"], "2025-03-01T13:00:00Z");
        assert!(v.get("subreddit").is_none());
    }

    #[test]
    fn social_extras_are_flattened() {
        let mut d = doc();
        d.social = Some(SocialMeta {
            subreddit: "stocks".into(),
            score: 42,
            num_comments: 7,
        });
        let v = serde_json::to_value(&d).unwrap();
        assert_eq!(v["subreddit"], "stocks");
        assert_eq!(v["score"], 42);
        let back: EnrichedDocument = serde_json::from_value(v).unwrap();
        assert_eq!(back.social, d.social);
    }

    #[test]
    fn unparseable_publish_date_becomes_none() {
        let mut v = serde_json::to_value(doc()).unwrap();
        v["publishDate"] = serde_json::json!("yesterday-ish");
        let back: EnrichedDocument = serde_json::from_value(v).unwrap();
        assert!(back.published_at.is_none());
    }

    #[test]
    fn entity_containment_is_case_insensitive() {
        assert!(doc().has_entity_containing("tesla"));
        assert!(!doc().has_entity_containing("apple"));
    }
}
