//! Pattern-based entity extraction.
//!
//! Patterns come from `*.json` files in `ENTITY_CONFIG_DIR` (each file holds
//! `{ "patterns": [ { "regex": "...", "label": "ORG" } ] }`). When the variable
//! is unset, or the directory yields no usable pattern, the built-in set is used.
//! A pattern with a capture group contributes the first group as entity text.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::enrich::EntityExtractor;
use crate::error::Result;
use crate::model::Entity;
use crate::text::{clean_text, collapse_whitespace};

pub const ENTITY_CONFIG_DIR_ENV: &str = "ENTITY_CONFIG_DIR";

const BUILTIN: &[(&str, &str)] = &[
    (r"\$([A-Z]{1,5})\b", "TICKER"),
    (
        r"(?i)\b(apple|alphabet|google|microsoft|tesla|amazon|nvidia|meta|netflix|intel|jp ?morgan|goldman sachs|alibaba|samsung|amd|boeing|deepseek|openai|berkshire hathaway|exxon|chevron)\b",
        "ORG",
    ),
    (
        r"\b((?:[A-Z][A-Za-z&]+\s+)+(?:Inc|Corp|Corporation|Ltd|LLC|Group|Holdings|Bank|Co)\.?)",
        "ORG",
    ),
    (
        r"\b(Federal Reserve|Fed|SEC|Treasury|Nasdaq|NYSE|S&P 500|Dow Jones)\b",
        "ORG",
    ),
    (
        r"\b(United States|U\.S\.|US|China|Japan|Germany|Europe|India|UK|Russia|Taiwan|Wall Street)\b",
        "LOC",
    ),
    (
        r"(?i)(\$\d[\d,]*(?:\.\d+)?(?:\s*(?:trillion|billion|million|bn|mln|m|k)\b)?)",
        "MONEY",
    ),
    (r"(\d+(?:\.\d+)?\s?%)", "PERCENT"),
];

#[derive(Debug, Deserialize)]
struct PatternCfg {
    regex: String,
    label: String,
}

#[derive(Debug, Deserialize)]
struct PatternFile {
    #[serde(default)]
    patterns: Vec<PatternCfg>,
}

#[derive(Debug, Clone)]
pub struct PatternEntityExtractor {
    patterns: Vec<(Regex, String)>,
}

impl PatternEntityExtractor {
    pub fn builtin() -> Self {
        let patterns = BUILTIN
            .iter()
            .filter_map(|(re, label)| Regex::new(re).ok().map(|r| (r, label.to_string())))
            .collect();
        Self { patterns }
    }

    /// Load every `*.json` pattern file in `dir`. Unreadable files and invalid
    /// regexes are skipped with a warning.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut patterns = Vec::new();

        let Ok(read_dir) = fs::read_dir(dir) else {
            return Self { patterns };
        };
        let mut paths: Vec<_> = read_dir
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("json"))
            .collect();
        paths.sort();

        for path in paths {
            let parsed = fs::read_to_string(&path)
                .map_err(|e| e.to_string())
                .and_then(|s| serde_json::from_str::<PatternFile>(&s).map_err(|e| e.to_string()));
            let file = match parsed {
                Ok(f) => f,
                Err(e) => {
                    warn!(target: "enrich", path = %path.display(), error = %e, "skipping entity pattern file");
                    continue;
                }
            };
            for p in file.patterns {
                match Regex::new(&p.regex) {
                    Ok(re) => patterns.push((re, p.label)),
                    Err(e) => {
                        warn!(target: "enrich", regex = %p.regex, error = %e, "invalid entity pattern")
                    }
                }
            }
        }
        Self { patterns }
    }

    /// `ENTITY_CONFIG_DIR` if it yields patterns, else the built-in set.
    pub fn from_env() -> Self {
        if let Ok(dir) = std::env::var(ENTITY_CONFIG_DIR_ENV) {
            let ex = Self::from_dir(&dir);
            if !ex.is_empty() {
                debug!(target: "enrich", dir = %dir, patterns = ex.len(), "entity patterns loaded");
                return ex;
            }
            warn!(target: "enrich", dir = %dir, "no entity patterns found, using built-in set");
        }
        Self::builtin()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl EntityExtractor for PatternEntityExtractor {
    fn extract(&self, title: &str, summary: &str) -> Result<Vec<Entity>> {
        let text = clean_text(&format!("{title}. {summary}"));
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for (re, label) in &self.patterns {
            for caps in re.captures_iter(&text) {
                let Some(m) = caps.get(1).or_else(|| caps.get(0)) else {
                    continue;
                };
                let value = collapse_whitespace(m.as_str());
                if value.is_empty() {
                    continue;
                }
                let ent = Entity {
                    text: value,
                    label: label.clone(),
                };
                if seen.insert(ent.clone()) {
                    out.push(ent);
                }
            }
        }
        Ok(out)
    }
}
