//! Extractive summarizer: centrality-ranked sentences, readability-adjusted count.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::enrich::Summarizer;
use crate::error::Result;
use crate::text::{clean_text, collapse_whitespace};

static ARTIFACTS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)visit cnn\.com.*",
        r"(?i)click here to.*",
        r"(?i)cnn\.com will feature.*",
        r"(?i)for a new gallery.*",
        r"(?i)read more\s*(at|on)?\s*:?.*$",
        r"(?i)subscribe to our newsletter.*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "of", "to", "in", "on", "at", "for", "with", "by",
    "is", "are", "was", "were", "be", "been", "it", "its", "this", "that", "as", "from", "has",
    "have", "had", "will", "would", "can", "could", "i", "you", "we", "they", "he", "she",
];

#[derive(Debug, Clone)]
pub struct ExtractiveSummarizer {
    pub min_sentences: usize,
    pub max_sentences: usize,
    pub max_words: usize,
}

impl Default for ExtractiveSummarizer {
    fn default() -> Self {
        Self {
            min_sentences: 3,
            max_sentences: 6,
            max_words: 120,
        }
    }
}

impl ExtractiveSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Harder text keeps a larger share of its sentences.
    fn top_k(&self, text: &str, sentence_count: usize) -> usize {
        let ratio = match reading_ease(text, sentence_count) {
            e if e >= 60.0 => 0.2,
            e if e >= 30.0 => 0.3,
            _ => 0.4,
        };
        let k = (sentence_count as f32 * ratio) as usize;
        k.min(self.max_sentences)
            .min(sentence_count)
            .max(self.min_sentences)
    }
}

impl Summarizer for ExtractiveSummarizer {
    fn summarize(&self, body: &str) -> Result<String> {
        let cleaned = clean_text(body);
        let sentences = split_sentences(&cleaned);
        if sentences.is_empty() {
            return Ok(String::new());
        }

        let k = self.top_k(&cleaned, sentences.len());
        let picked = if sentences.len() <= k {
            sentences.clone()
        } else {
            let scores = centrality(&sentences);
            let mut idx: Vec<usize> = (0..sentences.len()).collect();
            idx.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));
            let mut top: Vec<usize> = idx.into_iter().take(k).collect();
            top.sort_unstable();
            top.into_iter().map(|i| sentences[i].clone()).collect()
        };

        let joined = truncate_words(&picked.join(" "), self.max_words);
        let mut summary = cut_at_last_full_stop(&joined);
        for re in ARTIFACTS.iter() {
            summary = re.replace_all(&summary, "").into_owned();
        }
        let summary = collapse_whitespace(&summary);

        if summary.is_empty() {
            return Ok(sentences[0].clone());
        }
        Ok(summary)
    }
}

/// Split on `.`, `!`, `?` followed by whitespace or end of text.
fn split_sentences(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        cur.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().map_or(true, |n| n.is_whitespace()) {
            let s = cur.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
            cur.clear();
        }
    }
    let rest = cur.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

fn words(s: &str) -> impl Iterator<Item = String> + '_ {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
}

/// Sum of cosine similarity of each sentence to every other sentence.
fn centrality(sentences: &[String]) -> Vec<f32> {
    let vecs: Vec<HashMap<String, f32>> = sentences
        .iter()
        .map(|s| {
            let mut tf = HashMap::new();
            for w in words(s).filter(|w| !STOPWORDS.contains(&w.as_str())) {
                *tf.entry(w).or_insert(0.0) += 1.0;
            }
            tf
        })
        .collect();

    let norms: Vec<f32> = vecs
        .iter()
        .map(|v| v.values().map(|x| x * x).sum::<f32>().sqrt())
        .collect();

    (0..vecs.len())
        .map(|i| {
            (0..vecs.len())
                .filter(|&j| j != i && norms[i] > 0.0 && norms[j] > 0.0)
                .map(|j| {
                    let dot: f32 = vecs[i]
                        .iter()
                        .filter_map(|(w, a)| vecs[j].get(w).map(|b| a * b))
                        .sum();
                    dot / (norms[i] * norms[j])
                })
                .sum()
        })
        .collect()
}

/// Flesch reading ease with a vowel-group syllable estimate.
fn reading_ease(text: &str, sentence_count: usize) -> f32 {
    let ws: Vec<String> = words(text).collect();
    if ws.is_empty() || sentence_count == 0 {
        return 100.0;
    }
    let syllables: usize = ws.iter().map(|w| syllable_estimate(w)).sum();
    let wps = ws.len() as f32 / sentence_count as f32;
    let spw = syllables as f32 / ws.len() as f32;
    206.835 - 1.015 * wps - 84.6 * spw
}

fn syllable_estimate(word: &str) -> usize {
    let mut groups = 0;
    let mut prev_vowel = false;
    for c in word.chars() {
        let v = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if v && !prev_vowel {
            groups += 1;
        }
        prev_vowel = v;
    }
    if word.ends_with('e') && groups > 1 {
        groups -= 1;
    }
    groups.max(1)
}

fn truncate_words(s: &str, max: usize) -> String {
    s.split_whitespace().take(max).collect::<Vec<_>>().join(" ")
}

/// Drop a trailing partial sentence, if any full stop exists.
fn cut_at_last_full_stop(s: &str) -> String {
    match s.rfind('.') {
        Some(i) => s[..=i].to_string(),
        None => s.to_string(),
    }
}
