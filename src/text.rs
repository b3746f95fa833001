//! Text cleaning shared by the enrichment stages.
//!
//! Provider bodies arrive as HTML fragments, Reddit markdown, or plain text.
//! Every stage sees the same cleaned form so entity/summary output is stable.

use once_cell::sync::Lazy;
use regex::Regex;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static regex")
}

static RE_TAGS: Lazy<Regex> = Lazy::new(|| re(r"(?s)<[^>]*>"));
static RE_REDDIT_REF: Lazy<Regex> = Lazy::new(|| re(r"\b[/\\]?[ur]/\w+\b"));
static RE_URL: Lazy<Regex> = Lazy::new(|| re(r"https?://\S+|www\.\S+"));
static RE_WS: Lazy<Regex> = Lazy::new(|| re(r"\s+"));
static RE_LITERAL_NL: Lazy<Regex> = Lazy::new(|| re(r"(\\n)+"));
static RE_TABLE_SEP: Lazy<Regex> = Lazy::new(|| re(r"(?m)^\s*[|: -]+\|?\s*$\n?"));
static RE_TABLE_ROW: Lazy<Regex> = Lazy::new(|| re(r"(?m)^.*\|(?:.*\|)+.*$\n?"));

// (pattern, replacement) applied in order.
static MARKDOWN_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (re(r"\*\*(.*?)\*\*"), "$1"),
        (re(r"__(.*?)__"), "$1"),
        (re(r"\*(.*?)\*"), "$1"),
        (re(r"\b_(.*?)_\b"), "$1"),
        (re(r"(?m)^\s*#+\s*(.*?)\s*#*\s*$"), "$1"),
        (re(r"(?m)^\s*>\s?(.*)"), "$1"),
        (re(r"\[(.*?)\]\(.*?\)"), "$1"),
        (re(r"(?s)`{1,3}(.*?)`{1,3}"), "$1"),
        (re(r"~~(.*?)~~"), "$1"),
        (re(r"(?m)^\s*[-*_]{3,}\s*$"), ""),
        (re(r"(?m)^\s*[*\-+]\s+"), ""),
        (re(r"(?m)^\s*\d+\.\s+"), ""),
    ]
});

/// Drop pictographs, dingbats, flags and variation selectors.
pub fn strip_emojis(s: &str) -> String {
    s.chars()
        .filter(|c| {
            !matches!(*c as u32,
                0x1F300..=0x1FAFF
                | 0x2600..=0x27BF
                | 0x1F1E6..=0x1F1FF
                | 0xFE00..=0xFE0F
                | 0x200D)
        })
        .collect()
}

/// Remove common markdown formatting, keeping the visible text.
pub fn strip_markdown(s: &str) -> String {
    let mut out = s.to_string();
    for (rule, rep) in MARKDOWN_RULES.iter() {
        out = rule.replace_all(&out, *rep).into_owned();
    }
    out
}

pub fn collapse_whitespace(s: &str) -> String {
    RE_WS.replace_all(s, " ").trim().to_string()
}

/// Full cleaning pipeline applied before summarization and entity extraction.
pub fn clean_text(s: &str) -> String {
    let mut out = strip_emojis(s);
    out = RE_TAGS.replace_all(&out, "").into_owned();

    // Feeds frequently double-encode (`&amp;amp;`).
    out = html_escape::decode_html_entities(&out).into_owned();
    out = html_escape::decode_html_entities(&out).into_owned();

    out = RE_REDDIT_REF.replace_all(&out, "").into_owned();
    out = RE_LITERAL_NL.replace_all(&out, "\n").into_owned();
    out = strip_markdown(&out);
    out = RE_TABLE_SEP.replace_all(&out, "").into_owned();
    out = RE_TABLE_ROW.replace_all(&out, "").into_owned();
    out = RE_URL.replace_all(&out, "").into_owned();

    // Normalize “ ” ‘ ’ to ASCII quotes
    out = out
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    collapse_whitespace(&out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_html_entities_and_whitespace() {
        let s = "  <p>Hello,&nbsp;&amp;amp; <b>world</b></p>\n\n ";
        assert_eq!(clean_text(s), "Hello, & world");
    }

    #[test]
    fn clean_removes_urls_and_reddit_refs() {
        let s = "See r/stocks and u/someone at https://example.com/x for details";
        assert_eq!(clean_text(s), "See and at for details");
    }

    #[test]
    fn markdown_is_reduced_to_text() {
        let s = "# Header\n**bold** and [a link](http://x.y) with `code`\n- item";
        assert_eq!(clean_text(s), "Header bold and a link with code item");
    }

    #[test]
    fn emojis_are_dropped() {
        assert_eq!(clean_text("To the moon 🚀🚀 now"), "To the moon now");
    }

    #[test]
    fn tables_are_dropped() {
        let s = "Intro\n| a | b |\n|---|---|\n| 1 | 2 |\nOutro";
        assert_eq!(clean_text(s), "Intro Outro");
    }
}
