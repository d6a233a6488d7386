//! Paragraph-bounded splitting of oversized chapters.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

pub(crate) fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split `text` into parts of at most `max_words` words, cutting only
/// between paragraphs. A single paragraph above the cap forms its own part.
/// A cap of zero disables splitting.
pub fn split_paragraphs(text: &str, max_words: usize) -> Vec<String> {
    if max_words == 0 || word_count(text) <= max_words {
        return vec![text.to_string()];
    }

    let mut parts = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for paragraph in PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let words = word_count(paragraph);
        if current_words + words > max_words && !current.is_empty() {
            parts.push(current.join("\n\n"));
            current.clear();
            current_words = 0;
        }
        current.push(paragraph);
        current_words += words;
    }
    if !current.is_empty() {
        parts.push(current.join("\n\n"));
    }
    parts
}
