//! Footnote and verse-number removal.
//!
//! Markers are first rewritten into superscript digits, then every
//! superscript character is deleted in one pass.

use super::RuleContext;
use regex::Captures;

fn to_superscript(digits: &str, ctx: &RuleContext) -> Option<String> {
    digits
        .chars()
        .map(|d| ctx.tables.superscript_digit(d))
        .collect::<Option<Vec<&str>>>()
        .map(|parts| parts.concat())
}

/// `(\p{Ll}[closing punctuation]?)(\d{1,3})\b`: a digit run glued to the end
/// of a word is a footnote marker.
pub fn superscript_trailing_digits(caps: &Captures, ctx: &RuleContext) -> String {
    let (Some(word), Some(digits)) = (caps.get(1), caps.get(2)) else {
        return caps[0].to_string();
    };
    match to_superscript(digits.as_str(), ctx) {
        Some(sup) => format!("{}{}", word.as_str(), sup),
        None => caps[0].to_string(),
    }
}

/// `(?P<prev>\S+[ \t]+)?\b(?P<num>\d{1,3})(?P<gap>[ \t]*)(?P<next>["'(]?\p{Lu}\p{L}*)`:
/// a short number right before a capitalized word is a verse number or
/// footnote, unless a numbering keyword precedes it ("Chapter 7 The") or it
/// belongs to a book name ("1 Corinthians").
pub fn superscript_verse_number(caps: &Captures, ctx: &RuleContext) -> String {
    let original = caps[0].to_string();
    let (Some(num), Some(next)) = (caps.name("num"), caps.name("next")) else {
        return original;
    };
    let prev = caps.name("prev").map(|m| m.as_str()).unwrap_or("");
    let gap = caps.name("gap").map(|m| m.as_str()).unwrap_or("");

    let prev_word: String = prev.chars().filter(|c| c.is_alphabetic()).collect();
    if !prev_word.is_empty() && ctx.tables.is_numbering_keyword(&prev_word) {
        return original;
    }

    let next_word: String = next
        .as_str()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if ctx.scripture.is_book(&next_word)
        || ctx
            .scripture
            .is_book(&format!("{} {}", num.as_str(), next_word))
    {
        return original;
    }

    match to_superscript(num.as_str(), ctx) {
        Some(sup) => format!("{}{}{}{}", prev, sup, gap, next.as_str()),
        None => original,
    }
}

/// Delete every configured superscript character.
pub fn strip_superscripts(text: &str, ctx: &RuleContext) -> String {
    let set = &ctx.tables.superscript_chars;
    if set.is_empty() {
        return text.to_string();
    }
    text.chars().filter(|c| !set.contains(*c)).collect()
}
