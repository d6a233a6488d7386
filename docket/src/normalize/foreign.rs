//! Foreign-script runs: Hebrew goes through the translation backend, Greek is
//! transliterated locally.

use super::RuleContext;
use super::tables::longest_first;
use regex::Captures;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// `[\x{0590}-\x{05FF}]+(?:\s+[\x{0590}-\x{05FF}]+)*`
pub fn translate_hebrew(caps: &Captures, ctx: &RuleContext) -> String {
    let phrase = &caps[0];
    let Some(translator) = ctx.translator else {
        return ctx.hebrew_placeholder.to_string();
    };
    match translator.translate(phrase, "he", "en") {
        Ok(english) if !english.trim().is_empty() => english.trim().to_string(),
        Ok(_) => ctx.hebrew_placeholder.to_string(),
        Err(e) => {
            log::warn!("Hebrew translation failed, using placeholder: {}", e);
            ctx.hebrew_placeholder.to_string()
        }
    }
}

/// A run of Greek words. Whole words from `greek_words` win; everything else
/// is stripped of diacritics and mapped per character.
pub fn transliterate_greek(caps: &Captures, ctx: &RuleContext) -> String {
    let words = longest_first(&ctx.tables.greek_words);
    caps[0]
        .split_whitespace()
        .map(|word| {
            let bare = strip_diacritics(word);
            words
                .iter()
                .find(|(k, _)| *k == word || strip_diacritics(k) == bare)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| transliterate_chars(&bare, ctx))
        })
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_diacritics(word: &str) -> String {
    word.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

fn transliterate_chars(word: &str, ctx: &RuleContext) -> String {
    let mut buf = [0u8; 4];
    word.chars()
        .filter_map(|c| {
            ctx.tables
                .greek_transliteration
                .get(c.encode_utf8(&mut buf) as &str)
                .cloned()
        })
        .collect()
}
