//! Compile-time registry of the functions and callbacks rules refer to by name.

use super::RuleContext;
use super::{footnotes, foreign, numbers, roman, scripture, text};
use regex::Captures;

/// Whole-text transform.
pub type TextFn = fn(&str, &RuleContext) -> String;

/// Per-match transform; the return value replaces the whole match.
pub type MatchFn = fn(&Captures, &RuleContext) -> String;

const FUNCTIONS: &[(&str, TextFn)] = &[
    ("strip_control_characters", text::strip_control_characters),
    ("collapse_periods", text::collapse_periods),
    ("collapse_whitespace", text::collapse_whitespace),
    ("normalize_scripture", scripture::normalize_scripture),
    ("strip_superscripts", footnotes::strip_superscripts),
];

const CALLBACKS: &[(&str, MatchFn)] = &[
    ("expand_roman_numeral", roman::expand_roman_numeral),
    ("expand_currency", numbers::expand_currency),
    ("expand_time", numbers::expand_time),
    ("expand_ordinal", numbers::expand_ordinal),
    ("expand_number", numbers::expand_number),
    ("superscript_trailing_digits", footnotes::superscript_trailing_digits),
    ("superscript_verse_number", footnotes::superscript_verse_number),
    ("translate_hebrew", foreign::translate_hebrew),
    ("transliterate_greek", foreign::transliterate_greek),
];

pub fn function(name: &str) -> Option<TextFn> {
    FUNCTIONS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}

pub fn callback(name: &str) -> Option<MatchFn> {
    CALLBACKS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, f)| *f)
}
