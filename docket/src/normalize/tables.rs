//! Lookup tables consumed by the normalization rules.
//!
//! Tables are plain data loaded with the configuration and never mutated
//! afterwards.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupTables {
    /// General abbreviations ("Dr." -> "Doctor")
    #[serde(default)]
    pub abbreviations: BTreeMap<String, String>,

    /// Every accepted spelling of a bible book, mapped to its spoken name
    #[serde(default)]
    pub bible_books: BTreeMap<String, String>,

    /// Citation suffixes ("f" -> "and the following verse")
    #[serde(default)]
    pub bible_suffixes: BTreeMap<String, String>,

    #[serde(default)]
    pub contractions: BTreeMap<String, String>,

    #[serde(default)]
    pub symbols: BTreeMap<String, String>,

    /// Typographic characters mapped to speech-safe replacements
    #[serde(default)]
    pub punctuation: BTreeMap<String, String>,

    #[serde(default)]
    pub latin_phrases: BTreeMap<String, String>,

    /// Whole Greek words with a fixed transliteration
    #[serde(default)]
    pub greek_words: BTreeMap<String, String>,

    /// Per-character Greek transliteration (base letters, no diacritics)
    #[serde(default)]
    pub greek_transliteration: BTreeMap<String, String>,

    /// Characters deleted as footnote markers
    #[serde(default)]
    pub superscript_chars: String,

    /// Digit -> superscript digit
    #[serde(default)]
    pub superscript_map: BTreeMap<String, String>,

    /// Tokens never treated as roman numerals
    #[serde(default)]
    pub roman_exceptions: Vec<String>,

    /// Valid numerals that are usually ordinary words ("MIX", "DID")
    #[serde(default)]
    pub roman_false_positives: Vec<String>,

    /// Words that announce a number ("chapter", "volume")
    #[serde(default)]
    pub numbering_keywords: Vec<String>,
}

impl LookupTables {
    /// Resolve a dictionary table by the name used in `dict_lookup` rules.
    pub fn dict(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        match name {
            "abbreviations" => Some(&self.abbreviations),
            "bible_books" => Some(&self.bible_books),
            "bible_suffixes" => Some(&self.bible_suffixes),
            "contractions" => Some(&self.contractions),
            "symbols" => Some(&self.symbols),
            "punctuation" => Some(&self.punctuation),
            "latin_phrases" => Some(&self.latin_phrases),
            "greek_words" => Some(&self.greek_words),
            "greek_transliteration" => Some(&self.greek_transliteration),
            _ => None,
        }
    }

    /// Superscript form of an ASCII digit, if the map has one.
    pub fn superscript_digit(&self, digit: char) -> Option<&str> {
        let mut buf = [0u8; 4];
        self.superscript_map
            .get(digit.encode_utf8(&mut buf) as &str)
            .map(String::as_str)
    }

    pub fn is_roman_exception(&self, token: &str) -> bool {
        self.roman_exceptions.iter().any(|e| e == token)
    }

    pub fn is_roman_false_positive(&self, token: &str) -> bool {
        self.roman_false_positives
            .iter()
            .any(|w| w.eq_ignore_ascii_case(token))
    }

    pub fn is_numbering_keyword(&self, word: &str) -> bool {
        self.numbering_keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(word))
    }
}

/// Table entries ordered longest key first, so a short key never shadows a
/// longer key containing it. Ties are broken by key for a stable order.
pub fn longest_first(table: &BTreeMap<String, String>) -> Vec<(&str, &str)> {
    let mut entries: Vec<(&str, &str)> = table
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    entries.sort_by(|a, b| {
        b.0.chars()
            .count()
            .cmp(&a.0.chars().count())
            .then_with(|| a.0.cmp(b.0))
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_first_ordering() {
        let mut table = BTreeMap::new();
        table.insert("St".to_string(), "Street".to_string());
        table.insert("St.".to_string(), "Saint".to_string());
        table.insert("Sts.".to_string(), "Saints".to_string());

        let keys: Vec<&str> = longest_first(&table).into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["Sts.", "St.", "St"]);
    }

    #[test]
    fn test_dict_lookup_by_name() {
        let mut tables = LookupTables::default();
        tables
            .symbols
            .insert("&".to_string(), " and ".to_string());
        assert_eq!(tables.dict("symbols").unwrap().len(), 1);
        assert!(tables.dict("unknown").is_none());
    }

    #[test]
    fn test_superscript_digit() {
        let mut tables = LookupTables::default();
        tables
            .superscript_map
            .insert("1".to_string(), "\u{00b9}".to_string());
        assert_eq!(tables.superscript_digit('1'), Some("\u{00b9}"));
        assert_eq!(tables.superscript_digit('2'), None);
    }

    #[test]
    fn test_roman_word_sets() {
        let tables = LookupTables {
            roman_exceptions: vec!["I".to_string()],
            roman_false_positives: vec!["MIX".to_string()],
            numbering_keywords: vec!["chapter".to_string()],
            ..Default::default()
        };
        assert!(tables.is_roman_exception("I"));
        assert!(!tables.is_roman_exception("i"));
        assert!(tables.is_roman_false_positive("mix"));
        assert!(tables.is_numbering_keyword("CHAPTER"));
    }
}
