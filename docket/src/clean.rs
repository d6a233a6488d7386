//! Section and noise stripping: removes non-narrative boilerplate and
//! repeated headers/footers from a block of text.

use crate::config::{CleaningConfig, HeaderFooterConfig};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::{HashMap, HashSet};

/// Lines that look like chapter headings are never treated as headers.
static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(chapter|part|book)\s+").expect("valid regex"));

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n(?:[ \t]*\n){2,}").expect("valid regex"));

struct SectionRule {
    start: Regex,
    ends: Vec<Regex>,
}

/// Compiled cleaning configuration.
pub struct Cleaner {
    sections: Vec<SectionRule>,
    paragraphs: Vec<Regex>,
    thresholds: HeaderFooterConfig,
}

fn compile(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
    {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Skipping cleaning pattern '{}': {}", pattern, e);
            None
        }
    }
}

impl Cleaner {
    /// Compile all patterns once. Invalid patterns are logged and skipped.
    pub fn new(config: &CleaningConfig) -> Self {
        let sections = config
            .section_markers
            .iter()
            .filter_map(|marker| {
                let start = compile(&marker.start)?;
                let ends = marker.end.iter().filter_map(|p| compile(p)).collect();
                Some(SectionRule { start, ends })
            })
            .collect();
        let paragraphs = config
            .disallowed_paragraphs
            .iter()
            .filter_map(|p| compile(p))
            .collect();

        Self {
            sections,
            paragraphs,
            thresholds: config.header_footer.clone(),
        }
    }

    /// Run every stage in order.
    pub fn clean(&self, text: &str) -> String {
        let text = self.remove_sections(text);
        let text = self.filter_paragraphs(&text);
        self.strip_repeated_lines(&text)
    }

    /// Remove each configured section from its first start match up to the
    /// first end match after it, or to the end of the text.
    pub fn remove_sections(&self, text: &str) -> String {
        let mut text = text.to_string();
        for rule in &self.sections {
            let Some((start, start_end)) = rule.start.find(&text).map(|m| (m.start(), m.end()))
            else {
                continue;
            };

            let rest = &text[start_end..];
            let end = rule
                .ends
                .iter()
                .find_map(|re| re.find(rest))
                .map(|found| start_end + found.start())
                .unwrap_or(text.len());

            log::info!(
                "Removing section matched by '{}' ({} bytes)",
                rule.start.as_str(),
                end - start
            );
            text.replace_range(start..end, "");
        }
        text
    }

    /// Drop every line matching a disallowed-content pattern.
    pub fn filter_paragraphs(&self, text: &str) -> String {
        if self.paragraphs.is_empty() {
            return text.to_string();
        }
        let mut dropped = 0;
        let kept: Vec<&str> = text
            .split('\n')
            .filter(|line| {
                let disallowed = self.paragraphs.iter().any(|re| re.is_match(line));
                if disallowed {
                    dropped += 1;
                }
                !disallowed
            })
            .collect();
        if dropped > 0 {
            log::debug!("Dropped {} disallowed lines", dropped);
        }
        kept.join("\n")
    }

    /// Remove short lines that repeat often (running headers, page footers),
    /// then collapse blank-line runs and trim.
    pub fn strip_repeated_lines(&self, text: &str) -> String {
        let t = &self.thresholds;
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for line in text.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
            *counts.entry(line).or_insert(0) += 1;
        }

        let repeated: HashSet<&str> = counts
            .into_iter()
            .filter(|(line, count)| {
                let len = line.chars().count();
                *count >= t.min_occurrence
                    && (t.min_line_len..=t.max_line_len).contains(&len)
                    && line.split_whitespace().count() <= t.max_word_count
                    && !HEADING_LINE.is_match(line)
            })
            .map(|(line, _)| line)
            .collect();

        let stripped = if repeated.is_empty() {
            text.to_string()
        } else {
            log::info!("Removing {} repeated header/footer lines", repeated.len());
            text.split('\n')
                .map(|line| if repeated.contains(line.trim()) { "" } else { line })
                .collect::<Vec<_>>()
                .join("\n")
        };

        BLANK_RUN.replace_all(&stripped, "\n\n").trim().to_string()
    }
}

/// One-shot convenience over [`Cleaner`].
pub fn clean(text: &str, config: &CleaningConfig) -> String {
    Cleaner::new(config).clean(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NarrationConfig, SectionMarker};
    use proptest::prelude::*;

    fn config() -> CleaningConfig {
        CleaningConfig {
            section_markers: vec![
                SectionMarker {
                    start: r"^[ \t]*(Contents|Table of Contents)[ \t]*$".to_string(),
                    end: vec![r"^\s*(Chapter|Part|Book|Introduction|Prologue)\s+".to_string()],
                },
                SectionMarker {
                    start: r"^[ \t]*Index[ \t]*$".to_string(),
                    end: vec![],
                },
            ],
            disallowed_paragraphs: vec![r"^\s*Page\s+\d+\s*$".to_string()],
            header_footer: HeaderFooterConfig::default(),
        }
    }

    #[test]
    fn test_bounded_section_removed() {
        let text = "Title\n\nContents\nForeword ..... 1\nA Beginning ..... 3\n\nChapter 1\nIt began.";
        let cleaned = clean(text, &config());
        assert_eq!(cleaned, "Title\n\nChapter 1\nIt began.");
    }

    #[test]
    fn test_section_without_end_runs_to_end() {
        let text = "Story text.\n\nINDEX\napples, 4\npears, 9";
        assert_eq!(clean(text, &config()), "Story text.");
    }

    #[test]
    fn test_unmatched_end_removes_to_end() {
        let text = "Intro text.\n\nContents\nno chapters here";
        assert_eq!(clean(text, &config()), "Intro text.");
    }

    #[test]
    fn test_disallowed_lines_dropped() {
        let text = "One.\nPage 12\nTwo.";
        assert_eq!(clean(text, &config()), "One.\nTwo.");
    }

    #[test]
    fn test_repeated_header_removed() {
        let mut text = String::new();
        for i in 0..4 {
            text.push_str(&format!("THE RUNNING HEAD\nParagraph number {} here.\n\n", i));
        }
        let cleaned = clean(&text, &config());
        assert!(!cleaned.contains("THE RUNNING HEAD"));
        assert!(cleaned.contains("Paragraph number 3 here."));
        assert!(!cleaned.contains("\n\n\n"));
    }

    #[test]
    fn test_repeated_heading_kept() {
        let text = "Chapter One\nChapter One\nChapter One\nChapter One\nbody";
        assert!(clean(text, &config()).contains("Chapter One"));
    }

    #[test]
    fn test_long_repeated_line_kept() {
        let line = "This line repeats but has far too many words to be a running header at all";
        let text = vec![line; 5].join("\n");
        assert_eq!(clean(&text, &config()), text);
    }

    #[test]
    fn test_bad_pattern_is_skipped() {
        let mut config = config();
        config.disallowed_paragraphs.push("(".to_string());
        let cleaner = Cleaner::new(&config);
        assert_eq!(cleaner.paragraphs.len(), 1);
        assert_eq!(cleaner.clean("keep me"), "keep me");
    }

    #[test]
    fn test_builtin_cleaning_config() {
        let config = NarrationConfig::builtin().unwrap();
        let cleaner = Cleaner::new(&config.cleaning);
        assert_eq!(cleaner.sections.len(), config.cleaning.section_markers.len());
        let text = "Story.\n\nBibliography\nSmith, J. A Book.";
        assert_eq!(cleaner.clean(text), "Story.");
    }

    proptest! {
        #[test]
        fn prop_occurrence_threshold(count in 1usize..8) {
            let config = config();
            let min = config.header_footer.min_occurrence;
            let mut text = String::from("Opening words.\n");
            for i in 0..count {
                text.push_str(&format!("Running Head\nBody line {}.\n", i));
            }
            let cleaned = clean(&text, &config);
            prop_assert_eq!(cleaned.contains("Running Head"), count < min);
        }
    }
}
