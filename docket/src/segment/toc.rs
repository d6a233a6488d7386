//! Outline-driven strategies: structural extraction and TOC-title splitting.

use super::RawChapter;
use super::headings::display_title;
use super::split::word_count;
use crate::source::{DocumentSource, OutlineNode, markup_to_text};
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::HashSet;

/// A structural chapter boundary exposed by a document format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocReference {
    pub declared_title: String,
    pub internal_ref: String,
}

/// Flatten a nested outline into document order. Iterative, so a malformed
/// deeply nested outline cannot exhaust the stack.
pub fn flatten_outline(outline: &[OutlineNode]) -> Vec<TocReference> {
    let mut refs = Vec::new();
    let mut stack: Vec<&OutlineNode> = outline.iter().rev().collect();
    while let Some(node) = stack.pop() {
        let title = node.title.trim();
        if !title.is_empty() && !node.reference.is_empty() {
            refs.push(TocReference {
                declared_title: title.to_string(),
                internal_ref: node.reference.clone(),
            });
        }
        stack.extend(node.children.iter().rev());
    }
    refs
}

/// Resolve every reference to its content. A reference that fails to resolve
/// is logged and skipped; fragments without words are discarded.
pub fn extract_structural(
    source: &mut dyn DocumentSource,
    refs: &[TocReference],
) -> Vec<RawChapter> {
    let mut seen = HashSet::new();
    let mut chapters = Vec::new();

    for reference in refs {
        if !seen.insert(reference.internal_ref.as_str()) {
            log::debug!("Duplicate outline target {}", reference.internal_ref);
            continue;
        }
        match source.resolve(&reference.internal_ref) {
            Ok(markup) => {
                let text = markup_to_text(&markup);
                if word_count(&text) == 0 {
                    log::debug!("Outline entry '{}' has no text", reference.declared_title);
                    continue;
                }
                chapters.push(RawChapter::new(
                    display_title(&reference.declared_title),
                    &reference.declared_title,
                    text,
                ));
            }
            Err(e) => {
                log::warn!(
                    "Skipping outline entry '{}': {}",
                    reference.declared_title,
                    e
                );
            }
        }
    }
    chapters
}

fn is_all_caps(title: &str) -> bool {
    title.chars().any(|c| c.is_alphabetic()) && !title.chars().any(|c| c.is_lowercase())
}

fn title_patterns(title: &str) -> Vec<Regex> {
    let escaped = title
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");

    let patterns = if is_all_caps(title) {
        let is_word = |c: char| c.is_alphanumeric() || c == '_';
        let lead = if title.chars().next().is_some_and(is_word) { r"\b" } else { "" };
        let trail = if title.chars().last().is_some_and(is_word) { r"\b" } else { "" };
        vec![(format!("{}{}{}", lead, escaped, trail), false)]
    } else {
        // A line holding only the title beats a line starting with it
        vec![
            (format!(r"^[ \t]*{}[ \t]*$", escaped), true),
            (format!(r"^[ \t]*{}", escaped), true),
        ]
    };

    patterns
        .into_iter()
        .filter_map(|(pattern, insensitive)| {
            RegexBuilder::new(&pattern)
                .case_insensitive(insensitive)
                .multi_line(true)
                .build()
                .map_err(|e| log::warn!("Cannot search for title '{}': {}", title, e))
                .ok()
        })
        .collect()
}

/// Byte span of the first match at or after `from`.
fn find_title(text: &str, title: &str, from: usize) -> Option<(usize, usize)> {
    title_patterns(title)
        .iter()
        .find_map(|re| re.find_at(text, from))
        .map(|m| (m.start(), m.end()))
}

/// Cut the flat text at each declared title, searching forward in outline
/// order. Text before the first title longer than `preamble_min_chars`
/// becomes an "Introduction" chapter.
pub fn split_by_titles(
    text: &str,
    refs: &[TocReference],
    preamble_min_chars: usize,
) -> Vec<RawChapter> {
    let mut cuts: Vec<(usize, &TocReference)> = Vec::new();
    let mut cursor = 0;
    for reference in refs {
        let title = reference.declared_title.trim();
        if title.is_empty() {
            continue;
        }
        match find_title(text, title, cursor) {
            Some((start, end)) => {
                cuts.push((start, reference));
                cursor = end;
            }
            None => log::debug!("Title '{}' not found in text", title),
        }
    }
    if cuts.is_empty() {
        return Vec::new();
    }

    let mut chapters = Vec::with_capacity(cuts.len() + 1);
    let preamble = text[..cuts[0].0].trim();
    if preamble.chars().count() > preamble_min_chars {
        chapters.push(RawChapter::new("Introduction", "Introduction", preamble));
    }
    for (i, (start, reference)) in cuts.iter().enumerate() {
        let end = cuts.get(i + 1).map(|(pos, _)| *pos).unwrap_or(text.len());
        let content = text[*start..end].trim();
        if content.is_empty() {
            continue;
        }
        chapters.push(RawChapter::new(
            display_title(&reference.declared_title),
            &reference.declared_title,
            content,
        ));
    }
    chapters
}

/// Chapters from a table of contents printed in the text itself.
///
/// No parser exists yet; the cascade moves on to the heading scan.
pub fn split_by_text_toc(text: &str) -> Vec<RawChapter> {
    log::debug!("Text ToC parsing not available ({} bytes skipped)", text.len());
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DocketError, Result};

    fn outline() -> Vec<OutlineNode> {
        vec![
            OutlineNode::new("Part One", "part1.xhtml").with_children(vec![
                OutlineNode::new("Chapter 1: Dawn", "ch1.xhtml"),
                OutlineNode::new("Chapter 2: Dusk", "ch2.xhtml")
                    .with_children(vec![OutlineNode::new("A Scene", "ch2.xhtml#scene")]),
            ]),
            OutlineNode::new("Epilogue", "epilogue.xhtml"),
            OutlineNode::new("   ", "blank.xhtml"),
        ]
    }

    struct FakeSource;

    impl DocumentSource for FakeSource {
        fn text(&mut self) -> Result<String> {
            Ok(String::new())
        }

        fn resolve(&mut self, reference: &str) -> Result<String> {
            match reference {
                "ch1.xhtml" => Ok("<h1>Chapter 1</h1><p>The sun rose.</p>".to_string()),
                "ch2.xhtml" => Ok("<p>   </p>".to_string()),
                "epilogue.xhtml" => Ok("<p>It ended.</p>".to_string()),
                other => Err(DocketError::UnresolvedReference(other.to_string())),
            }
        }
    }

    #[test]
    fn test_flatten_in_document_order() {
        let refs = flatten_outline(&outline());
        let titles: Vec<&str> = refs.iter().map(|r| r.declared_title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Part One", "Chapter 1: Dawn", "Chapter 2: Dusk", "A Scene", "Epilogue"]
        );
    }

    #[test]
    fn test_flatten_deep_outline() {
        let mut node = OutlineNode::new("Leaf", "leaf.xhtml");
        for i in 0..2_000 {
            node = OutlineNode::new(format!("Level {}", i), format!("l{}.xhtml", i))
                .with_children(vec![node]);
        }
        let refs = flatten_outline(std::slice::from_ref(&node));
        assert_eq!(refs.len(), 2_001);
        assert_eq!(refs[0].declared_title, "Level 1999");
        assert_eq!(refs.last().unwrap().declared_title, "Leaf");
    }

    #[test]
    fn test_structural_skips_failures_and_empty_fragments() {
        let refs = flatten_outline(&outline());
        let chapters = extract_structural(&mut FakeSource, &refs);
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Dawn", "Epilogue"]);
        assert!(chapters[0].content.contains("The sun rose."));
        assert_eq!(chapters[0].original_title, "Chapter 1: Dawn");
    }

    #[test]
    fn test_split_by_titles_with_introduction() {
        let preamble = "Some opening remarks that run on for a while. ".repeat(4);
        let text = format!(
            "{}\nThe First Day\nMorning came.\n\nTHE SECOND DAY\nEvening fell.",
            preamble
        );
        let refs = vec![
            TocReference {
                declared_title: "The First Day".to_string(),
                internal_ref: "a".to_string(),
            },
            TocReference {
                declared_title: "THE SECOND DAY".to_string(),
                internal_ref: "b".to_string(),
            },
        ];
        let chapters = split_by_titles(&text, &refs, 100);
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Introduction", "The First Day", "The Second Day"]);
        assert!(chapters[1].content.contains("Morning came."));
        assert!(!chapters[1].content.contains("Evening fell."));
        assert!(chapters[2].content.contains("Evening fell."));
    }

    #[test]
    fn test_all_caps_title_needs_word_boundary() {
        let refs = vec![TocReference {
            declared_title: "END".to_string(),
            internal_ref: "x".to_string(),
        }];
        let chapters = split_by_titles("We SPEND days.\nTHE END", &refs, 100);
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters[0].content, "END");
    }

    #[test]
    fn test_search_resumes_after_matched_span() {
        // Declared with extra spaces, so the match is shorter than the title
        let refs = vec![
            TocReference {
                declared_title: "The   Night".to_string(),
                internal_ref: "a".to_string(),
            },
            TocReference {
                declared_title: "Day".to_string(),
                internal_ref: "b".to_string(),
            },
        ];
        let chapters = split_by_titles("The Night\nDay\nMorning again.", &refs, 100);
        let titles: Vec<&str> = chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["The Night", "Day"]);
        assert_eq!(chapters[1].content, "Day\nMorning again.");
    }

    #[test]
    fn test_titles_not_found() {
        let refs = vec![TocReference {
            declared_title: "Missing".to_string(),
            internal_ref: "x".to_string(),
        }];
        assert!(split_by_titles("Nothing here", &refs, 100).is_empty());
    }

    #[test]
    fn test_text_toc_placeholder() {
        assert!(split_by_text_toc("Contents\nChapter 1 ... 3").is_empty());
    }
}
