//! Heading grammars and display titles.

use super::RawChapter;
use crate::normalize::roman::parse_roman;
use crate::normalize::title_case;
use once_cell::sync::Lazy;
use regex::Regex;

/// `Chapter|Part|Book|Section <number or roman> [:.-] <title>` on its own line.
static NUMBERED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?P<kw>chapter|part|book|section)[ \t]+(?P<num>\d+|[ivxlcdm]+)\b[ \t]*[:.\-\x{2013}\x{2014}]?[ \t]*(?P<title>[^\n]*)$",
    )
    .expect("valid regex")
});

/// Fixed front- and back-matter section names.
static NAMED_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?P<named>prologue|epilogue|introduction|appendix|acknowledge?ments|dedication|foreword|preface|title[ \t]*page)\b[ \t]*[:.\-\x{2013}\x{2014}]?[ \t]*(?P<rest>[^\n]{0,60})$",
    )
    .expect("valid regex")
});

/// Leading numbering stripped from declared titles.
static NUMBER_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(chapter|part|book|section)\s+(\d+|[ivxlcdm]+)\b[\s:.\-\x{2013}\x{2014}]*")
        .expect("valid regex")
});

fn is_roman_word(word: &str) -> bool {
    !word.is_empty()
        && word.chars().all(|c| "IVXLCDM".contains(c))
        && parse_roman(word).is_some()
}

/// Title-case a heading, leaving uppercase roman numerals alone.
pub fn heading_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if is_roman_word(word.trim_matches(|c: char| !c.is_alphanumeric())) {
                word.to_string()
            } else {
                title_case(word)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Display title for a declared outline title: a leading
/// "Chapter <n>" style prefix is dropped, otherwise the title is title-cased.
pub fn display_title(declared: &str) -> String {
    let declared = declared.split_whitespace().collect::<Vec<_>>().join(" ");
    if let Some(prefix) = NUMBER_PREFIX.find(&declared) {
        let rest = declared[prefix.end()..].trim();
        if !rest.is_empty() {
            return rest.to_string();
        }
    }
    heading_case(&declared)
}

struct Heading {
    start: usize,
    title: String,
    original: String,
}

fn numbered_headings(text: &str) -> Vec<Heading> {
    NUMBERED_HEADING
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let num = caps.name("num")?.as_str();
            let num = if num.chars().all(|c| c.is_ascii_digit()) {
                num.to_string()
            } else {
                let upper = num.to_uppercase();
                // "Part civil", "Book did": not numerals
                parse_roman(&upper)?;
                upper
            };
            let keyword = title_case(&caps.name("kw")?.as_str().to_lowercase());
            let rest = caps.name("title").map(|m| m.as_str().trim()).unwrap_or("");
            let title = if rest.is_empty() {
                format!("{} {}", keyword, num)
            } else {
                format!("{} {}: {}", keyword, num, heading_case(rest))
            };
            Some(Heading {
                start: whole.start(),
                title,
                original: whole.as_str().trim().to_string(),
            })
        })
        .collect()
}

fn named_headings(text: &str) -> Vec<Heading> {
    NAMED_HEADING
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let named = caps.name("named")?.as_str();
            let named = named.split_whitespace().collect::<Vec<_>>().join(" ");
            let rest = caps.name("rest").map(|m| m.as_str().trim()).unwrap_or("");
            let title = if rest.is_empty() {
                heading_case(&named.to_lowercase())
            } else {
                heading_case(&format!("{} {}", named.to_lowercase(), rest))
            };
            Some(Heading {
                start: whole.start(),
                title,
                original: whole.as_str().trim().to_string(),
            })
        })
        .collect()
}

/// Cut `text` at every recognised heading. Content before the first heading
/// longer than `preamble_min_chars` becomes an "Introduction" chapter; a text
/// with no heading at all becomes one "Full Document" chapter.
pub fn split_by_headings(text: &str, preamble_min_chars: usize) -> Vec<RawChapter> {
    let mut headings = numbered_headings(text);
    headings.extend(named_headings(text));
    headings.sort_by_key(|h| h.start);
    headings.dedup_by_key(|h| h.start);

    if headings.is_empty() {
        let content = text.trim();
        if content.is_empty() {
            return Vec::new();
        }
        log::info!("No headings found, using the whole document");
        return vec![RawChapter::new("Full Document", "Full Document", content)];
    }

    let mut chapters = Vec::with_capacity(headings.len() + 1);
    let preamble = text[..headings[0].start].trim();
    if preamble.chars().count() > preamble_min_chars {
        chapters.push(RawChapter::new("Introduction", "Introduction", preamble));
    }

    for (i, heading) in headings.iter().enumerate() {
        let end = headings.get(i + 1).map(|h| h.start).unwrap_or(text.len());
        let content = text[heading.start..end].trim();
        log::debug!("Heading '{}' at byte {}", heading.original, heading.start);
        chapters.push(RawChapter::new(&heading.title, &heading.original, content));
    }
    chapters
}
