//! Scripture citation rewriting.
//!
//! Three shapes are recognised in one left-to-right scan:
//! - a heading line holding only `<book> <chapter>`
//! - a bracketed group of `;`-separated references
//! - an inline `<book> <chapter>:<verses>`
//!
//! Abbreviated entries inside brackets ("v. 5", "9:3") resolve against the
//! most recently seen book and chapter. When a group does not parse as a
//! reference list, only the inline citations inside it are rewritten and the
//! rest of the bracket is kept as written.

use super::RuleContext;
use super::numbers::number_to_words;
use super::tables::{LookupTables, longest_first};
use regex::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;

const VERSES: &str = r"\d{1,3}(?:\s*[-\x{2013}\x{2014}]\s*\d{1,3})?(?:\s*,\s*\d{1,3}(?:\s*[-\x{2013}\x{2014}]\s*\d{1,3})?)*(?:ff|f)?\b";

/// Book lookup and the patterns derived from the `bible_books` table.
pub(crate) struct ScriptureIndex {
    books: HashMap<String, String>,
    patterns: Option<Patterns>,
}

struct Patterns {
    scan: Regex,
    inline: Regex,
    chapter_only: Regex,
    with_verses: Regex,
    verses_only: Regex,
}

/// Last explicit book and chapter seen in the current text.
#[derive(Debug, Default)]
struct ReferenceContext {
    book: Option<String>,
    chapter: Option<u64>,
}

impl ScriptureIndex {
    pub(crate) fn new(tables: &LookupTables) -> Self {
        let books = tables
            .bible_books
            .iter()
            .map(|(k, v)| (book_key(k), v.clone()))
            .collect();

        let patterns = match Patterns::build(tables) {
            Ok(patterns) => patterns,
            Err(e) => {
                log::warn!("Scripture patterns disabled: {}", e);
                None
            }
        };

        Self { books, patterns }
    }

    /// Whether `word` is a known spelling of a book.
    pub(crate) fn is_book(&self, word: &str) -> bool {
        self.books.contains_key(&book_key(word))
    }

    fn spoken_name(&self, book: &str) -> Option<&str> {
        self.books.get(&book_key(book)).map(String::as_str)
    }
}

impl Patterns {
    fn build(tables: &LookupTables) -> Result<Option<Self>, regex::Error> {
        if tables.bible_books.is_empty() {
            return Ok(None);
        }
        let books = longest_first(&tables.bible_books)
            .into_iter()
            .map(|(k, _)| regex::escape(k.trim()).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");

        let inline =
            format!(r"\b(?P<ibook>{books})\.?\s+(?P<ich>\d{{1,3}}):(?P<iverses>{VERSES})");
        let scan = format!(
            r"(?P<heading>^[ \t]*(?P<hbook>{books})\.?[ \t]+(?P<hch>\d{{1,3}})[ \t]*$)|(?P<bracket>[\(\[][^\)\]\n]*\d[^\)\]\n]*[\)\]])|(?P<inline>{inline})"
        );
        let chapter_only = format!(r"^(?P<book>{books})\.?\s+(?P<ch>\d{{1,3}})$");
        let with_verses =
            format!(r"^(?:(?P<book>{books})\.?\s+)?(?P<ch>\d{{1,3}}):(?P<verses>{VERSES})$");
        let verses_only = format!(r"^(?:vv?\.|ver\.|verses?)\s*(?P<verses>{VERSES})$");

        let build = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .multi_line(true)
                .build()
        };

        Ok(Some(Self {
            scan: build(&scan)?,
            inline: build(&inline)?,
            chapter_only: build(&chapter_only)?,
            with_verses: build(&with_verses)?,
            verses_only: build(&verses_only)?,
        }))
    }
}

fn book_key(book: &str) -> String {
    book.trim()
        .trim_end_matches('.')
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Rewrite every recognised citation into spoken form.
pub fn normalize_scripture(text: &str, ctx: &RuleContext) -> String {
    let index = ctx.scripture;
    let Some(patterns) = &index.patterns else {
        return text.to_string();
    };

    let mut context = ReferenceContext::default();
    patterns
        .scan
        .replace_all(text, |caps: &Captures| {
            rewrite(caps, index, patterns, ctx.tables, &mut context)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn rewrite(
    caps: &Captures,
    index: &ScriptureIndex,
    patterns: &Patterns,
    tables: &LookupTables,
    context: &mut ReferenceContext,
) -> Option<String> {
    if caps.name("heading").is_some() {
        let (book, chapter) = (caps.name("hbook")?, caps.name("hch")?);
        let leading = caps[0]
            .find(|c: char| !c.is_whitespace())
            .map(|i| &caps[0][..i])
            .unwrap_or("");
        let spoken = chapter_heading(index, book.as_str(), chapter.as_str(), context)?;
        return Some(format!("{}{}", leading, spoken));
    }

    if let Some(group) = caps.name("bracket") {
        let group = group.as_str();
        let inner = &group[1..group.len() - 1];
        if let Some(spoken) = rewrite_group(inner, index, patterns, tables, context) {
            return Some(spoken);
        }
        return Some(rewrite_inline(group, index, patterns, tables, context));
    }

    inline_citation(caps, index, tables, context)
}

fn inline_citation(
    caps: &Captures,
    index: &ScriptureIndex,
    tables: &LookupTables,
    context: &mut ReferenceContext,
) -> Option<String> {
    let (book, chapter, verses) = (caps.name("ibook")?, caps.name("ich")?, caps.name("iverses")?);
    citation(
        index,
        tables,
        Some(book.as_str()),
        Some(chapter.as_str()),
        verses.as_str(),
        context,
    )
}

/// Rewrite inline citations in `text`, leaving everything else untouched.
fn rewrite_inline(
    text: &str,
    index: &ScriptureIndex,
    patterns: &Patterns,
    tables: &LookupTables,
    context: &mut ReferenceContext,
) -> String {
    patterns
        .inline
        .replace_all(text, |caps: &Captures| {
            inline_citation(caps, index, tables, context).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Every entry must resolve, otherwise the caller falls back to inline
/// citations. Context updates from a failed group are discarded.
fn rewrite_group(
    inner: &str,
    index: &ScriptureIndex,
    patterns: &Patterns,
    tables: &LookupTables,
    context: &mut ReferenceContext,
) -> Option<String> {
    let mut local = ReferenceContext {
        book: context.book.clone(),
        chapter: context.chapter,
    };
    let mut spoken = Vec::new();

    for entry in inner.split(';').map(str::trim) {
        if entry.is_empty() {
            return None;
        }
        let rendered = if let Some(caps) = patterns.chapter_only.captures(entry) {
            chapter_heading(index, &caps["book"], &caps["ch"], &mut local)?
        } else if let Some(caps) = patterns.with_verses.captures(entry) {
            citation(
                index,
                tables,
                caps.name("book").map(|m| m.as_str()),
                Some(&caps["ch"]),
                &caps["verses"],
                &mut local,
            )?
        } else if let Some(caps) = patterns.verses_only.captures(entry) {
            citation(index, tables, None, None, &caps["verses"], &mut local)?
        } else {
            return None;
        };
        spoken.push(rendered);
    }

    *context = local;
    Some(spoken.join("; "))
}

fn chapter_heading(
    index: &ScriptureIndex,
    book: &str,
    chapter: &str,
    context: &mut ReferenceContext,
) -> Option<String> {
    let name = index.spoken_name(book)?.to_string();
    let chapter: u64 = chapter.parse().ok()?;
    let spoken = format!("{} chapter {}", name, number_to_words(chapter));
    context.book = Some(name);
    context.chapter = Some(chapter);
    Some(spoken)
}

/// `<book> chapter <n>, verse(s) <list>`. Missing book or chapter comes from
/// the context; the context is updated to the resolved pair.
fn citation(
    index: &ScriptureIndex,
    tables: &LookupTables,
    book: Option<&str>,
    chapter: Option<&str>,
    verses: &str,
    context: &mut ReferenceContext,
) -> Option<String> {
    let name = match book {
        Some(book) => index.spoken_name(book)?.to_string(),
        None => context.book.clone()?,
    };
    let chapter = match chapter {
        Some(ch) => ch.parse().ok()?,
        None => context.chapter?,
    };
    let verses = render_verses(verses, tables)?;

    let spoken = format!("{} chapter {}, {}", name, number_to_words(chapter), verses);
    context.book = Some(name);
    context.chapter = Some(chapter);
    Some(spoken)
}

fn render_verses(verses: &str, tables: &LookupTables) -> Option<String> {
    let trimmed = verses.trim();
    let lower = trimmed.to_lowercase();
    let (body, suffix) = if lower.ends_with("ff") {
        (&trimmed[..trimmed.len() - 2], Some("ff"))
    } else if lower.ends_with('f') {
        (&trimmed[..trimmed.len() - 1], Some("f"))
    } else {
        (trimmed, None)
    };

    let mut items = Vec::new();
    let mut plural = suffix == Some("ff");
    for item in body.split(',').map(str::trim) {
        match item.split_once(['-', '\u{2013}', '\u{2014}']) {
            Some((start, end)) => {
                let start: u64 = start.trim().parse().ok()?;
                let end: u64 = end.trim().parse().ok()?;
                items.push(format!(
                    "{} through {}",
                    number_to_words(start),
                    number_to_words(end)
                ));
                plural = true;
            }
            None => items.push(number_to_words(item.parse().ok()?)),
        }
    }
    if items.len() > 1 {
        plural = true;
    }

    let list = match items.split_last() {
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
        None => return None,
    };
    let mut spoken = format!("{} {}", if plural { "verses" } else { "verse" }, list);
    if let Some(suffix) = suffix {
        let words = tables.bible_suffixes.get(suffix)?;
        spoken.push(' ');
        spoken.push_str(words);
    }
    Some(spoken)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables() -> LookupTables {
        let mut tables = LookupTables::default();
        for (k, v) in [
            ("Romans", "Romans"),
            ("Rom", "Romans"),
            ("John", "John"),
            ("Jn", "John"),
            ("1 Corinthians", "First Corinthians"),
            ("1 Cor", "First Corinthians"),
            ("Psalm", "Psalm"),
        ] {
            tables.bible_books.insert(k.to_string(), v.to_string());
        }
        tables
            .bible_suffixes
            .insert("f".to_string(), "and the following verse".to_string());
        tables
            .bible_suffixes
            .insert("ff".to_string(), "and following".to_string());
        tables
    }

    fn run(text: &str) -> String {
        let tables = tables();
        let scripture = ScriptureIndex::new(&tables);
        let ctx = RuleContext {
            tables: &tables,
            scripture: &scripture,
            translator: None,
            hebrew_placeholder: "",
        };
        normalize_scripture(text, &ctx)
    }

    #[test]
    fn test_heading_line() {
        assert_eq!(run("Romans 8\nText"), "Romans chapter eight\nText");
    }

    #[test]
    fn test_inline_reference() {
        assert_eq!(
            run("As John 3:16 says"),
            "As John chapter three, verse sixteen says"
        );
        assert_eq!(
            run("see 1 Cor 13:4-7, 13"),
            "see First Corinthians chapter thirteen, verses four through seven and thirteen"
        );
    }

    #[test]
    fn test_bracketed_entries_inherit_context() {
        assert_eq!(
            run("Romans 8\n(ROM 8:1\u{2013}16; v. 28; 9:3)"),
            "Romans chapter eight\nRomans chapter eight, verses one through sixteen; Romans chapter eight, verse twenty-eight; Romans chapter nine, verse three"
        );
    }

    #[test]
    fn test_suffixes() {
        assert_eq!(
            run("Psalm 23:1f"),
            "Psalm chapter twenty-three, verse one and the following verse"
        );
        assert_eq!(
            run("Psalm 23:1ff"),
            "Psalm chapter twenty-three, verses one and following"
        );
    }

    #[test]
    fn test_unresolvable_group_unchanged() {
        assert_eq!(run("(v. 5)"), "(v. 5)");
        assert_eq!(run("(see page 3)"), "(see page 3)");
    }

    #[test]
    fn test_citation_inside_prose_bracket() {
        assert_eq!(
            run("Read (see John 3:16) today."),
            "Read (see John chapter three, verse sixteen) today."
        );
        assert_eq!(
            run("Read (John 3:16 NIV) today."),
            "Read (John chapter three, verse sixteen NIV) today."
        );
        assert_eq!(
            run("(Jn 3:16; note 4)"),
            "(John chapter three, verse sixteen; note 4)"
        );
    }

    #[test]
    fn test_prose_bracket_sets_context() {
        assert_eq!(
            run("(compare Rom 8:1) and (v. 5)"),
            "(compare Romans chapter eight, verse one) and Romans chapter eight, verse five"
        );
    }

    #[test]
    fn test_context_does_not_leak_between_calls() {
        run("Romans 8");
        assert_eq!(run("(v. 5)"), "(v. 5)");
    }

    #[test]
    fn test_is_book() {
        let scripture = ScriptureIndex::new(&tables());
        assert!(scripture.is_book("rom"));
        assert!(scripture.is_book("1  Corinthians"));
        assert!(!scripture.is_book("There"));
    }

    #[test]
    fn test_empty_table_is_noop() {
        let tables = LookupTables::default();
        let scripture = ScriptureIndex::new(&tables);
        let ctx = RuleContext {
            tables: &tables,
            scripture: &scripture,
            translator: None,
            hebrew_placeholder: "",
        };
        assert_eq!(normalize_scripture("Romans 8:1", &ctx), "Romans 8:1");
    }
}
