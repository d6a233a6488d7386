//! Document sources: where the segmenter gets flat text and, for formats
//! that have one, a native outline.

pub mod epub;

pub use self::epub::EpubSource;

use crate::error::{DocketError, Result};
use crate::segment::RawChapter;
use html2text::render::text_renderer::TrivialDecorator;
use std::fs;
use std::path::Path;

/// Line width handed to html2text; wide enough that paragraphs never wrap.
const RENDER_WIDTH: usize = 10_000;

/// One entry of a native outline (an EPUB navigation point).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    pub title: String,
    /// Opaque internal link, resolved by the source that produced it
    pub reference: String,
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(title: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            reference: reference.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<OutlineNode>) -> Self {
        self.children = children;
        self
    }
}

/// Extraction collaborator consumed by the segmenter.
pub trait DocumentSource {
    /// Flat extracted text of the whole document.
    fn text(&mut self) -> Result<String>;

    /// Title from document metadata, if the format carries one.
    fn title(&self) -> Option<String> {
        None
    }

    /// Native outline in document order; empty when the format has none.
    fn outline(&mut self) -> Vec<OutlineNode> {
        Vec::new()
    }

    /// Markup of the fragment an outline reference points at.
    fn resolve(&mut self, reference: &str) -> Result<String> {
        Err(DocketError::UnresolvedReference(reference.to_string()))
    }

    /// Format-specific layout heuristics. None by default.
    fn layout_chapters(&mut self) -> Vec<RawChapter> {
        Vec::new()
    }
}

/// Pre-extracted plain text.
#[derive(Debug, Clone)]
pub struct PlainTextSource {
    text: String,
}

impl PlainTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn open(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::new(String::from_utf8_lossy(&bytes).replace("\r\n", "\n")))
    }
}

impl DocumentSource for PlainTextSource {
    fn text(&mut self) -> Result<String> {
        if self.text.trim().is_empty() {
            return Err(DocketError::NoContent("plain text input".to_string()));
        }
        Ok(self.text.clone())
    }
}

/// Pick a source by file extension: `.epub` is parsed, anything else is read
/// as UTF-8 text.
pub fn open(path: &Path) -> Result<Box<dyn DocumentSource>> {
    let is_epub = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("epub"));
    if is_epub {
        Ok(Box::new(EpubSource::open(path)?))
    } else {
        Ok(Box::new(PlainTextSource::open(path)?))
    }
}

/// Convert markup to plain text, keeping line structure and collapsing runs
/// of blank lines to a single paragraph break.
pub fn markup_to_text(html: &str) -> String {
    let text =
        html2text::from_read_with_decorator(html.as_bytes(), RENDER_WIDTH, TrivialDecorator::new());

    let mut result = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !result.is_empty() {
            result.push_str(if blank_run { "\n\n" } else { "\n" });
        }
        blank_run = false;
        result.push_str(trimmed);
    }
    result
}
