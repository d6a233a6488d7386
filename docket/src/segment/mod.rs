//! Chapter segmentation: a strategy cascade that finds chapter boundaries,
//! followed by uniform filtering, cleaning, normalization, splitting and
//! renumbering.
//!
//! Strategies, first non-empty result wins:
//!
//! 1. structural extraction from the document's native outline
//! 2. outline titles located in the flat text
//! 3. format-specific layout heuristics
//! 4. a table of contents printed in the text
//! 5. a heading scan over the flat text

mod headings;
mod split;
mod toc;

pub use headings::{display_title, heading_case, split_by_headings};
pub use split::split_paragraphs;
pub use toc::{TocReference, extract_structural, flatten_outline, split_by_text_toc, split_by_titles};

use crate::clean::Cleaner;
use crate::config::{ChapterConfig, NarrationConfig};
use crate::error::Result;
use crate::normalize::RuleEngine;
use crate::source::DocumentSource;
use crate::translate::Translator;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use split::word_count;
use std::sync::Arc;

/// Position of a part within a chapter that was split for length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartInfo {
    pub index: usize,
    pub total: usize,
}

impl PartInfo {
    pub fn single() -> Self {
        Self { index: 1, total: 1 }
    }

    pub fn is_split(&self) -> bool {
        self.total > 1
    }
}

/// A bounded, numbered, narration-ready chapter.
#[derive(Debug, Clone, Serialize)]
pub struct Chapter {
    pub number: usize,
    pub title: String,
    pub original_title: String,
    pub content: String,
    /// Words in the normalized content
    pub word_count: usize,
    pub part_info: PartInfo,
}

/// A chapter candidate before post-processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChapter {
    pub title: String,
    pub original_title: String,
    pub content: String,
}

impl RawChapter {
    pub fn new(
        title: impl Into<String>,
        original_title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            original_title: original_title.into(),
            content: content.into(),
        }
    }
}

/// Segments documents into chapters. Built once per configuration; holds
/// no per-document state.
pub struct Segmenter {
    chapters: ChapterConfig,
    disallowed: Vec<Regex>,
    cleaner: Cleaner,
    engine: RuleEngine,
}

impl Segmenter {
    pub fn new(config: &NarrationConfig) -> Self {
        let disallowed = config
            .chapters
            .disallowed_titles
            .iter()
            .filter_map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| log::warn!("Skipping disallowed title '{}': {}", pattern, e))
                    .ok()
            })
            .collect();

        Self {
            chapters: config.chapters.clone(),
            disallowed,
            cleaner: Cleaner::new(&config.cleaning),
            engine: RuleEngine::new(&config.normalization),
        }
    }

    /// Hand foreign-text translation to `translator`.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.engine = self.engine.with_translator(translator);
        self
    }

    pub fn cleaner(&self) -> &Cleaner {
        &self.cleaner
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Segment a document. An empty list means no strategy produced a
    /// chapter that survived filtering; `NoContent` from the source is
    /// propagated.
    pub fn segment(&self, source: &mut dyn DocumentSource) -> Result<Vec<Chapter>> {
        let raw = self.find_chapters(source)?;
        log::debug!("{} chapter candidates", raw.len());
        Ok(self.finish(raw))
    }

    /// The whole text as one cleaned and normalized "Full Document" chapter.
    pub fn whole_document(&self, text: &str) -> Chapter {
        let content = self.engine.normalize(&self.cleaner.clean(text));
        Chapter {
            number: 1,
            title: "Full Document".to_string(),
            original_title: "Full Document".to_string(),
            word_count: word_count(&content),
            content,
            part_info: PartInfo::single(),
        }
    }

    fn find_chapters(&self, source: &mut dyn DocumentSource) -> Result<Vec<RawChapter>> {
        let refs = flatten_outline(&source.outline());
        if !refs.is_empty() {
            let chapters = extract_structural(source, &refs);
            if !chapters.is_empty() {
                log::info!("Using document outline ({} chapters)", chapters.len());
                return Ok(chapters);
            }
            log::warn!("Outline has {} entries but no content resolved", refs.len());
        }

        let text = source.text()?;
        let text = self.cleaner.strip_repeated_lines(&text);

        if !refs.is_empty() {
            let chapters = split_by_titles(&text, &refs, self.chapters.preamble_min_chars);
            if !chapters.is_empty() {
                log::info!("Using outline titles found in text ({} chapters)", chapters.len());
                return Ok(chapters);
            }
        }

        let chapters = source.layout_chapters();
        if !chapters.is_empty() {
            log::info!("Using layout heuristics ({} chapters)", chapters.len());
            return Ok(chapters);
        }

        let chapters = split_by_text_toc(&text);
        if !chapters.is_empty() {
            log::info!("Using printed table of contents ({} chapters)", chapters.len());
            return Ok(chapters);
        }

        let chapters = split_by_headings(&text, self.chapters.preamble_min_chars);
        log::info!("Using heading scan ({} chapters)", chapters.len());
        Ok(chapters)
    }

    fn is_disallowed(&self, original_title: &str) -> bool {
        self.disallowed.iter().any(|re| re.is_match(original_title))
    }

    fn finish(&self, raw: Vec<RawChapter>) -> Vec<Chapter> {
        let mut chapters = Vec::new();

        for candidate in raw {
            if self.is_disallowed(&candidate.original_title) {
                log::debug!("Dropping disallowed chapter '{}'", candidate.original_title);
                continue;
            }

            let content = self.engine.normalize(&self.cleaner.clean(&candidate.content));
            let words = word_count(&content);
            if words < self.chapters.min_chapter_word_count {
                log::debug!("Dropping short chapter '{}' ({} words)", candidate.title, words);
                continue;
            }

            let parts = split_paragraphs(&content, self.chapters.max_chapter_word_count);
            let total = parts.len();
            if total > 1 {
                log::debug!("Splitting '{}' into {} parts", candidate.title, total);
            }
            for (i, part) in parts.into_iter().enumerate() {
                chapters.push(Chapter {
                    number: 0,
                    title: candidate.title.clone(),
                    original_title: candidate.original_title.clone(),
                    word_count: word_count(&part),
                    content: part,
                    part_info: PartInfo { index: i + 1, total },
                });
            }
        }

        for (i, chapter) in chapters.iter_mut().enumerate() {
            chapter.number = i + 1;
        }
        chapters
    }
}
