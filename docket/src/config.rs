//! docket configuration: chapter sizing, cleaning rules, normalization rules
//! and lookup tables, translation backend settings.
//!
//! The complete default configuration ships embedded in the binary
//! (`config/default.toml`). A user file is merged over it key by key.

use crate::error::{DocketError, Result};
use crate::normalize::rules::Rule;
use crate::normalize::tables::LookupTables;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_CONFIG: &str = include_str!("../config/default.toml");

// Default values for chapterization
const DEFAULT_MIN_CHAPTER_WORDS: usize = 5;
const DEFAULT_MAX_CHAPTER_WORDS: usize = 8000;
const DEFAULT_PREAMBLE_MIN_CHARS: usize = 100;

// Default values for header/footer detection
const DEFAULT_MIN_OCCURRENCE: usize = 4;
const DEFAULT_MIN_LINE_LEN: usize = 3;
const DEFAULT_MAX_LINE_LEN: usize = 75;
const DEFAULT_MAX_WORD_COUNT: usize = 10;

// Default values for the translation install lock
const DEFAULT_LOCK_TIMEOUT_SECS: u64 = 120;
const DEFAULT_LOCK_POLL_MILLIS: u64 = 2000;
const DEFAULT_STALE_LOCK_SECS: u64 = 60;

/// Titles that never survive to the final chapter list.
const DEFAULT_DISALLOWED_TITLES: &[&str] = &[
    r"\btable\s+of\s+contents\b",
    r"\bcontents\b",
    r"\bappendix\b",
    r"\breferences\b",
    r"\bbibliography\b",
    r"\bindex\b",
    r"\bcopyright\b",
    r"\bpermissions\b",
    r"\bglossary\b",
    r"\backnowledg",
    r"\bcolophon\b",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NarrationConfig {
    #[serde(default)]
    pub chapters: ChapterConfig,

    pub cleaning: CleaningConfig,

    pub normalization: NormalizationConfig,

    #[serde(default)]
    pub translation: TranslationConfig,
}

/// Chapter sizing policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterConfig {
    /// Chapters with fewer normalized words are dropped
    #[serde(default = "default_min_chapter_words")]
    pub min_chapter_word_count: usize,

    /// Chapters with more normalized words are split into parts
    #[serde(default = "default_max_chapter_words")]
    pub max_chapter_word_count: usize,

    /// Untitled leading content shorter than this (in characters) is discarded
    #[serde(default = "default_preamble_min_chars")]
    pub preamble_min_chars: usize,

    /// Case-insensitive patterns matched against a chapter's original heading
    #[serde(default = "default_disallowed_titles")]
    pub disallowed_titles: Vec<String>,
}

fn default_min_chapter_words() -> usize {
    DEFAULT_MIN_CHAPTER_WORDS
}

fn default_max_chapter_words() -> usize {
    DEFAULT_MAX_CHAPTER_WORDS
}

fn default_preamble_min_chars() -> usize {
    DEFAULT_PREAMBLE_MIN_CHARS
}

fn default_disallowed_titles() -> Vec<String> {
    DEFAULT_DISALLOWED_TITLES
        .iter()
        .map(|p| p.to_string())
        .collect()
}

impl Default for ChapterConfig {
    fn default() -> Self {
        Self {
            min_chapter_word_count: default_min_chapter_words(),
            max_chapter_word_count: default_max_chapter_words(),
            preamble_min_chars: default_preamble_min_chars(),
            disallowed_titles: default_disallowed_titles(),
        }
    }
}

/// Section/noise stripper rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleaningConfig {
    /// Bounded sections to remove, checked in order
    #[serde(default)]
    pub section_markers: Vec<SectionMarker>,

    /// Lines matching any of these patterns are dropped
    #[serde(default)]
    pub disallowed_paragraphs: Vec<String>,

    #[serde(default)]
    pub header_footer: HeaderFooterConfig,
}

/// A section that starts at `start` and runs until the first match of any
/// `end` pattern, or to the end of the document when `end` is empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionMarker {
    pub start: String,

    #[serde(default)]
    pub end: Vec<String>,
}

/// Thresholds for frequency-based header/footer removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderFooterConfig {
    #[serde(default = "default_min_occurrence")]
    pub min_occurrence: usize,

    #[serde(default = "default_min_line_len")]
    pub min_line_len: usize,

    #[serde(default = "default_max_line_len")]
    pub max_line_len: usize,

    #[serde(default = "default_max_word_count")]
    pub max_word_count: usize,
}

fn default_min_occurrence() -> usize {
    DEFAULT_MIN_OCCURRENCE
}

fn default_min_line_len() -> usize {
    DEFAULT_MIN_LINE_LEN
}

fn default_max_line_len() -> usize {
    DEFAULT_MAX_LINE_LEN
}

fn default_max_word_count() -> usize {
    DEFAULT_MAX_WORD_COUNT
}

impl Default for HeaderFooterConfig {
    fn default() -> Self {
        Self {
            min_occurrence: default_min_occurrence(),
            min_line_len: default_min_line_len(),
            max_line_len: default_max_line_len(),
            max_word_count: default_max_word_count(),
        }
    }
}

/// Ordered normalization rules and the tables they read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizationConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Spoken in place of Hebrew text that cannot be translated
    #[serde(default = "default_hebrew_placeholder")]
    pub hebrew_placeholder: String,

    #[serde(default)]
    pub tables: LookupTables,
}

fn default_hebrew_placeholder() -> String {
    "Hebrew phrase".to_string()
}

/// Settings for the optional foreign-text translation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Glossary package installed on first use
    #[serde(default)]
    pub package: Option<PathBuf>,

    /// Installation directory (default: <data dir>/docket/translation)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,

    #[serde(default = "default_lock_poll_millis")]
    pub lock_poll_millis: u64,

    /// Lock files older than this are considered abandoned
    #[serde(default = "default_stale_lock_secs")]
    pub stale_lock_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_lock_timeout_secs() -> u64 {
    DEFAULT_LOCK_TIMEOUT_SECS
}

fn default_lock_poll_millis() -> u64 {
    DEFAULT_LOCK_POLL_MILLIS
}

fn default_stale_lock_secs() -> u64 {
    DEFAULT_STALE_LOCK_SECS
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            package: None,
            data_dir: None,
            lock_timeout_secs: default_lock_timeout_secs(),
            lock_poll_millis: default_lock_poll_millis(),
            stale_lock_secs: default_stale_lock_secs(),
        }
    }
}

impl TranslationConfig {
    /// Directory the glossary package is installed into.
    pub fn install_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("docket").join("translation"))
            .ok_or_else(|| DocketError::Config("Could not determine data directory".to_string()))
    }
}

impl NarrationConfig {
    /// The embedded default configuration.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_CONFIG)
    }

    /// Parse a complete configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Get the default user config path: <config dir>/docket/docket.toml
    pub fn config_path() -> Result<PathBuf> {
        dirs::config_dir()
            .or_else(dirs::home_dir)
            .map(|d| d.join("docket").join("docket.toml"))
            .ok_or_else(|| DocketError::Config("Could not determine config directory".to_string()))
    }

    /// Load the builtin configuration with a user file merged over it.
    ///
    /// An explicit `path` must exist; otherwise the default location is used
    /// when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    return Self::builtin();
                }
                default_path
            }
        };

        let content = fs::read_to_string(&path)?;
        let config = Self::with_overlay(&content)?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The builtin configuration with `overlay` merged in key by key. Tables
    /// merge recursively; any other value, arrays included, replaces the
    /// builtin one.
    pub fn with_overlay(overlay: &str) -> Result<Self> {
        let mut merged: toml::Table = toml::from_str(BUILTIN_CONFIG)?;
        merge_tables(&mut merged, toml::from_str(overlay)?);
        let config: Self = toml::Value::Table(merged).try_into()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(incoming) => match base.get_mut(&key) {
                Some(toml::Value::Table(existing)) => merge_tables(existing, incoming),
                _ => {
                    base.insert(key, toml::Value::Table(incoming));
                }
            },
            value => {
                base.insert(key, value);
            }
        }
    }
}
