//! docket - turn long-form documents into narration-ready chapters.
//!
//! The pipeline has three stages, used in this order:
//! - [`clean`]: strip non-narrative sections and repeated headers/footers
//! - [`segment`]: find chapter boundaries, then filter, split and renumber
//! - [`normalize`]: rewrite text into speakable words through ordered rules
//!
//! [`source`] supplies text and outlines from TXT and EPUB files, and
//! [`translate`] provides the optional backend for foreign-script text.

pub mod clean;
pub mod config;
pub mod error;
pub mod normalize;
pub mod segment;
pub mod source;
pub mod translate;

pub use clean::Cleaner;
pub use config::NarrationConfig;
pub use error::{DocketError, Result};
pub use normalize::RuleEngine;
pub use segment::{Chapter, PartInfo, Segmenter};
pub use source::{DocumentSource, EpubSource, PlainTextSource};
pub use translate::Translator;
