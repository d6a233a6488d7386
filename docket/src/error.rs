//! Error types for the docket library.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocketError {
    #[error("No text could be extracted from {0}")]
    NoContent(String),

    #[error("Failed to open EPUB {}: {message}", .path.display())]
    Epub { path: PathBuf, message: String },

    #[error("Reference could not be resolved: {0}")]
    UnresolvedReference(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Timed out after {waited_secs}s waiting for lock {}", .path.display())]
    LockTimeout { path: PathBuf, waited_secs: u64 },

    #[error("Translation unavailable: {0}")]
    Translation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, DocketError>;
