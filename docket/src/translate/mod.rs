//! Optional translation backend for foreign-script runs.
//!
//! The backend is a glossary package installed once into the local data
//! directory. Any failure along the way leaves the process without a backend
//! and the normalizer falls back to its placeholder.

mod lock;

pub use lock::{InstallLock, LockPolicy};

use crate::config::TranslationConfig;
use crate::error::{DocketError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

const GLOSSARY_FILE: &str = "glossary.toml";
const LOCK_FILE: &str = ".install.lock";

/// Translation backend trait.
pub trait Translator: Send + Sync {
    /// Translate `text` from `source_lang` into `target_lang`.
    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;
}

/// On-disk glossary package.
#[derive(Debug, Deserialize)]
struct GlossaryFile {
    source: String,
    target: String,
    #[serde(default)]
    words: HashMap<String, String>,
}

/// Word-by-word glossary translation. A single unknown word fails the whole
/// phrase, so partial translations are never spoken.
#[derive(Debug)]
pub struct GlossaryTranslator {
    source: String,
    target: String,
    words: HashMap<String, String>,
}

impl GlossaryTranslator {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: GlossaryFile = toml::from_str(&content)?;
        Ok(Self::new(file.source, file.target, file.words))
    }

    pub fn new(source: String, target: String, words: HashMap<String, String>) -> Self {
        let words = words
            .into_iter()
            .map(|(k, v)| (glossary_key(&k), v))
            .collect();
        Self {
            source,
            target,
            words,
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Vowel points and cantillation marks are ignored when matching.
fn glossary_key(word: &str) -> String {
    word.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

impl Translator for GlossaryTranslator {
    fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        if source_lang != self.source || target_lang != self.target {
            return Err(DocketError::Translation(format!(
                "glossary translates {} to {}, not {} to {}",
                self.source, self.target, source_lang, target_lang
            )));
        }

        let mut out = Vec::new();
        for word in text.split_whitespace() {
            let key = glossary_key(word.trim_matches(|c: char| !c.is_alphanumeric()));
            match self.words.get(&key) {
                Some(english) => out.push(english.as_str()),
                None => {
                    return Err(DocketError::Translation(format!(
                        "no glossary entry for '{}'",
                        word
                    )));
                }
            }
        }
        Ok(out.join(" "))
    }
}

/// Install the configured glossary package unless it is already present.
///
/// Returns the path of the installed glossary.
pub fn ensure_installed(config: &TranslationConfig) -> Result<PathBuf> {
    let install_dir = config.install_dir()?;
    let installed = install_dir.join(GLOSSARY_FILE);
    if installed.exists() {
        return Ok(installed);
    }

    let package = config
        .package
        .as_ref()
        .ok_or_else(|| DocketError::Translation("no glossary package configured".to_string()))?;

    fs::create_dir_all(&install_dir)?;
    let policy = LockPolicy {
        timeout: Duration::from_secs(config.lock_timeout_secs),
        poll: Duration::from_millis(config.lock_poll_millis),
        stale_after: Duration::from_secs(config.stale_lock_secs),
    };
    let _lock = InstallLock::acquire(&install_dir.join(LOCK_FILE), policy)?;

    // Another worker may have finished while we waited
    if installed.exists() {
        log::debug!("Glossary installed by another worker");
        return Ok(installed);
    }

    log::info!(
        "Installing translation glossary from {}",
        package.display()
    );
    let staging = install_dir.join(format!("{}.partial", GLOSSARY_FILE));
    if let Err(e) = publish(package, &staging, &installed) {
        if let Err(cleanup) = fs::remove_file(&staging) {
            if cleanup.kind() != std::io::ErrorKind::NotFound {
                log::warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
        }
        return Err(e);
    }

    Ok(installed)
}

/// Copy `package` to `staging`, validate it, then move it into place.
fn publish(package: &Path, staging: &Path, installed: &Path) -> Result<()> {
    fs::copy(package, staging)?;
    GlossaryTranslator::load(staging)?;
    fs::rename(staging, installed)?;
    Ok(())
}

/// Install (if needed) and load the backend described by `config`.
pub fn open_backend(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    if !config.enabled {
        return Err(DocketError::Translation("translation disabled".to_string()));
    }
    let glossary = ensure_installed(config)?;
    let translator = GlossaryTranslator::load(&glossary)?;
    log::debug!("Loaded glossary with {} entries", translator.len());
    Ok(Arc::new(translator))
}

static SHARED_BACKEND: OnceLock<Option<Arc<dyn Translator>>> = OnceLock::new();

/// Process-wide backend, initialised on first call. Later calls return the
/// first result regardless of `config`.
pub fn shared_backend(config: &TranslationConfig) -> Option<Arc<dyn Translator>> {
    SHARED_BACKEND
        .get_or_init(|| backend_or_placeholder(config))
        .clone()
}

/// A missing package is the normal unconfigured state and only logged at
/// debug; any other failure is a warning.
fn backend_or_placeholder(config: &TranslationConfig) -> Option<Arc<dyn Translator>> {
    match open_backend(config) {
        Ok(backend) => Some(backend),
        Err(e) if config.package.is_none() => {
            log::debug!("No translation glossary configured, using placeholder: {}", e);
            None
        }
        Err(e) => {
            log::warn!("Translation backend unavailable, using placeholder: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const GLOSSARY: &str = r#"
source = "he"
target = "en"

[words]
"אמן" = "amen"
"שלום" = "peace"
"#;

    fn config(temp_dir: &TempDir) -> TranslationConfig {
        let package = temp_dir.path().join("package.toml");
        fs::write(&package, GLOSSARY).unwrap();
        TranslationConfig {
            package: Some(package),
            data_dir: Some(temp_dir.path().join("data")),
            lock_timeout_secs: 1,
            lock_poll_millis: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_glossary_translates_known_words() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&config(&temp_dir)).unwrap();
        assert_eq!(backend.translate("אמן שלום", "he", "en").unwrap(), "amen peace");
    }

    #[test]
    fn test_points_are_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&config(&temp_dir)).unwrap();
        // shin with shin dot, qamats
        assert_eq!(
            backend
                .translate("\u{05e9}\u{05c1}\u{05b8}\u{05dc}\u{05d5}\u{05b9}\u{05dd}", "he", "en")
                .unwrap(),
            "peace"
        );
    }

    #[test]
    fn test_unknown_word_fails_whole_phrase() {
        let temp_dir = TempDir::new().unwrap();
        let backend = open_backend(&config(&temp_dir)).unwrap();
        assert!(backend.translate("אמן תורה", "he", "en").is_err());
        assert!(backend.translate("אמן", "el", "en").is_err());
    }

    #[test]
    fn test_install_is_done_once() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        let first = ensure_installed(&config).unwrap();
        assert!(first.exists());
        assert!(!first.with_file_name(LOCK_FILE).exists());

        // Package removal does not matter once installed
        fs::remove_file(config.package.as_ref().unwrap()).unwrap();
        let second = ensure_installed(&config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_package_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config = TranslationConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };
        assert!(open_backend(&config).is_err());
    }

    #[test]
    fn test_disabled_backend() {
        let temp_dir = TempDir::new().unwrap();
        let config = TranslationConfig {
            enabled: false,
            ..config(&temp_dir)
        };
        assert!(open_backend(&config).is_err());
    }

    #[test]
    fn test_invalid_package_is_not_published() {
        let temp_dir = TempDir::new().unwrap();
        let config = config(&temp_dir);
        fs::write(config.package.as_ref().unwrap(), "not = [valid").unwrap();
        assert!(ensure_installed(&config).is_err());
        let install_dir = config.install_dir().unwrap();
        assert!(!install_dir.join(GLOSSARY_FILE).exists());
        assert!(!install_dir.join(format!("{}.partial", GLOSSARY_FILE)).exists());
        assert!(!install_dir.join(LOCK_FILE).exists());
    }

    #[test]
    fn test_unconfigured_backend_falls_back_to_placeholder() {
        let temp_dir = TempDir::new().unwrap();
        let unconfigured = TranslationConfig {
            data_dir: Some(temp_dir.path().join("unconfigured")),
            ..Default::default()
        };
        assert!(backend_or_placeholder(&unconfigured).is_none());
        assert!(backend_or_placeholder(&config(&temp_dir)).is_some());
    }
}
