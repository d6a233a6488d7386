//! Declarative normalization rules and their compiled form.

use super::registry::{self, MatchFn, TextFn};
use super::tables::{LookupTables, longest_first};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// One normalization step. The rule list is ordered and order is load-bearing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Whole-text transform from the function registry
    Function { name: String },

    /// Regex substitution; `replacement` may reference groups (`$1`)
    Regex {
        pattern: String,
        replacement: String,
        #[serde(default)]
        flags: Vec<RegexFlag>,
    },

    /// Each match is rewritten by a named callback
    RegexCallback {
        pattern: String,
        callback: String,
        #[serde(default)]
        flags: Vec<RegexFlag>,
    },

    /// Replace every key of a lookup table with its value
    DictLookup {
        table: String,
        #[serde(default)]
        word_boundary: bool,
        /// Match every key case-sensitively
        #[serde(default)]
        case_sensitive: bool,
        /// Keys matched case-sensitively when `case_sensitive` is off
        #[serde(default)]
        case_sensitive_keys: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegexFlag {
    IgnoreCase,
    MultiLine,
    DotMatchesNewLine,
}

impl Rule {
    /// Short description for logs.
    pub fn label(&self) -> String {
        match self {
            Rule::Function { name } => format!("function:{}", name),
            Rule::Regex { pattern, .. } => format!("regex:{}", pattern),
            Rule::RegexCallback { callback, .. } => format!("callback:{}", callback),
            Rule::DictLookup { table, .. } => format!("dict:{}", table),
        }
    }
}

/// A rule whose pattern, function, or table has been resolved.
pub(crate) enum CompiledRule {
    Function {
        func: TextFn,
    },
    Regex {
        regex: Regex,
        replacement: String,
    },
    RegexCallback {
        regex: Regex,
        callback: MatchFn,
    },
    DictLookup {
        entries: Vec<(Regex, String)>,
    },
}

impl CompiledRule {
    /// Resolve a rule. Errors describe why the rule has to be skipped.
    pub(crate) fn compile(rule: &Rule, tables: &LookupTables) -> Result<Self, String> {
        match rule {
            Rule::Function { name } => registry::function(name)
                .map(|func| CompiledRule::Function { func })
                .ok_or_else(|| format!("unknown function '{}'", name)),
            Rule::Regex {
                pattern,
                replacement,
                flags,
            } => Ok(CompiledRule::Regex {
                regex: build_regex(pattern, flags)?,
                replacement: replacement.clone(),
            }),
            Rule::RegexCallback {
                pattern,
                callback,
                flags,
            } => {
                let callback = registry::callback(callback)
                    .ok_or_else(|| format!("unknown callback '{}'", callback))?;
                Ok(CompiledRule::RegexCallback {
                    regex: build_regex(pattern, flags)?,
                    callback,
                })
            }
            Rule::DictLookup {
                table,
                word_boundary,
                case_sensitive,
                case_sensitive_keys,
            } => {
                let dict = tables
                    .dict(table)
                    .ok_or_else(|| format!("unknown table '{}'", table))?;
                let mut entries = Vec::with_capacity(dict.len());
                for (key, value) in longest_first(dict) {
                    if key.is_empty() {
                        continue;
                    }
                    let sensitive =
                        *case_sensitive || case_sensitive_keys.iter().any(|k| k == key);
                    let pattern = key_pattern(key, *word_boundary);
                    let regex = RegexBuilder::new(&pattern)
                        .case_insensitive(!sensitive)
                        .build()
                        .map_err(|e| format!("bad key '{}' in table '{}': {}", key, table, e))?;
                    entries.push((regex, value.to_string()));
                }
                Ok(CompiledRule::DictLookup { entries })
            }
        }
    }
}

fn build_regex(pattern: &str, flags: &[RegexFlag]) -> Result<Regex, String> {
    let mut builder = RegexBuilder::new(pattern);
    for flag in flags {
        match flag {
            RegexFlag::IgnoreCase => builder.case_insensitive(true),
            RegexFlag::MultiLine => builder.multi_line(true),
            RegexFlag::DotMatchesNewLine => builder.dot_matches_new_line(true),
        };
    }
    builder
        .build()
        .map_err(|e| format!("invalid pattern '{}': {}", pattern, e))
}

/// Escaped key, anchored on word boundaries only where the key itself starts
/// or ends with a word character ("Dr." gets a leading boundary only).
fn key_pattern(key: &str, word_boundary: bool) -> String {
    let escaped = regex::escape(key);
    if !word_boundary {
        return escaped;
    }
    let is_word = |c: char| c.is_alphanumeric() || c == '_';
    let lead = key.chars().next().is_some_and(is_word);
    let trail = key.chars().last().is_some_and(is_word);
    format!(
        "{}{}{}",
        if lead { r"\b" } else { "" },
        escaped,
        if trail { r"\b" } else { "" }
    )
}
