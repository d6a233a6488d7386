//! Normalization rule engine: rewrites narration text into speakable words
//! through an ordered, declarative rule pipeline.

mod footnotes;
mod foreign;
pub mod numbers;
mod registry;
pub mod roman;
pub mod rules;
mod scripture;
pub mod tables;
mod text;

use crate::config::NormalizationConfig;
use crate::translate::Translator;
use rules::CompiledRule;
use scripture::ScriptureIndex;
use std::sync::Arc;
use tables::LookupTables;

pub use rules::{RegexFlag, Rule};

/// Read-only state handed to every function and callback.
pub struct RuleContext<'a> {
    pub tables: &'a LookupTables,
    pub(crate) scripture: &'a ScriptureIndex,
    pub translator: Option<&'a dyn Translator>,
    pub hebrew_placeholder: &'a str,
}

/// Compiled normalization pipeline.
///
/// Built once from configuration and shared by reference; `normalize` holds
/// no state between calls.
pub struct RuleEngine {
    rules: Vec<(String, CompiledRule)>,
    tables: LookupTables,
    scripture: ScriptureIndex,
    hebrew_placeholder: String,
    translator: Option<Arc<dyn Translator>>,
}

impl RuleEngine {
    /// Compile the configured rules. Rules that reference a missing function,
    /// callback, or table, or whose pattern does not compile, are skipped.
    pub fn new(config: &NormalizationConfig) -> Self {
        let mut rules = Vec::with_capacity(config.rules.len());
        for rule in &config.rules {
            match CompiledRule::compile(rule, &config.tables) {
                Ok(compiled) => rules.push((rule.label(), compiled)),
                Err(reason) => {
                    log::warn!("Skipping normalization rule {}: {}", rule.label(), reason);
                }
            }
        }

        Self {
            rules,
            tables: config.tables.clone(),
            scripture: ScriptureIndex::new(&config.tables),
            hebrew_placeholder: config.hebrew_placeholder.clone(),
            translator: None,
        }
    }

    /// Use a translation backend for foreign text.
    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Number of rules that compiled.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Run every rule in order, each on the previous rule's output.
    pub fn normalize(&self, text: &str) -> String {
        let ctx = RuleContext {
            tables: &self.tables,
            scripture: &self.scripture,
            translator: self.translator.as_deref(),
            hebrew_placeholder: &self.hebrew_placeholder,
        };

        let mut current = text.to_string();
        for (label, rule) in &self.rules {
            let next = match rule {
                CompiledRule::Function { func } => func(&current, &ctx),
                CompiledRule::Regex { regex, replacement } => regex
                    .replace_all(&current, replacement.as_str())
                    .into_owned(),
                CompiledRule::RegexCallback { regex, callback } => regex
                    .replace_all(&current, |caps: &regex::Captures| callback(caps, &ctx))
                    .into_owned(),
                CompiledRule::DictLookup { entries } => {
                    let mut out = current.clone();
                    for (regex, value) in entries {
                        out = regex
                            .replace_all(&out, regex::NoExpand(value))
                            .into_owned();
                    }
                    out
                }
            };
            if next != current {
                log::trace!("Rule {} rewrote text", label);
            }
            current = next;
        }
        current.trim().to_string()
    }
}

/// Title-case a heading: first letter of each word upper, the rest lower.
/// Letters after an apostrophe stay lower ("JOHN'S" -> "John's").
pub fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut out = String::with_capacity(word.len());
            let mut seen_letter = false;
            for c in word.chars() {
                if c.is_alphabetic() {
                    if seen_letter {
                        out.extend(c.to_lowercase());
                    } else {
                        out.extend(c.to_uppercase());
                        seen_letter = true;
                    }
                } else {
                    if c == '-' || c == '/' {
                        seen_letter = false;
                    }
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}
