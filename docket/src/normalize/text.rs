//! Character-level sanitation applied around the word-level rules.

use super::RuleContext;
use once_cell::sync::Lazy;
use regex::Regex;

static PERIOD_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:[ \t]*\.){2,}").expect("valid regex"));

/// Remove control characters (except newlines and tabs) and zero-width marks.
pub fn strip_control_characters(text: &str, _ctx: &RuleContext) -> String {
    text.chars().filter(|c| is_allowed_char(*c)).collect()
}

fn is_allowed_char(c: char) -> bool {
    match c {
        '\n' | '\t' => true,
        // zero-width space and joiners, byte order mark
        '\u{200b}' | '\u{200c}' | '\u{200d}' | '\u{feff}' => false,
        _ => !c.is_control(),
    }
}

/// Normalize whitespace: collapse spaces and tabs, keep at most one blank
/// line between paragraphs, trim the ends.
pub fn collapse_whitespace(text: &str, _ctx: &RuleContext) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_was_space = false;
    let mut newline_count = 0;

    for c in text.replace("\r\n", "\n").chars() {
        if c == '\n' {
            // Drop trailing spaces before a newline
            if prev_was_space {
                result.pop();
            }
            newline_count += 1;
            prev_was_space = false;

            // Collapse more than 2 consecutive newlines
            if newline_count <= 2 {
                result.push('\n');
            }
        } else if c.is_whitespace() {
            // Leading spaces of a line are dropped
            if newline_count > 0 {
                continue;
            }
            if !prev_was_space {
                result.push(' ');
                prev_was_space = true;
            }
        } else {
            newline_count = 0;
            prev_was_space = false;
            result.push(c);
        }
    }

    result.trim().to_string()
}

/// Period runs, spaced or not, read as one full stop: "..", "....", ". . .".
pub fn collapse_periods(text: &str, _ctx: &RuleContext) -> String {
    PERIOD_RUN.replace_all(text, ".").into_owned()
}
