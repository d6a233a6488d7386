//! Roman numeral expansion.
//!
//! Rule pattern: `(?:(?P<prev>\S+)(?P<gap>[ \t]+))?\b(?P<numeral>[IVXLCDMivxlcdm]+)\b`
//! The optional preceding word supplies the context clue.

use super::RuleContext;
use super::numbers::number_to_words;
use regex::Captures;

/// Parse a numeral with the strict grammar (M{0,3}(CM|CD|D?C{0,3})(XC|XL|L?X{0,3})(IX|IV|V?I{0,3})).
/// Input must be uppercase.
pub fn parse_roman(token: &str) -> Option<u64> {
    if token.is_empty() {
        return None;
    }
    let mut rest = token;
    let mut total = 0;
    // (ones, fives, tens, unit value) per decimal place, thousands handled first
    let thousands = rest.chars().take_while(|c| *c == 'M').count();
    if thousands > 3 {
        return None;
    }
    total += thousands as u64 * 1000;
    rest = &rest[thousands..];

    for (one, five, ten, unit) in [('C', 'D', 'M', 100), ('X', 'L', 'C', 10), ('I', 'V', 'X', 1)] {
        let (value, consumed) = parse_place(rest, one, five, ten)?;
        total += value * unit;
        rest = &rest[consumed..];
    }

    if rest.is_empty() && total > 0 {
        Some(total)
    } else {
        None
    }
}

/// One decimal place: returns the digit value (0-9) and bytes consumed.
fn parse_place(s: &str, one: char, five: char, ten: char) -> Option<(u64, usize)> {
    let chars: Vec<char> = s.chars().take(4).collect();
    let first = chars.first().copied();
    let second = chars.get(1).copied();

    if first == Some(one) && second == Some(ten) {
        return Some((9, 2));
    }
    if first == Some(one) && second == Some(five) {
        return Some((4, 2));
    }

    let mut value = 0;
    let mut consumed = 0;
    if first == Some(five) {
        value = 5;
        consumed = 1;
    }
    let ones = chars[consumed..].iter().take_while(|c| **c == one).count();
    if ones > 3 {
        return None;
    }
    Some((value + ones as u64, consumed + ones))
}

fn is_title_cased(word: &str) -> bool {
    let mut letters = word.chars().filter(|c| c.is_alphabetic());
    match letters.next() {
        Some(first) if first.is_uppercase() => {
            let rest: Vec<char> = letters.collect();
            !rest.is_empty() && rest.iter().all(|c| c.is_lowercase())
        }
        _ => false,
    }
}

pub fn expand_roman_numeral(caps: &Captures, ctx: &RuleContext) -> String {
    let original = caps[0].to_string();
    let Some(numeral) = caps.name("numeral").map(|m| m.as_str()) else {
        return original;
    };
    let prefix = match (caps.name("prev"), caps.name("gap")) {
        (Some(prev), Some(gap)) => format!("{}{}", prev.as_str(), gap.as_str()),
        _ => String::new(),
    };

    if ctx.tables.is_roman_exception(numeral) {
        return original;
    }

    let upper = numeral.chars().all(|c| c.is_uppercase());
    let lower = numeral.chars().all(|c| c.is_lowercase());
    if !upper && !lower {
        return original;
    }

    let Some(value) = parse_roman(&numeral.to_uppercase()) else {
        return original;
    };

    let prev_word: String = caps
        .name("prev")
        .map(|m| m.as_str().chars().filter(|c| c.is_alphabetic()).collect())
        .unwrap_or_default();
    let keyword_clue = !prev_word.is_empty() && ctx.tables.is_numbering_keyword(&prev_word);
    let title_clue = upper && is_title_cased(&prev_word);

    // Lowercase numerals read as words unless a keyword announces them
    if lower && !keyword_clue {
        return original;
    }
    if ctx.tables.is_roman_false_positive(numeral) && !(keyword_clue || title_clue) {
        return original;
    }

    format!("{}Roman Numeral {}", prefix, number_to_words(value))
}
