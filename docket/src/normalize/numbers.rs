//! Numerals to words: cardinals, ordinals, years, currency, clock times.

use super::RuleContext;
use regex::Captures;

const ONES: &[&str] = &[
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
    "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
];
const TENS: &[&str] = &[
    "", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
];
/// Seven groups of three digits cover every `u64`.
const SCALE: &[&str] = &[
    "",
    "thousand",
    "million",
    "billion",
    "trillion",
    "quadrillion",
    "quintillion",
];

fn under_hundred(n: u64) -> String {
    let n = n as usize;
    if n < 20 {
        return ONES[n].to_string();
    }
    let tens = TENS[n / 10];
    match ONES[n % 10] {
        "" => tens.to_string(),
        ones => format!("{}-{}", tens, ones),
    }
}

fn three_digits_to_words(n: u64) -> String {
    let mut parts = Vec::new();
    let hundreds = n / 100;
    let remainder = n % 100;
    if hundreds > 0 {
        parts.push(format!("{} hundred", ONES[hundreds as usize]));
    }
    if remainder > 0 {
        parts.push(under_hundred(remainder));
    }
    parts.join(" ")
}

/// Convert a non-negative integer to English words ("forty-two").
pub fn number_to_words(n: u64) -> String {
    if n == 0 {
        return "zero".to_string();
    }
    let mut parts = Vec::new();
    let mut remaining = n;
    for scale in SCALE {
        let chunk = remaining % 1000;
        if chunk > 0 {
            let words = three_digits_to_words(chunk);
            if scale.is_empty() {
                parts.push(words);
            } else {
                parts.push(format!("{} {}", words, scale));
            }
        }
        remaining /= 1000;
        if remaining == 0 {
            break;
        }
    }
    parts.reverse();
    parts.join(" ")
}

/// Ordinal words ("twenty-first", "one hundredth").
pub fn ordinal_to_words(n: u64) -> String {
    let words = number_to_words(n);
    let split = words.rfind(['-', ' ']).map(|i| i + 1).unwrap_or(0);
    let (head, last) = words.split_at(split);
    let ordinal = match last {
        "one" => "first".to_string(),
        "two" => "second".to_string(),
        "three" => "third".to_string(),
        "five" => "fifth".to_string(),
        "eight" => "eighth".to_string(),
        "nine" => "ninth".to_string(),
        "twelve" => "twelfth".to_string(),
        _ if last.ends_with('y') => format!("{}ieth", &last[..last.len() - 1]),
        _ => format!("{}th", last),
    };
    format!("{}{}", head, ordinal)
}

/// Calendar reading of a four-digit year, or `None` when the number should
/// be read as a plain cardinal.
pub fn year_to_words(year: u64) -> Option<String> {
    if !((1100..=1999).contains(&year) || (2010..=2099).contains(&year)) {
        return None;
    }
    let century = year / 100;
    let rest = year % 100;
    let tail = match rest {
        0 => "hundred".to_string(),
        1..=9 => format!("oh {}", ONES[rest as usize]),
        _ => under_hundred(rest),
    };
    Some(format!("{} {}", under_hundred(century), tail))
}

/// Read a digit string one digit at a time ("14" -> "one four").
fn digits_to_words(digits: &str) -> String {
    digits
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| if d == 0 { "zero" } else { ONES[d as usize] })
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_grouped(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse::<u64>().ok()
}

/// Words for a numeral token: thousands separators and decimals accepted,
/// plain four-digit numbers read as years where that applies.
pub fn numeral_to_words(token: &str) -> Option<String> {
    let (int_part, frac_part) = match token.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (token, None),
    };
    let value = parse_grouped(int_part)?;

    if frac_part.is_none() && int_part.len() == 4 && !int_part.contains(',') {
        if let Some(year) = year_to_words(value) {
            return Some(year);
        }
    }

    let words = number_to_words(value);
    match frac_part {
        Some(frac) if !frac.is_empty() => Some(format!("{} point {}", words, digits_to_words(frac))),
        _ => Some(words),
    }
}

/// `\b\d+(?:,\d{3})*(?:\.\d+)?\b` -> words. Unparseable numbers are left as is.
pub fn expand_number(caps: &Captures, _ctx: &RuleContext) -> String {
    let token = &caps[0];
    numeral_to_words(token).unwrap_or_else(|| token.to_string())
}

/// `(\d+)(st|nd|rd|th)` -> ordinal words.
pub fn expand_ordinal(caps: &Captures, _ctx: &RuleContext) -> String {
    match caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok()) {
        Some(n) => ordinal_to_words(n),
        None => caps[0].to_string(),
    }
}

/// `$<dollars>[.<cents>]` -> "<n> dollars [and <n> cents]".
pub fn expand_currency(caps: &Captures, _ctx: &RuleContext) -> String {
    let Some(dollars) = caps.get(1).and_then(|m| parse_grouped(m.as_str())) else {
        return caps[0].to_string();
    };
    let cents = caps
        .get(2)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .unwrap_or(0);

    let mut spoken = format!(
        "{} {}",
        number_to_words(dollars),
        if dollars == 1 { "dollar" } else { "dollars" }
    );
    if cents > 0 {
        spoken.push_str(&format!(
            " and {} {}",
            number_to_words(cents),
            if cents == 1 { "cent" } else { "cents" }
        ));
    }
    spoken
}

/// `<h>:<mm> <AM|PM>` -> "five thirty P M".
pub fn expand_time(caps: &Captures, _ctx: &RuleContext) -> String {
    let hour = caps.get(1).and_then(|m| m.as_str().parse::<u64>().ok());
    let minute = caps.get(2).and_then(|m| m.as_str().parse::<u64>().ok());
    let period = caps.get(3).map(|m| m.as_str().to_uppercase());

    let (Some(hour), Some(minute), Some(period)) = (hour, minute, period) else {
        return caps[0].to_string();
    };
    if hour == 0 || hour > 12 || minute > 59 {
        return caps[0].to_string();
    }

    let mut spoken = number_to_words(hour);
    match minute {
        0 => {}
        1..=9 => spoken.push_str(&format!(" oh {}", ONES[minute as usize])),
        _ => spoken.push_str(&format!(" {}", under_hundred(minute))),
    }
    spoken.push_str(&format!(" {} M", period));
    spoken
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_to_words() {
        assert_eq!(number_to_words(0), "zero");
        assert_eq!(number_to_words(8), "eight");
        assert_eq!(number_to_words(16), "sixteen");
        assert_eq!(number_to_words(42), "forty-two");
        assert_eq!(number_to_words(100), "one hundred");
        assert_eq!(number_to_words(105), "one hundred five");
        assert_eq!(number_to_words(1234), "one thousand two hundred thirty-four");
        assert_eq!(number_to_words(2_000_000), "two million");
    }

    #[test]
    fn test_number_to_words_top_of_range() {
        assert_eq!(number_to_words(1_000_000_000_000_000_000), "one quintillion");
        assert_eq!(
            numeral_to_words("2000000000000000001").as_deref(),
            Some("two quintillion one")
        );
        let max = number_to_words(u64::MAX);
        assert!(max.starts_with("eighteen quintillion four hundred forty-six quadrillion"));
        assert!(max.ends_with("six hundred fifteen"));
    }

    #[test]
    fn test_ordinal_to_words() {
        assert_eq!(ordinal_to_words(1), "first");
        assert_eq!(ordinal_to_words(3), "third");
        assert_eq!(ordinal_to_words(12), "twelfth");
        assert_eq!(ordinal_to_words(20), "twentieth");
        assert_eq!(ordinal_to_words(21), "twenty-first");
        assert_eq!(ordinal_to_words(100), "one hundredth");
    }

    #[test]
    fn test_year_to_words() {
        assert_eq!(year_to_words(1984).as_deref(), Some("nineteen eighty-four"));
        assert_eq!(year_to_words(1905).as_deref(), Some("nineteen oh five"));
        assert_eq!(year_to_words(1900).as_deref(), Some("nineteen hundred"));
        assert_eq!(year_to_words(2015).as_deref(), Some("twenty fifteen"));
        assert_eq!(year_to_words(1100).as_deref(), Some("eleven hundred"));
        assert_eq!(year_to_words(2005), None);
        assert_eq!(year_to_words(1066), None);
    }

    #[test]
    fn test_numeral_to_words() {
        assert_eq!(numeral_to_words("2005").as_deref(), Some("two thousand five"));
        assert_eq!(numeral_to_words("1,984").as_deref(), Some("one thousand nine hundred eighty-four"));
        assert_eq!(numeral_to_words("3.14").as_deref(), Some("three point one four"));
        assert_eq!(numeral_to_words("99999999999999999999999"), None);
    }
}
