//! Title normalization for cache keys and fuzzy matching.
//!
//! Two spellings of the same show should normalize to the same string:
//! `"Shingeki no Kyojin Season 2"`, `"SHINGEKI NO KYOJIN 2nd Season"` and
//! `"Shingeki no Kyojin S2"` all become `"shingeki no kyojin 2"`.

use unicode_normalization::UnicodeNormalization;

/// Words dropped entirely.
const STOP_WORDS: &[&str] = &["the", "a", "an", "tv", "season", "cour", "series", "part"];

/// Standalone roman numerals rewritten as digits. `x` and `v` are left
/// alone because they show up as words ("Hunter x Hunter").
const ROMAN_NUMERALS: &[(&str, &str)] = &[
    ("ii", "2"),
    ("iii", "3"),
    ("iv", "4"),
    ("vi", "6"),
    ("vii", "7"),
    ("viii", "8"),
    ("ix", "9"),
    ("xi", "11"),
    ("xii", "12"),
    ("xiii", "13"),
];

/// Normalize a title.
///
/// 1. NFKC + lowercase, with a few look-alike characters folded
/// 2. Apostrophes dropped, other punctuation becomes a word break
/// 3. Per word: stop words removed, roman numerals / ordinals / `s2` /
///    `season2` reduced to the number
pub fn normalize(s: &str) -> String {
    let folded: String = s.nfkc().collect::<String>().to_lowercase();

    let mut cleaned = String::with_capacity(folded.len());
    for c in folded.chars() {
        match c {
            '\'' | '\u{2019}' | '\u{2018}' | '\u{02BC}' => {}
            '&' => cleaned.push_str(" and "),
            '@' => cleaned.push('a'),
            '\u{00D7}' => cleaned.push('x'), // ×
            c if c.is_alphanumeric() => cleaned.push(c),
            _ => cleaned.push(' '),
        }
    }

    cleaned
        .split_whitespace()
        .filter_map(canonical_word)
        .collect::<Vec<_>>()
        .join(" ")
}

fn canonical_word(word: &str) -> Option<String> {
    if STOP_WORDS.contains(&word) {
        return None;
    }
    if let Some((_, digits)) = ROMAN_NUMERALS.iter().find(|(roman, _)| *roman == word) {
        return Some((*digits).to_string());
    }
    if let Some(number) = strip_ordinal(word) {
        return Some(number.to_string());
    }
    for prefix in ["season", "s"] {
        if let Some(digits) = word.strip_prefix(prefix) {
            if is_number(digits) {
                let trimmed = digits.trim_start_matches('0');
                return Some(if trimmed.is_empty() { "0" } else { trimmed }.to_string());
            }
        }
    }
    Some(word.to_string())
}

/// "2nd" → "2".
fn strip_ordinal(word: &str) -> Option<&str> {
    ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(suffix))
        .filter(|n| is_number(n))
}

fn is_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
