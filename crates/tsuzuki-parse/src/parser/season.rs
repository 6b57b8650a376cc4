use regex::Regex;
use std::sync::LazyLock;

/// Result of a successful season extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonMatch {
    /// Raw season string.
    pub raw: String,
    /// Parsed season number.
    pub number: u32,
}

// ── Regex patterns ──────────────────────────────────────────────

/// "S2", "S01".
static RE_S_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^S(\d{1,2})$").unwrap());

/// "Season 2", "Season II", "Saison 2" inside a single bracketed token.
static RE_SEASON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:Season|Saison)\s+([\dIVXivx]+)$").unwrap());

/// "2nd Season" inside a single bracketed token.
static RE_NTH_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)\s+Season$").unwrap());

/// "2nd", "3rd" as a standalone word.
static RE_ORDINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d{1,2})(?:st|nd|rd|th)$").unwrap());

/// Japanese: "第2期", "2期".
static RE_JAPANESE_SEASON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:第)?(\d{1,2})期$").unwrap());

/// Season forms that fit in one token.
pub fn try_extract(text: &str) -> Option<SeasonMatch> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let number = if let Some(caps) = RE_S_PREFIX.captures(text) {
        caps[1].parse().ok()?
    } else if let Some(caps) = RE_SEASON_WORD.captures(text) {
        parse_number_or_roman(&caps[1])?
    } else if let Some(caps) = RE_NTH_SEASON.captures(text) {
        caps[1].parse().ok()?
    } else if let Some(caps) = RE_JAPANESE_SEASON.captures(text) {
        caps[1].parse().ok()?
    } else {
        return None;
    };

    Some(SeasonMatch {
        raw: text.to_string(),
        number,
    })
}

/// Parse "2nd", "3rd" etc.
pub fn parse_ordinal(text: &str) -> Option<u32> {
    let caps = RE_ORDINAL.captures(text.trim())?;
    caps[1].parse().ok()
}

/// Parse a number that might be Arabic or Roman numerals.
pub fn parse_number_or_roman(s: &str) -> Option<u32> {
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    roman_to_u32(s)
}

/// Roman numeral to u32 conversion (I–L range is plenty for seasons).
fn roman_to_u32(s: &str) -> Option<u32> {
    let mut total: i32 = 0;
    let mut prev = 0i32;

    for c in s.to_uppercase().chars().rev() {
        let value = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            _ => return None,
        };
        if value < prev {
            total -= value;
        } else {
            total += value;
        }
        prev = value;
    }

    u32::try_from(total).ok().filter(|n| *n > 0)
}
