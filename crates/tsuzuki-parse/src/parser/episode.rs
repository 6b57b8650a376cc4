use regex::Regex;
use std::sync::LazyLock;

/// Upper bound for anything we accept as an episode number.
const MAX_EPISODE: u32 = 1999;

/// Result of a successful episode extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeMatch {
    /// Raw episode string (e.g., "05", "S01E05", "01-03").
    pub raw: String,
    /// Parsed episode number. For ranges this is the last episode.
    pub number: u32,
    /// Season number if the token combined both (S01E05 → 1).
    pub season: Option<u32>,
    /// Release version if present (05v2 → "v2").
    pub version: Option<String>,
}

impl EpisodeMatch {
    fn plain(raw: &str, number: u32) -> Self {
        Self {
            raw: raw.to_string(),
            number,
            season: None,
            version: None,
        }
    }
}

// ── Regex patterns (compiled once) ──────────────────────────────

static RE_COMBINED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^S(\d{1,2})E(\d{1,4})(?:-?E?(\d{1,4}))?(?:v(\d))?$").unwrap()
});

static RE_COMBINED_X: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})[xX](\d{1,4})$").unwrap());

static RE_KEYWORD_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(?:EP|E|#)(\d{1,4})(?:v(\d))?$").unwrap());

static RE_VERSION_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})[vV](\d)$").unwrap());

static RE_FRACTIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{1,4})\.5$").unwrap());

static RE_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,4})\s*[-~]\s*(\d{1,4})$").unwrap());

static RE_JAPANESE_COUNTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^第(\d{1,4})[話集]$").unwrap());

/// Episode forms that carry their own marker (`S01E05`, `1x05`, `EP05`,
/// `#05`, `第05話`). These are trusted anywhere in the name.
pub fn try_marked(text: &str) -> Option<EpisodeMatch> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    try_combined(text)
        .or_else(|| try_keyword_prefix(text))
        .or_else(|| try_japanese_counter(text))
}

/// Bare numeric forms (`05`, `05v2`, `07.5`, `01-03`). Only trusted in
/// positions the parser already suspects hold an episode.
pub fn try_number(text: &str) -> Option<EpisodeMatch> {
    let text = text.trim();
    if text.is_empty() || is_year_like(text) {
        return None;
    }
    try_version_suffix(text)
        .or_else(|| try_fractional(text))
        .or_else(|| try_range(text))
        .or_else(|| try_plain_number(text))
}

/// S01E05, S01E05-E06, 01x05.
fn try_combined(text: &str) -> Option<EpisodeMatch> {
    if let Some(caps) = RE_COMBINED.captures(text) {
        let season: u32 = caps[1].parse().ok()?;
        let first: u32 = caps[2].parse().ok()?;
        let number = match caps.get(3) {
            Some(end) => end.as_str().parse::<u32>().ok()?.max(first),
            None => first,
        };
        return Some(EpisodeMatch {
            raw: text.to_string(),
            number,
            season: Some(season),
            version: caps.get(4).map(|m| format!("v{}", m.as_str())),
        });
    }
    let caps = RE_COMBINED_X.captures(text)?;
    Some(EpisodeMatch {
        raw: text.to_string(),
        number: caps[2].parse().ok()?,
        season: Some(caps[1].parse().ok()?),
        version: None,
    })
}

/// EP05, E05, #05, E05v2.
fn try_keyword_prefix(text: &str) -> Option<EpisodeMatch> {
    let caps = RE_KEYWORD_PREFIX.captures(text)?;
    let number = bounded(&caps[1])?;
    Some(EpisodeMatch {
        version: caps.get(2).map(|m| format!("v{}", m.as_str())),
        ..EpisodeMatch::plain(text, number)
    })
}

/// 第05話, 第05集.
fn try_japanese_counter(text: &str) -> Option<EpisodeMatch> {
    let caps = RE_JAPANESE_COUNTER.captures(text)?;
    Some(EpisodeMatch::plain(text, bounded(&caps[1])?))
}

/// 05v2 → episode 5, version "v2".
fn try_version_suffix(text: &str) -> Option<EpisodeMatch> {
    let caps = RE_VERSION_SUFFIX.captures(text)?;
    Some(EpisodeMatch {
        version: Some(format!("v{}", &caps[2])),
        ..EpisodeMatch::plain(text, bounded(&caps[1])?)
    })
}

/// 07.5 → episode 7.
fn try_fractional(text: &str) -> Option<EpisodeMatch> {
    let caps = RE_FRACTIONAL.captures(text)?;
    Some(EpisodeMatch::plain(text, bounded(&caps[1])?))
}

/// 01-03 → episode 3 (the last one the file contains).
fn try_range(text: &str) -> Option<EpisodeMatch> {
    let caps = RE_RANGE.captures(text)?;
    let start = bounded(&caps[1])?;
    let end = bounded(&caps[2])?;
    if start >= end {
        return None;
    }
    Some(EpisodeMatch::plain(text, end))
}

/// Plain number, rejecting years and implausibly large values.
fn try_plain_number(text: &str) -> Option<EpisodeMatch> {
    let text = text.trim();
    if is_year_like(text) || !text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(EpisodeMatch::plain(text, bounded(text)?))
}

fn bounded(digits: &str) -> Option<u32> {
    digits.parse::<u32>().ok().filter(|n| *n <= MAX_EPISODE)
}

/// A 4-digit number between 1950 and 2050.
pub fn is_year_like(s: &str) -> bool {
    s.len() == 4
        && s.parse::<u32>()
            .is_ok_and(|n| (1950..=2050).contains(&n))
}
