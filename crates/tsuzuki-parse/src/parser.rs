mod episode;
mod season;
mod title;

use episode::EpisodeMatch;
use season::SeasonMatch;

use crate::elements::Elements;
use crate::keyword::{self, Keyword, Numbering, Tag};
use crate::tokenizer::{self, Token, TokenKind};

/// Parse an anime filename into its component elements.
///
/// # Example
/// ```
/// let result = tsuzuki_parse::parse("[SubsPlease] Sousou no Frieren - 05 (1080p) [ABCD1234].mkv");
/// assert_eq!(result.title.as_deref(), Some("Sousou no Frieren"));
/// assert_eq!(result.episode_number, Some(5));
/// assert_eq!(result.release_group.as_deref(), Some("SubsPlease"));
/// assert_eq!(result.resolution.as_deref(), Some("1080p"));
/// assert_eq!(result.checksum.as_deref(), Some("ABCD1234"));
/// ```
pub fn parse(filename: &str) -> Elements {
    let (tokens, extension) = tokenizer::tokenize(filename);
    let mut elements = Elements {
        file_extension: extension,
        ..Default::default()
    };
    let mut identified = vec![false; tokens.len()];

    // Pass 1: keywords and resolutions, bracketed or free.
    identify_keywords(&tokens, &mut elements, &mut identified);

    // Pass 2: release group (first bracketed token before any free text).
    extract_release_group(&tokens, &mut elements, &mut identified);

    // Pass 3: checksum (8-char hex in brackets).
    extract_checksum(&tokens, &mut elements, &mut identified);

    // Pass 4: year.
    extract_year(&tokens, &mut elements, &mut identified);

    // Pass 5: season and part markers.
    extract_season_and_part(&tokens, &mut elements, &mut identified);

    // Pass 6: episode number.
    extract_episode(&tokens, &mut elements, &mut identified);

    // Pass 7: title and episode title from what is left.
    if let Some((index, text)) = title::extract_title(&tokens, &identified) {
        elements.title = Some(text);
        elements.positions.title = Some(index);
    }
    elements.episode_title =
        title::extract_episode_title(&tokens, &identified, elements.positions.episode);

    tracing::trace!(filename, ?elements, "parsed filename");
    elements
}

fn identify_keywords(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    for (i, token) in tokens.iter().enumerate() {
        if !token.is_word() {
            continue;
        }
        // Bracketed tokens often pack several tags: "[1080p HEVC AAC]".
        let words: Vec<&str> = match token.kind {
            TokenKind::Bracketed => token.text.split_whitespace().collect(),
            _ => vec![token.text.as_str()],
        };
        let mut matched = false;
        for word in words {
            match keyword::find(word, token.is_enclosed) {
                Some(Keyword::Tag(tag)) => {
                    apply_tag(tag, word, elements);
                    matched = true;
                }
                // Markers are only meaningful next to their number.
                Some(Keyword::Marker(_)) => {}
                None => {
                    if let Some(res) = parse_resolution(word) {
                        elements.resolution.get_or_insert(res);
                        matched = true;
                    }
                }
            }
        }
        if matched {
            identified[i] = true;
        }
    }
}

fn extract_release_group(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    for (i, token) in tokens.iter().enumerate() {
        if identified[i] {
            continue;
        }
        match token.kind {
            TokenKind::Bracketed => {
                if !is_checksum(&token.text) && !episode::is_year_like(&token.text) {
                    elements.release_group = Some(token.text.clone());
                    identified[i] = true;
                    return;
                }
            }
            // Once we hit free text, the release group window has passed.
            TokenKind::FreeText => return,
            TokenKind::Delimiter => {}
        }
    }
}

fn extract_checksum(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    for (i, token) in tokens.iter().enumerate() {
        if token.kind == TokenKind::Bracketed && !identified[i] && is_checksum(&token.text) {
            elements.checksum = Some(token.text.clone());
            identified[i] = true;
            return;
        }
    }
}

fn is_checksum(s: &str) -> bool {
    s.len() == 8 && s.chars().all(|c| c.is_ascii_hexdigit())
}

/// A year is taken from brackets anywhere, or from free text once the title
/// has started ("Hunter x Hunter 2011 - 05").
fn extract_year(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    let mut saw_text = false;
    for (i, token) in tokens.iter().enumerate() {
        if identified[i] || !token.is_word() {
            continue;
        }
        let is_year = episode::is_year_like(&token.text);
        let accept = match token.kind {
            TokenKind::Bracketed => is_year,
            _ => is_year && saw_text,
        };
        if accept {
            elements.year = token.text.parse().ok();
            identified[i] = true;
            return;
        }
        if token.kind == TokenKind::FreeText {
            saw_text = true;
        }
    }
}

fn extract_season_and_part(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    for i in 0..tokens.len() {
        if identified[i] || !tokens[i].is_word() {
            continue;
        }
        let text = tokens[i].text.as_str();

        if elements.season_number.is_none() {
            if let Some(m) = season::try_extract(text) {
                set_season(elements, m, i);
                identified[i] = true;
                continue;
            }
        }

        let Some(next) = next_word(tokens, identified, i) else {
            continue;
        };
        let next_text = tokens[next].text.as_str();
        match keyword::find(text, tokens[i].is_enclosed) {
            Some(Keyword::Marker(Numbering::Season)) if elements.season_number.is_none() => {
                if let Some(number) = season::parse_number_or_roman(next_text) {
                    let raw = format!("{text} {next_text}");
                    set_season(elements, SeasonMatch { raw, number }, i);
                    identified[i] = true;
                    identified[next] = true;
                }
            }
            Some(Keyword::Marker(Numbering::Part)) if elements.part_number.is_none() => {
                if let Some(number) = season::parse_number_or_roman(next_text) {
                    elements.part_number = Some(number);
                    identified[i] = true;
                    identified[next] = true;
                }
            }
            _ => {
                // "2nd Season"
                let ordinal = season::parse_ordinal(text);
                if let (Some(number), true) = (ordinal, next_text.eq_ignore_ascii_case("season")) {
                    if elements.season_number.is_none() {
                        let raw = format!("{text} {next_text}");
                        set_season(elements, SeasonMatch { raw, number }, i);
                        identified[i] = true;
                        identified[next] = true;
                    }
                }
            }
        }
    }
}

fn set_season(elements: &mut Elements, m: SeasonMatch, index: usize) {
    elements.season = Some(m.raw);
    elements.season_number = Some(m.number);
    elements.positions.season = Some(index);
}

fn extract_episode(tokens: &[Token], elements: &mut Elements, identified: &mut [bool]) {
    // Strategy 1: self-describing tokens (S01E05, EP05, #05, 第05話).
    for i in 0..tokens.len() {
        if identified[i] || !tokens[i].is_word() {
            continue;
        }
        if let Some(m) = episode::try_marked(&tokens[i].text) {
            if let Some(season) = m.season {
                if elements.season_number.is_none() {
                    let raw = format!("S{season:02}");
                    set_season(elements, SeasonMatch { raw, number: season }, i);
                }
            }
            accept_episode(tokens, elements, identified, &[i], m);
            return;
        }
    }

    // Strategy 2: prefix word followed by a number ("Episode 05", "Ep 12").
    for i in 0..tokens.len() {
        if identified[i] || tokens[i].kind != TokenKind::FreeText {
            continue;
        }
        if !keyword::is_marker(&tokens[i].text, Numbering::Episode) {
            continue;
        }
        if let Some(next) = next_word(tokens, identified, i) {
            if let Some(m) = episode::try_number(&tokens[next].text) {
                accept_episode(tokens, elements, identified, &[i, next], m);
                return;
            }
        }
    }

    // Strategy 3: number right after a dash ("Title - 05").
    for i in 0..tokens.len() {
        if identified[i] || !tokens[i].is_dash() {
            continue;
        }
        if let Some(next) = next_free_text(tokens, identified, i) {
            if let Some(m) = episode::try_number(&tokens[next].text) {
                identified[i] = true;
                accept_episode(tokens, elements, identified, &[next], m);
                return;
            }
        }
    }

    // Strategy 4: standalone number after some title text ("Title 05").
    let mut saw_text = false;
    for i in 0..tokens.len() {
        if identified[i] || tokens[i].kind != TokenKind::FreeText || tokens[i].is_dash() {
            continue;
        }
        match episode::try_number(&tokens[i].text) {
            Some(m) if saw_text => {
                accept_episode(tokens, elements, identified, &[i], m);
                return;
            }
            Some(_) => {}
            None => saw_text = true,
        }
    }

    // Strategy 5: bracketed number ("[05]", "[01-03]").
    for i in 0..tokens.len() {
        if identified[i] || tokens[i].kind != TokenKind::Bracketed {
            continue;
        }
        if let Some(m) = episode::try_number(&tokens[i].text) {
            accept_episode(tokens, elements, identified, &[i], m);
            return;
        }
    }

    // Strategy 6: the whole name is a bare number ("05.mkv").
    let words: Vec<usize> = (0..tokens.len())
        .filter(|&i| !identified[i] && tokens[i].is_word())
        .collect();
    if let [only] = words[..] {
        if let Some(m) = episode::try_number(&tokens[only].text) {
            accept_episode(tokens, elements, identified, &[only], m);
        }
    }
}

/// Record an episode, extending it over a "05 - 06" / "S01E05-E06" range.
fn accept_episode(
    tokens: &[Token],
    elements: &mut Elements,
    identified: &mut [bool],
    indices: &[usize],
    m: EpisodeMatch,
) {
    for &i in indices {
        identified[i] = true;
    }
    let first = indices[0];
    let last = indices[indices.len() - 1];
    let mut raw = m.raw;
    let mut number = m.number;

    if let Some(dash) = next_free_text(tokens, identified, last).filter(|&d| tokens[d].is_dash()) {
        if let Some(end) = next_free_text(tokens, identified, dash) {
            let end_text = tokens[end].text.as_str();
            let end_number = episode::try_marked(end_text)
                .filter(|e| e.season.is_none())
                .or_else(|| episode::try_number(end_text))
                .map(|e| e.number);
            if let Some(end_number) = end_number.filter(|n| *n > number) {
                raw = format!("{raw}-{end_text}");
                number = end_number;
                identified[dash] = true;
                identified[end] = true;
            }
        }
    }

    elements.episode = Some(raw);
    elements.episode_number = Some(number);
    elements.release_version = m.version;
    elements.positions.episode = Some(first);
}

/// Next unidentified word, allowing only delimiters in between.
fn next_word(tokens: &[Token], identified: &[bool], start: usize) -> Option<usize> {
    let next = (start + 1..tokens.len()).find(|&j| tokens[j].kind != TokenKind::Delimiter)?;
    (tokens[next].kind == TokenKind::FreeText && !identified[next] && !tokens[next].is_dash())
        .then_some(next)
}

/// Find the next unidentified free text token after index `start`,
/// giving up at a bracketed token.
fn next_free_text(tokens: &[Token], identified: &[bool], start: usize) -> Option<usize> {
    for i in (start + 1)..tokens.len() {
        if identified[i] {
            continue;
        }
        match tokens[i].kind {
            TokenKind::FreeText => return Some(i),
            TokenKind::Bracketed => return None,
            TokenKind::Delimiter => {}
        }
    }
    None
}

/// Try to parse a resolution string: "1920x1080" → "1080p", "720p", "1080i".
fn parse_resolution(s: &str) -> Option<String> {
    let lower = s.to_lowercase();

    if let Some((width, height)) = lower.split_once('x') {
        let width: u32 = width.parse().ok()?;
        let height: u32 = height.parse().ok()?;
        return (width >= 320 && height >= 240).then(|| format!("{height}p"));
    }

    let num_part = lower.strip_suffix('p').or_else(|| lower.strip_suffix('i'))?;
    let height: u32 = num_part.parse().ok()?;
    (height >= 240).then_some(lower)
}

/// Keep the first tag of each kept kind.
fn apply_tag(tag: Tag, text: &str, elements: &mut Elements) {
    let slot = match tag {
        Tag::Video => &mut elements.video_codec,
        Tag::Audio => &mut elements.audio_codec,
        Tag::Resolution => &mut elements.resolution,
        Tag::Source => &mut elements.source,
        Tag::Edition | Tag::Language => return,
    };
    slot.get_or_insert_with(|| text.to_string());
}
