use tsuzuki_parse::Elements;

use crate::error::InterpretationError;

/// What a file name says about the episode being watched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameGuess {
    pub title: String,
    pub season: Option<u32>,
    pub part: Option<u32>,
    /// For multi-episode files, the last episode contained.
    pub episode: u32,
    /// No season marker: the episode may count across seasons.
    pub is_absolute: bool,
    pub year: Option<u32>,
}

impl FilenameGuess {
    /// Text sent to the catalog search.
    ///
    /// Sequels are listed under names like "Title Season 2 Part 2", so the
    /// season is spelled out when it is past the first or a part follows.
    pub fn search_text(&self) -> String {
        let mut text = self.title.clone();
        if let Some(season) = self.season {
            if season > 1 || self.part.is_some() {
                text.push_str(&format!(" Season {season}"));
            }
        }
        if let Some(part) = self.part {
            text.push_str(&format!(" Part {part}"));
        }
        text
    }
}

/// Interpret a file path, URL or bare title.
///
/// The title comes from the file name unless the name puts its numbering
/// first (`S01E05 - Something.mkv`), in which case the parent folder and
/// then the grandparent are tried.
pub fn interpret(input: &str) -> Result<FilenameGuess, InterpretationError> {
    let components = path_components(input.trim());
    let Some((file_name, folders)) = components.split_last() else {
        return Err(InterpretationError::EmptyInput);
    };

    let file = tsuzuki_parse::parse(file_name);
    tracing::debug!(%file_name, guess = ?file, "file name guess");

    let episode = file
        .episode_number
        .ok_or_else(|| InterpretationError::NoEpisode {
            name: file_name.clone(),
        })?;

    let mut season = file.season_number;
    let mut part = file.part_number;
    let mut year = file.year;
    let mut title = trusted_title(&file);

    if title.is_none() {
        for folder in folders.iter().rev().take(2) {
            let guess = tsuzuki_parse::parse(folder);
            tracing::debug!(%folder, guess = ?guess, "folder guess");
            season = season.or(guess.season_number);
            part = part.or(guess.part_number);
            year = year.or(guess.year);
            if guess.title.is_some() {
                title = guess.title;
                break;
            }
        }
    }

    let title = title.ok_or_else(|| InterpretationError::NoTitle {
        name: file_name.clone(),
    })?;

    Ok(FilenameGuess {
        title,
        season,
        part,
        episode,
        is_absolute: season.is_none(),
        year,
    })
}

fn trusted_title(elements: &Elements) -> Option<String> {
    if elements.positions.numbering_precedes_title() {
        if let Some(title) = &elements.title {
            tracing::debug!(%title, "numbering precedes title, ignoring it");
        }
        return None;
    }
    elements.title.clone()
}

/// Split a path (either separator) or URL into its non-empty components.
/// URLs contribute only their decoded last segment, or nothing without one.
fn path_components(input: &str) -> Vec<String> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return url_file_name(input).into_iter().collect();
    }
    input
        .split(|c: char| c == '/' || c == '\\')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn url_file_name(input: &str) -> Option<String> {
    let url = url::Url::parse(input).ok()?;
    let segment = url.path_segments()?.filter(|s| !s.is_empty()).last()?;
    let decoded = urlencoding::decode(segment).ok()?;
    Some(decoded.into_owned())
}
