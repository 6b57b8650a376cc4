use serde::{Deserialize, Serialize};

/// Parsed elements extracted from an anime filename.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Elements {
    /// The anime title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Episode number as written (e.g. "05", "05v2", "S01E05").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<String>,
    /// Episode number parsed as u32. For multi-episode files this is the last
    /// episode contained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
    /// Season number as written (e.g. "S2", "Season 2", "2nd Season").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    /// Season number parsed as u32.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season_number: Option<u32>,
    /// Part / cour number (e.g. "Part 2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_number: Option<u32>,
    /// Year of release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Release group name (e.g., "SubsPlease").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_group: Option<String>,
    /// Video resolution (e.g., "1080p", "720p").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Video codec (e.g., "x264", "HEVC").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    /// Audio codec (e.g., "FLAC", "AAC").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    /// Source (e.g., "BD", "WEB").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// File checksum (e.g., "ABCD1234").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Release version (e.g., "v2").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_version: Option<String>,
    /// Episode title (text after episode number).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_title: Option<String>,
    /// File extension (e.g., "mkv").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_extension: Option<String>,
    /// Token indices of the title, season and episode.
    #[serde(skip)]
    pub positions: Positions,
}

/// Token indices at which elements were found.
///
/// Only meaningful relative to each other within one parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Positions {
    pub title: Option<usize>,
    pub season: Option<usize>,
    pub episode: Option<usize>,
}

impl Positions {
    /// True when a season or episode marker appears before the title.
    ///
    /// Names like `S01E05 - Something.mkv` or `[Group] 05 [720p].mkv` put the
    /// numbering first; whatever follows is usually an episode title.
    pub fn numbering_precedes_title(&self) -> bool {
        let Some(title) = self.title else {
            return true;
        };
        let before = |pos: Option<usize>| pos.is_some_and(|p| p < title);
        before(self.episode) || before(self.season)
    }
}
