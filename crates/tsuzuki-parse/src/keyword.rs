//! Release-name vocabulary: words that describe the file rather than name
//! the show.

use bitflags::bitflags;
use phf::phf_map;

bitflags! {
    /// Where a word counts as a keyword.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Context: u8 {
        /// Only inside brackets. Short tags like "BD" or "TV" also occur in
        /// titles.
        const BRACKETED = 1;
        /// Only as a marker in front of a number ("Season 2").
        const NUMBERED = 1 << 1;
    }
}

/// Technical tags. Only the first four are kept on [`Elements`](crate::Elements);
/// the rest are recognized so they never end up in a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Video,
    Audio,
    Resolution,
    Source,
    Edition,
    Language,
}

/// Words that introduce a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numbering {
    Episode,
    Season,
    Part,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Tag(Tag),
    Marker(Numbering),
}

#[derive(Debug, Clone, Copy)]
pub struct Entry {
    pub keyword: Keyword,
    pub context: Context,
}

impl Entry {
    const fn tag(tag: Tag) -> Self {
        Self {
            keyword: Keyword::Tag(tag),
            context: Context::empty(),
        }
    }

    const fn bracketed(tag: Tag) -> Self {
        Self {
            keyword: Keyword::Tag(tag),
            context: Context::BRACKETED,
        }
    }

    const fn marker(numbering: Numbering) -> Self {
        Self {
            keyword: Keyword::Marker(numbering),
            context: Context::NUMBERED,
        }
    }
}

const VIDEO: Entry = Entry::tag(Tag::Video);
const AUDIO: Entry = Entry::tag(Tag::Audio);
const AUDIO_BRACKETED: Entry = Entry::bracketed(Tag::Audio);
const RESOLUTION: Entry = Entry::tag(Tag::Resolution);
const RESOLUTION_BRACKETED: Entry = Entry::bracketed(Tag::Resolution);
const SOURCE: Entry = Entry::tag(Tag::Source);
const SOURCE_BRACKETED: Entry = Entry::bracketed(Tag::Source);
const EDITION: Entry = Entry::tag(Tag::Edition);
const EDITION_BRACKETED: Entry = Entry::bracketed(Tag::Edition);
const LANGUAGE_BRACKETED: Entry = Entry::bracketed(Tag::Language);
const EPISODE: Entry = Entry::marker(Numbering::Episode);
const SEASON: Entry = Entry::marker(Numbering::Season);
const PART: Entry = Entry::marker(Numbering::Part);

/// Keys are uppercase; lookups uppercase the word first.
static VOCABULARY: phf::Map<&'static str, Entry> = phf_map! {
    // Video
    "H264" => VIDEO, "H.264" => VIDEO, "X264" => VIDEO, "AVC" => VIDEO,
    "H265" => VIDEO, "H.265" => VIDEO, "X265" => VIDEO, "HEVC" => VIDEO,
    "AV1" => VIDEO, "VP9" => VIDEO, "XVID" => VIDEO,
    "10BIT" => VIDEO, "10-BIT" => VIDEO, "8BIT" => VIDEO, "HI10P" => VIDEO,
    "HDR" => VIDEO, "HDR10" => VIDEO, "REMUX" => VIDEO,

    // Audio
    "AAC" => AUDIO, "AC3" => AUDIO, "EAC3" => AUDIO, "E-AC-3" => AUDIO,
    "FLAC" => AUDIO, "MP3" => AUDIO, "OPUS" => AUDIO, "DTS" => AUDIO,
    "TRUEHD" => AUDIO, "2CH" => AUDIO, "6CH" => AUDIO,
    "DUAL-AUDIO" => AUDIO, "DUALAUDIO" => AUDIO,
    "2.0" => AUDIO_BRACKETED, "5.1" => AUDIO_BRACKETED,

    // Resolution
    "480P" => RESOLUTION, "720P" => RESOLUTION, "1080P" => RESOLUTION,
    "1080I" => RESOLUTION, "2160P" => RESOLUTION,
    "4K" => RESOLUTION_BRACKETED, "SD" => RESOLUTION_BRACKETED, "HD" => RESOLUTION_BRACKETED,

    // Source
    "BDRIP" => SOURCE, "BLURAY" => SOURCE, "BLU-RAY" => SOURCE, "DVDRIP" => SOURCE,
    "HDTV" => SOURCE, "TVRIP" => SOURCE, "WEBDL" => SOURCE, "WEB-DL" => SOURCE,
    "WEBRIP" => SOURCE, "AMZN" => SOURCE, "DSNP" => SOURCE,
    "BD" => SOURCE_BRACKETED, "DVD" => SOURCE_BRACKETED, "TV" => SOURCE_BRACKETED,
    "WEB" => SOURCE_BRACKETED, "CR" => SOURCE_BRACKETED, "NF" => SOURCE_BRACKETED,

    // Edition, type and subtitles
    "REMASTERED" => EDITION, "UNCENSORED" => EDITION, "UNCUT" => EDITION,
    "NCOP" => EDITION, "NCED" => EDITION,
    "MULTI-SUB" => EDITION, "MULTISUB" => EDITION, "SUBBED" => EDITION,
    "DUBBED" => EDITION, "SOFTSUBS" => EDITION, "HARDSUBS" => EDITION,
    "OVA" => EDITION_BRACKETED, "ONA" => EDITION_BRACKETED, "OAD" => EDITION_BRACKETED,
    "SPECIAL" => EDITION_BRACKETED, "MOVIE" => EDITION_BRACKETED,
    "BATCH" => EDITION_BRACKETED, "END" => EDITION_BRACKETED, "FINAL" => EDITION_BRACKETED,

    // Language
    "ENG" => LANGUAGE_BRACKETED, "JPN" => LANGUAGE_BRACKETED, "JAP" => LANGUAGE_BRACKETED,

    // Numbering markers
    "EP" => EPISODE, "EP." => EPISODE, "EPS" => EPISODE,
    "EPISODE" => EPISODE, "EPISODIO" => EPISODE,
    "SEASON" => SEASON, "SAISON" => SEASON,
    "PART" => PART, "COUR" => PART,
};

/// Look up `word` (case-insensitive). Bracket-only tags are skipped unless
/// `is_enclosed`.
pub fn find(word: &str, is_enclosed: bool) -> Option<Keyword> {
    let entry = VOCABULARY.get(word.to_uppercase().as_str())?;
    if !is_enclosed && entry.context.contains(Context::BRACKETED) {
        return None;
    }
    Some(entry.keyword)
}

/// True if `word` is a marker of the given kind.
pub fn is_marker(word: &str, numbering: Numbering) -> bool {
    find(word, false) == Some(Keyword::Marker(numbering))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive() {
        assert_eq!(find("hevc", false), Some(Keyword::Tag(Tag::Video)));
        assert_eq!(find("1080p", false), Some(Keyword::Tag(Tag::Resolution)));
        assert_eq!(find("Frieren", false), None);
    }

    #[test]
    fn test_bracketed_tags_need_brackets() {
        assert_eq!(find("TV", false), None);
        assert_eq!(find("TV", true), Some(Keyword::Tag(Tag::Source)));
        assert!(find("x264", false).is_some());
    }

    #[test]
    fn test_markers() {
        assert!(is_marker("Season", Numbering::Season));
        assert!(is_marker("EPISODE", Numbering::Episode));
        assert!(is_marker("cour", Numbering::Part));
        assert!(!is_marker("AAC", Numbering::Episode));
    }

    #[test]
    fn test_every_marker_needs_a_number() {
        for (word, entry) in VOCABULARY.entries() {
            let is_marker = matches!(entry.keyword, Keyword::Marker(_));
            assert_eq!(is_marker, entry.context.contains(Context::NUMBERED), "{word}");
        }
    }
}
