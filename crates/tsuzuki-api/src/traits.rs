//! The catalog interface the resolver and pipeline talk to.
//!
//! [`AniListClient`](crate::anilist::AniListClient) is the production
//! implementation; tests substitute an in-memory catalog.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// A remote anime catalog holding media metadata and the user's list.
pub trait Catalog: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Search media by title, in the catalog's relevance order.
    fn search_media(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<CatalogMedia>, Self::Error>> + Send;

    /// Numeric id of the authenticated user.
    fn viewer_id(&self) -> impl Future<Output = Result<u64, Self::Error>> + Send;

    /// The user's list entry for one media, or `None` if it is not on the list.
    fn list_entry(
        &self,
        user_id: u64,
        media_id: u64,
    ) -> impl Future<Output = Result<Option<ListEntry>, Self::Error>> + Send;

    /// Create or update a list entry, returning the saved state.
    fn save_list_entry(
        &self,
        media_id: u64,
        update: &ListEntryUpdate,
    ) -> impl Future<Output = Result<ListEntry, Self::Error>> + Send;
}

/// Parameters for a title search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    /// `Some(true)` restricts to the user's list, `None` searches everything.
    pub on_list: Option<bool>,
}

impl SearchQuery {
    pub fn on_list(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            on_list: Some(true),
        }
    }

    pub fn global(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            on_list: None,
        }
    }
}

/// One series as known to the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogMedia {
    pub id: u64,
    pub title: MediaTitle,
    pub synonyms: Vec<String>,
    pub format: Option<MediaFormat>,
    /// Episode duration in minutes.
    pub duration: Option<u32>,
    pub episodes: Option<u32>,
    pub status: Option<AiringStatus>,
    pub start_date: Option<StartDate>,
}

impl CatalogMedia {
    /// The name shown to the user: romaji, then English, then native.
    pub fn display_title(&self) -> String {
        self.title
            .romaji
            .as_deref()
            .or(self.title.english.as_deref())
            .or(self.title.native.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", self.id))
    }

    /// Every title variant including synonyms.
    pub fn all_titles(&self) -> impl Iterator<Item = &str> {
        [&self.title.romaji, &self.title.english, &self.title.native]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .chain(self.synonyms.iter().map(String::as_str))
    }

    pub fn is_tv(&self) -> bool {
        matches!(self.format, Some(MediaFormat::Tv | MediaFormat::TvShort))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaFormat {
    Tv,
    TvShort,
    Movie,
    Special,
    Ova,
    Ona,
    Music,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AiringStatus {
    Finished,
    Releasing,
    NotYetReleased,
    Cancelled,
    Hiatus,
    #[serde(other)]
    Other,
}

/// A possibly partial start date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDate {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl StartDate {
    /// Sort key where unknown components order after known ones.
    pub fn sort_key(&self) -> (u32, u32, u32) {
        (
            self.year.unwrap_or(u32::MAX),
            self.month.unwrap_or(u32::MAX),
            self.day.unwrap_or(u32::MAX),
        )
    }
}

/// Status of an entry on the user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ListStatus {
    Current,
    Planning,
    Completed,
    Repeating,
    Paused,
    Dropped,
}

impl ListStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "CURRENT",
            Self::Planning => "PLANNING",
            Self::Completed => "COMPLETED",
            Self::Repeating => "REPEATING",
            Self::Paused => "PAUSED",
            Self::Dropped => "DROPPED",
        }
    }
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The user's record for one media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEntry {
    pub media_id: u64,
    pub status: ListStatus,
    pub progress: u32,
    pub repeat: u32,
}

/// Fields to change on a list entry. `None` leaves a field untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListEntryUpdate {
    pub status: Option<ListStatus>,
    pub progress: Option<u32>,
}

impl ListEntryUpdate {
    pub fn progress(progress: u32) -> Self {
        Self {
            status: None,
            progress: Some(progress),
        }
    }

    pub fn status_and_progress(status: ListStatus, progress: u32) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_fallbacks() {
        let mut media = CatalogMedia {
            id: 7,
            ..Default::default()
        };
        assert_eq!(media.display_title(), "#7");

        media.title.english = Some("Frieren".into());
        assert_eq!(media.display_title(), "Frieren");

        media.title.romaji = Some("Sousou no Frieren".into());
        assert_eq!(media.display_title(), "Sousou no Frieren");
    }

    #[test]
    fn test_all_titles_includes_synonyms() {
        let media = CatalogMedia {
            id: 1,
            title: MediaTitle {
                romaji: Some("Shingeki no Kyojin".into()),
                english: Some("Attack on Titan".into()),
                native: None,
            },
            synonyms: vec!["AoT".into()],
            ..Default::default()
        };
        let titles: Vec<_> = media.all_titles().collect();
        assert_eq!(titles, vec!["Shingeki no Kyojin", "Attack on Titan", "AoT"]);
    }

    #[test]
    fn test_start_date_unknown_sorts_last() {
        let known = StartDate {
            year: Some(2013),
            month: Some(4),
            day: Some(7),
        };
        let month_only = StartDate {
            year: Some(2013),
            month: None,
            day: None,
        };
        assert!(known.sort_key() < month_only.sort_key());
        assert!(month_only.sort_key() < StartDate::default().sort_key());
    }

    #[test]
    fn test_unknown_format_deserializes() {
        let format: MediaFormat = serde_json::from_str(r#""TV_SHORT""#).unwrap();
        assert_eq!(format, MediaFormat::TvShort);
        let format: MediaFormat = serde_json::from_str(r#""MANGA""#).unwrap();
        assert_eq!(format, MediaFormat::Other);
    }
}
