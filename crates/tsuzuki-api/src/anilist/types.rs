use serde::Deserialize;

use super::error::AniListError;
use crate::traits::{
    AiringStatus, CatalogMedia, ListEntry, ListStatus, MediaFormat, MediaTitle, StartDate,
};

// ── GraphQL response wrappers ────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQLError>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

impl<T> GraphQLResponse<T> {
    /// Unwrap `data`, turning an error-only response into [`AniListError::GraphQL`].
    pub fn into_data(self) -> Result<T, AniListError> {
        match self.data {
            Some(data) => Ok(data),
            None => {
                let message = self
                    .errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(AniListError::GraphQL(if message.is_empty() {
                    "response carried no data".into()
                } else {
                    message
                }))
            }
        }
    }
}

// ── Search ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PageResponse {
    #[serde(rename = "Page")]
    pub page: PageData,
}

#[derive(Debug, Deserialize)]
pub struct PageData {
    pub media: Vec<AniListMedia>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AniListMedia {
    pub id: u64,
    pub title: Option<AniListTitle>,
    pub synonyms: Option<Vec<String>>,
    pub format: Option<MediaFormat>,
    pub duration: Option<u32>,
    pub episodes: Option<u32>,
    pub status: Option<AiringStatus>,
    pub start_date: Option<FuzzyDate>,
}

#[derive(Debug, Deserialize)]
pub struct AniListTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FuzzyDate {
    pub year: Option<u32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

// ── List entries ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MediaListResponse {
    #[serde(rename = "MediaList")]
    pub media_list: Option<MediaListEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SaveMediaListEntryResponse {
    #[serde(rename = "SaveMediaListEntry")]
    pub entry: MediaListEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaListEntry {
    pub media_id: u64,
    pub status: ListStatus,
    #[serde(default)]
    pub progress: Option<u32>,
    #[serde(default)]
    pub repeat: Option<u32>,
}

// ── Viewer ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ViewerResponse {
    #[serde(rename = "Viewer")]
    pub viewer: Viewer,
}

#[derive(Debug, Deserialize)]
pub struct Viewer {
    pub id: u64,
}

// ── Conversions ──────────────────────────────────────────────────

impl From<AniListMedia> for CatalogMedia {
    fn from(media: AniListMedia) -> Self {
        let title = media
            .title
            .map(|t| MediaTitle {
                romaji: t.romaji,
                english: t.english,
                native: t.native,
            })
            .unwrap_or_default();

        CatalogMedia {
            id: media.id,
            title,
            synonyms: media.synonyms.unwrap_or_default(),
            format: media.format,
            duration: media.duration,
            episodes: media.episodes,
            status: media.status,
            start_date: media.start_date.map(|d| StartDate {
                year: d.year,
                month: d.month,
                day: d.day,
            }),
        }
    }
}

impl From<MediaListEntry> for ListEntry {
    fn from(entry: MediaListEntry) -> Self {
        ListEntry {
            media_id: entry.media_id,
            status: entry.status,
            progress: entry.progress.unwrap_or(0),
            repeat: entry.repeat.unwrap_or(0),
        }
    }
}
