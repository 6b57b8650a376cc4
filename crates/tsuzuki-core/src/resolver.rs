//! Mapping absolute episode numbers onto a season.
//!
//! A release numbered `152` with no season marker is placed by listing the
//! show's TV seasons in airing order and counting episodes until the number
//! is covered. Seasons that air as ONAs or carry inconsistent catalog data
//! break the count; that is a known limitation and is reported, not patched.

use tsuzuki_api::{AiringStatus, Catalog, CatalogMedia, SearchQuery};

use crate::error::{ResolutionError, TsuzukiError};
use crate::matcher::TitleMatcher;

/// Shortest episode (minutes) still counted as a regular season episode.
const MIN_EPISODE_MINUTES: u32 = 21;

/// A guess pinned to one catalog entry and an episode inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub media_id: u64,
    pub title: String,
    /// 1-based position among the show's seasons.
    pub season_index: u32,
    pub episode_in_season: u32,
    pub total_episodes: Option<u32>,
}

impl ResolvedIdentity {
    /// Pin `episode` to `media`, refusing episodes the season cannot hold.
    pub fn new(
        media: &CatalogMedia,
        season_index: u32,
        episode: u32,
    ) -> Result<Self, ResolutionError> {
        if episode == 0 {
            return Err(ResolutionError::NonPositiveEpisode);
        }
        if let Some(total) = media.episodes {
            if episode > total {
                return Err(ResolutionError::EpisodeOutOfRange {
                    title: media.display_title(),
                    episode,
                    total,
                });
            }
        }
        Ok(Self {
            media_id: media.id,
            title: media.display_title(),
            season_index,
            episode_in_season: episode,
            total_episodes: media.episodes,
        })
    }

    /// The media's page on AniList.
    pub fn url(&self) -> String {
        format!("https://anilist.co/anime/{}", self.media_id)
    }
}

/// Search the whole catalog for `title` and place `absolute_episode`.
#[tracing::instrument(skip(catalog))]
pub async fn resolve_absolute<C: Catalog>(
    catalog: &C,
    title: &str,
    absolute_episode: u32,
    year: Option<u32>,
) -> Result<ResolvedIdentity, TsuzukiError> {
    let candidates = catalog
        .search_media(&SearchQuery::global(title))
        .await
        .map_err(TsuzukiError::transport)?;
    if candidates.is_empty() {
        return Err(ResolutionError::NoCandidates {
            title: title.to_string(),
        }
        .into());
    }

    let seasons = season_order(candidates, title, year);
    if seasons.is_empty() {
        return Err(ResolutionError::NoSeasons {
            title: title.to_string(),
        }
        .into());
    }
    tracing::debug!(
        seasons = ?seasons.iter().map(|s| (s.id, s.episodes)).collect::<Vec<_>>(),
        "season order"
    );

    let resolved = walk(&seasons, absolute_episode)?;
    tracing::debug!(?resolved, "absolute episode placed");
    Ok(resolved)
}

/// Keep the candidates that count as seasons of `title` and sort them by
/// start date, then id.
pub fn season_order(
    candidates: Vec<CatalogMedia>,
    title: &str,
    year: Option<u32>,
) -> Vec<CatalogMedia> {
    let matcher = TitleMatcher::new(title);
    let mut seasons: Vec<CatalogMedia> = candidates
        .into_iter()
        .filter(|media| matcher.is_match(media))
        .filter(is_countable_season)
        .filter(|media| starts_in_or_after(media, year))
        .collect();
    seasons.sort_by_key(|media| (media.start_date.unwrap_or_default().sort_key(), media.id));
    seasons
}

/// TV seasons with full-length episodes. Shows that just started airing
/// often have no duration yet and are let through.
fn is_countable_season(media: &CatalogMedia) -> bool {
    media.is_tv()
        && match media.duration {
            Some(minutes) => minutes > MIN_EPISODE_MINUTES,
            None => media.status == Some(AiringStatus::Releasing),
        }
}

/// A year in the file name anchors the first season of a remake; earlier
/// adaptations are dropped and later seasons kept.
fn starts_in_or_after(media: &CatalogMedia, year: Option<u32>) -> bool {
    match (year, media.start_date.and_then(|d| d.year)) {
        (Some(year), Some(start)) => start >= year,
        _ => true,
    }
}

/// Accumulate episode counts over `seasons` until `absolute_episode` fits.
pub fn walk(
    seasons: &[CatalogMedia],
    absolute_episode: u32,
) -> Result<ResolvedIdentity, ResolutionError> {
    if absolute_episode == 0 {
        return Err(ResolutionError::NonPositiveEpisode);
    }

    let mut running_total = 0;
    for (index, media) in seasons.iter().enumerate() {
        let season_index = index as u32 + 1;
        let relative = absolute_episode - running_total;
        let is_last = index + 1 == seasons.len();

        match media.episodes {
            Some(total) if relative <= total => {
                return ResolvedIdentity::new(media, season_index, relative);
            }
            Some(total) => running_total += total,
            // The final season is usually still airing.
            None if is_last => return ResolvedIdentity::new(media, season_index, relative),
            None => {
                return Err(ResolutionError::UnknownSeasonLength {
                    title: media.display_title(),
                    episode: absolute_episode,
                });
            }
        }
    }

    let Some(last) = seasons.last() else {
        return Err(ResolutionError::NoSeasons {
            title: String::new(),
        });
    };
    Err(ResolutionError::EpisodeOutOfRange {
        title: last.display_title(),
        episode: absolute_episode,
        total: running_total,
    })
}
