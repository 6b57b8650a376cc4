//! One file-watch event, from file name to list mutation.

use tsuzuki_api::{Catalog, CatalogMedia, ListEntryUpdate, ListStatus, SearchQuery};

use crate::cache::{cache_key, ListEntryCache};
use crate::config::PolicyConfig;
use crate::decision::{decide, Action, RejectReason};
use crate::error::{ResolutionError, TsuzukiError};
use crate::interpret::{interpret, FilenameGuess};
use crate::resolver::{resolve_absolute, ResolvedIdentity};

/// What the player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The episode was watched; update the list entry.
    Update,
    /// Open the media's catalog page.
    Launch,
}

/// How an invocation ended, when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Updated {
        title: String,
        progress: u32,
        /// Set when the status changed too.
        status: Option<ListStatus>,
    },
    Added {
        title: String,
        progress: u32,
    },
    Launched {
        title: String,
        url: String,
    },
    Rejected {
        title: String,
        reason: RejectReason,
    },
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Updated { .. } | Self::Added { .. } | Self::Launched { .. } => 0,
            Self::Rejected { reason, .. } => reason.exit_code(),
        }
    }

    /// The status line shown in the player.
    pub fn osd_message(&self) -> String {
        match self {
            Self::Updated {
                title,
                progress,
                status: None,
            } => format!("Updated \"{title}\" to: {progress}"),
            Self::Updated {
                title,
                progress,
                status: Some(status),
            } => format!("Updated \"{title}\" to: {progress} ({status})"),
            Self::Added { title, progress } => {
                format!("Added \"{title}\" to your list with progress: {progress}")
            }
            Self::Launched { title, .. } => format!("Opening AniList for \"{title}\""),
            Self::Rejected {
                title,
                reason: RejectReason::NotOnList,
            } => format!("\"{title}\" is not on your list"),
            Self::Rejected { title, reason } => format!("Not updating \"{title}\": {reason}"),
        }
    }
}

/// The catalog client and cache for one process.
pub struct Tracker<C: Catalog> {
    catalog: C,
    cache: ListEntryCache,
}

impl<C: Catalog> Tracker<C> {
    pub fn new(catalog: C, cache: ListEntryCache) -> Self {
        Self { catalog, cache }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Identify the episode in `path` and act on it.
    #[tracing::instrument(skip(self, policy))]
    pub async fn resolve_and_update(
        &self,
        path: &str,
        trigger: Trigger,
        policy: &PolicyConfig,
    ) -> Result<Outcome, TsuzukiError> {
        let guess = interpret(path)?;
        tracing::info!(
            title = %guess.title,
            season = ?guess.season,
            episode = guess.episode,
            absolute = guess.is_absolute,
            "interpreted file name"
        );

        let Some(resolved) = self.identify(&guess, trigger, policy).await? else {
            tracing::info!(title = %guess.title, "no match on the list");
            return Ok(Outcome::Rejected {
                title: guess.title,
                reason: RejectReason::NotOnList,
            });
        };
        tracing::info!(
            media_id = resolved.media_id,
            title = %resolved.title,
            season = resolved.season_index,
            episode = resolved.episode_in_season,
            "resolved"
        );

        match trigger {
            Trigger::Launch => Ok(Outcome::Launched {
                url: resolved.url(),
                title: resolved.title,
            }),
            Trigger::Update => self.update(&resolved, policy).await,
        }
    }

    /// Map the guess to a catalog entry, from the cache when possible.
    /// `None` means nothing was found and the search was limited to the list.
    async fn identify(
        &self,
        guess: &FilenameGuess,
        trigger: Trigger,
        policy: &PolicyConfig,
    ) -> Result<Option<ResolvedIdentity>, TsuzukiError> {
        let key = cache_key(guess);
        if let Some(hit) = self.cache.lookup(&key)? {
            if let Some(resolved) = hit.rebase(guess.episode) {
                tracing::debug!(%key, fetched_at = %hit.fetched_at, "cache hit");
                return Ok(Some(resolved));
            }
            tracing::debug!(
                %key,
                offset = hit.episode_offset,
                "cached season does not cover episode"
            );
        }

        let text = guess.search_text();
        let mut candidates = self.search(SearchQuery::on_list(&text)).await?;
        if candidates.is_empty() {
            if trigger == Trigger::Update && !policy.add_entry_if_missing {
                return Ok(None);
            }
            candidates = self.search(SearchQuery::global(&text)).await?;
        }
        if candidates.is_empty() {
            return match trigger {
                Trigger::Update => Ok(None),
                Trigger::Launch => Err(ResolutionError::NoCandidates { title: text }.into()),
            };
        }

        let top = pick_top(candidates, guess.year)
            .ok_or(ResolutionError::NoCandidates { title: text })?;
        tracing::debug!(
            media_id = top.id,
            title = %top.display_title(),
            episodes = ?top.episodes,
            "top result"
        );

        let resolved = match (guess.season, top.episodes) {
            (None, Some(total)) if guess.episode > total => {
                resolve_absolute(&self.catalog, &guess.title, guess.episode, guess.year).await?
            }
            (None, _) => ResolvedIdentity::new(&top, 1, guess.episode)?,
            (Some(season), _) => ResolvedIdentity::new(&top, season, guess.episode)?,
        };

        self.cache.store(&key, &resolved, guess.episode)?;
        Ok(Some(resolved))
    }

    async fn update(
        &self,
        resolved: &ResolvedIdentity,
        policy: &PolicyConfig,
    ) -> Result<Outcome, TsuzukiError> {
        let user_id = self.user_id().await?;
        let current = self
            .catalog
            .list_entry(user_id, resolved.media_id)
            .await
            .map_err(TsuzukiError::transport)?;
        tracing::debug!(?current, "list entry");

        let action = decide(
            current.as_ref(),
            resolved.episode_in_season,
            resolved.total_episodes,
            policy,
        );
        let title = resolved.title.clone();

        match action {
            Action::Reject(reason) => {
                tracing::info!(%reason, "not updating");
                Ok(Outcome::Rejected { title, reason })
            }
            Action::SetProgress { progress } => {
                let saved = self
                    .save(resolved.media_id, ListEntryUpdate::progress(progress))
                    .await?;
                Ok(Outcome::Updated {
                    title,
                    progress: saved.progress,
                    status: None,
                })
            }
            Action::SetStatusAndProgress {
                status: ListStatus::Repeating,
                progress,
            } => {
                // AniList resets progress when the status change and the
                // progress arrive in one mutation.
                self.save(
                    resolved.media_id,
                    ListEntryUpdate::status_and_progress(ListStatus::Repeating, 0),
                )
                .await?;
                let saved = self
                    .save(resolved.media_id, ListEntryUpdate::progress(progress))
                    .await?;
                Ok(Outcome::Updated {
                    title,
                    progress: saved.progress,
                    status: Some(saved.status),
                })
            }
            Action::SetStatusAndProgress { status, progress } => {
                let saved = self
                    .save(
                        resolved.media_id,
                        ListEntryUpdate::status_and_progress(status, progress),
                    )
                    .await?;
                Ok(Outcome::Updated {
                    title,
                    progress: saved.progress,
                    status: Some(saved.status),
                })
            }
            Action::CreateAndSetProgress { status, progress } => {
                let saved = self
                    .save(
                        resolved.media_id,
                        ListEntryUpdate::status_and_progress(status, progress),
                    )
                    .await?;
                Ok(Outcome::Added {
                    title,
                    progress: saved.progress,
                })
            }
        }
    }

    async fn search(&self, query: SearchQuery) -> Result<Vec<CatalogMedia>, TsuzukiError> {
        let results = self
            .catalog
            .search_media(&query)
            .await
            .map_err(TsuzukiError::transport)?;
        tracing::debug!(text = %query.text, on_list = ?query.on_list, count = results.len(), "search");
        Ok(results)
    }

    async fn save(
        &self,
        media_id: u64,
        update: ListEntryUpdate,
    ) -> Result<tsuzuki_api::ListEntry, TsuzukiError> {
        let saved = self
            .catalog
            .save_list_entry(media_id, &update)
            .await
            .map_err(TsuzukiError::transport)?;
        tracing::info!(media_id, status = %saved.status, progress = saved.progress, "list entry saved");
        Ok(saved)
    }

    /// The viewer id, fetched once and then served from the cache.
    async fn user_id(&self) -> Result<u64, TsuzukiError> {
        if let Some(id) = self.cache.user_id()? {
            return Ok(id);
        }
        let id = self
            .catalog
            .viewer_id()
            .await
            .map_err(TsuzukiError::transport)?;
        self.cache.store_user_id(id)?;
        Ok(id)
    }
}

/// The most relevant result that does not predate the file's year.
fn pick_top(candidates: Vec<CatalogMedia>, year: Option<u32>) -> Option<CatalogMedia> {
    candidates.into_iter().find(|media| {
        match (year, media.start_date.and_then(|d| d.year)) {
            (Some(year), Some(start)) => start >= year,
            _ => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{season, Call, FakeCatalog};
    use chrono::Duration;

    fn tracker(catalog: FakeCatalog) -> Tracker<FakeCatalog> {
        let cache = ListEntryCache::open_memory(Duration::hours(24)).unwrap();
        Tracker::new(catalog, cache)
    }

    fn shingeki() -> Vec<CatalogMedia> {
        vec![
            season(16498, "Shingeki no Kyojin", 2013, Some(25)),
            season(20958, "Shingeki no Kyojin Season 2", 2017, Some(12)),
            season(99147, "Shingeki no Kyojin Season 3", 2018, Some(12)),
        ]
    }

    fn searches(calls: &[Call]) -> usize {
        calls.iter().filter(|c| matches!(c, Call::Search(_))).count()
    }

    #[tokio::test]
    async fn test_explicit_season_update() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Current, 4);
        let t = tracker(catalog);

        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E05.mkv", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Updated {
                title: "Shingeki no Kyojin Season 3".into(),
                progress: 5,
                status: None,
            }
        );
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(
            outcome.osd_message(),
            "Updated \"Shingeki no Kyojin Season 3\" to: 5"
        );
        assert_eq!(
            t.catalog().calls()[0],
            Call::Search(SearchQuery::on_list("Shingeki no Kyojin Season 3"))
        );
        assert_eq!(t.catalog().saves(), vec![(99147, ListEntryUpdate::progress(5))]);
    }

    #[tokio::test]
    async fn test_second_episode_served_from_cache() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Current, 4);
        let t = tracker(catalog);
        let policy = PolicyConfig::default();

        t.resolve_and_update("Shingeki no Kyojin S03E05.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        t.resolve_and_update("Shingeki no Kyojin S03E06.mkv", Trigger::Update, &policy)
            .await
            .unwrap();

        let calls = t.catalog().calls();
        assert_eq!(searches(&calls), 1);
        assert_eq!(calls.iter().filter(|c| **c == Call::Viewer).count(), 1);
        assert_eq!(t.catalog().entry(99147).unwrap().progress, 6);
    }

    #[tokio::test]
    async fn test_absolute_fast_path() {
        let catalog = FakeCatalog::new(vec![season(154587, "Sousou no Frieren", 2023, Some(28))])
            .with_entry(154587, ListStatus::Current, 4);
        let t = tracker(catalog);
        let outcome = t
            .resolve_and_update(
                "[SubsPlease] Sousou no Frieren - 05 (1080p).mkv",
                Trigger::Update,
                &PolicyConfig::default(),
            )
            .await
            .unwrap();
        assert!(matches!(outcome, Outcome::Updated { progress: 5, .. }));
    }

    #[tokio::test]
    async fn test_absolute_walk_then_cache_rebase() {
        let catalog = FakeCatalog::new(shingeki())
            .with_entry(16498, ListStatus::Completed, 25)
            .with_entry(99147, ListStatus::Current, 2);
        let t = tracker(catalog);
        let policy = PolicyConfig::default();

        let outcome = t
            .resolve_and_update("[Group] Shingeki no Kyojin - 40.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Updated {
                title: "Shingeki no Kyojin Season 3".into(),
                progress: 3,
                status: None,
            }
        );
        let searches_after_first = searches(&t.catalog().calls());
        assert_eq!(searches_after_first, 2);

        t.resolve_and_update("[Group] Shingeki no Kyojin - 41.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        assert_eq!(searches(&t.catalog().calls()), searches_after_first);
        assert_eq!(t.catalog().entry(99147).unwrap().progress, 4);
    }

    #[tokio::test]
    async fn test_remakes_keep_separate_cache_rows() {
        let catalog = FakeCatalog::new(vec![
            season(136, "Hunter x Hunter", 1999, Some(62)),
            season(11061, "Hunter x Hunter (2011)", 2011, Some(148)),
        ])
        .with_entry(136, ListStatus::Current, 5)
        .with_entry(11061, ListStatus::Current, 4);
        let t = tracker(catalog);
        let policy = PolicyConfig::default();

        t.resolve_and_update("Hunter x Hunter (2011) - 05.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        t.resolve_and_update("Hunter x Hunter (1999) - 06.mkv", Trigger::Update, &policy)
            .await
            .unwrap();

        assert_eq!(
            t.catalog().saves(),
            vec![
                (11061, ListEntryUpdate::progress(5)),
                (136, ListEntryUpdate::progress(6)),
            ]
        );
        assert_eq!(searches(&t.catalog().calls()), 2);
    }

    #[tokio::test]
    async fn test_not_on_list_is_rejected_without_mutation() {
        let t = tracker(FakeCatalog::new(shingeki()));
        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E05.mkv", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Rejected {
                title: "Shingeki no Kyojin".into(),
                reason: RejectReason::NotOnList,
            }
        );
        assert_eq!(outcome.exit_code(), 4);
        assert_eq!(searches(&t.catalog().calls()), 1);
        assert!(t.catalog().saves().is_empty());
    }

    #[tokio::test]
    async fn test_add_entry_if_missing() {
        let t = tracker(FakeCatalog::new(shingeki()));
        let policy = PolicyConfig {
            add_entry_if_missing: true,
            ..PolicyConfig::default()
        };
        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E05.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Added {
                title: "Shingeki no Kyojin Season 3".into(),
                progress: 5,
            }
        );
        assert_eq!(
            t.catalog().saves(),
            vec![(
                99147,
                ListEntryUpdate::status_and_progress(ListStatus::Current, 5)
            )]
        );
    }

    #[tokio::test]
    async fn test_completed_restart_is_two_mutations() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Completed, 12);
        let t = tracker(catalog);
        let policy = PolicyConfig {
            first_episode_restarts_completed: true,
            ..PolicyConfig::default()
        };
        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E01.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        assert_eq!(
            t.catalog().saves(),
            vec![
                (
                    99147,
                    ListEntryUpdate::status_and_progress(ListStatus::Repeating, 0)
                ),
                (99147, ListEntryUpdate::progress(1)),
            ]
        );
        assert_eq!(
            outcome,
            Outcome::Updated {
                title: "Shingeki no Kyojin Season 3".into(),
                progress: 1,
                status: Some(ListStatus::Repeating),
            }
        );
    }

    #[tokio::test]
    async fn test_completing_on_last_episode() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Current, 11);
        let t = tracker(catalog);
        let policy = PolicyConfig {
            complete_current_on_last_episode: true,
            ..PolicyConfig::default()
        };
        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E12.mkv", Trigger::Update, &policy)
            .await
            .unwrap();
        assert_eq!(
            outcome.osd_message(),
            "Updated \"Shingeki no Kyojin Season 3\" to: 12 (COMPLETED)"
        );
    }

    #[tokio::test]
    async fn test_policy_rejection_exit_code() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Paused, 3);
        let t = tracker(catalog);
        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S03E04.mkv", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap();
        assert_eq!(outcome.exit_code(), 5);
        assert!(t.catalog().saves().is_empty());
    }

    #[tokio::test]
    async fn test_launch_searches_globally_then_uses_cache() {
        let t = tracker(FakeCatalog::new(shingeki()));
        let policy = PolicyConfig::default();

        let outcome = t
            .resolve_and_update("Shingeki no Kyojin S02E03.mkv", Trigger::Launch, &policy)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Launched {
                title: "Shingeki no Kyojin Season 2".into(),
                url: "https://anilist.co/anime/20958".into(),
            }
        );
        let calls = t.catalog().calls();
        assert_eq!(
            calls,
            vec![
                Call::Search(SearchQuery::on_list("Shingeki no Kyojin Season 2")),
                Call::Search(SearchQuery::global("Shingeki no Kyojin Season 2")),
            ]
        );

        t.resolve_and_update("Shingeki no Kyojin S02E04.mkv", Trigger::Launch, &policy)
            .await
            .unwrap();
        assert_eq!(t.catalog().calls(), calls);
    }

    #[tokio::test]
    async fn test_launch_without_any_match() {
        let t = tracker(FakeCatalog::new(shingeki()));
        let err = t
            .resolve_and_update("Sousou no Frieren - 05.mkv", Trigger::Launch, &PolicyConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[tokio::test]
    async fn test_explicit_episode_past_season_end() {
        let catalog = FakeCatalog::new(shingeki()).with_entry(99147, ListStatus::Current, 4);
        let t = tracker(catalog);
        let err = t
            .resolve_and_update("Shingeki no Kyojin S03E13.mkv", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TsuzukiError::Resolution(ResolutionError::EpisodeOutOfRange { total: 12, .. })
        ));
    }

    #[tokio::test]
    async fn test_interpretation_failure() {
        let t = tracker(FakeCatalog::new(shingeki()));
        let err = t
            .resolve_and_update("", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(t.catalog().calls().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let catalog = FakeCatalog::new(shingeki());
        catalog.fail_requests();
        let t = tracker(catalog);
        let err = t
            .resolve_and_update("Shingeki no Kyojin S03E05.mkv", Trigger::Update, &PolicyConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 6);
    }

    #[test]
    fn test_pick_top_respects_year() {
        let candidates = vec![
            season(136, "Hunter x Hunter", 1999, Some(62)),
            season(11061, "Hunter x Hunter (2011)", 2011, Some(148)),
        ];
        assert_eq!(pick_top(candidates.clone(), Some(2011)).unwrap().id, 11061);
        assert_eq!(pick_top(candidates.clone(), None).unwrap().id, 136);
        assert!(pick_top(candidates, Some(2020)).is_none());
    }
}
