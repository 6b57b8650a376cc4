use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::TsuzukiError;
use crate::interpret::FilenameGuess;
use crate::normalize::normalize;
use crate::resolver::ResolvedIdentity;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_cache.sql");

/// A resolution remembered for one normalized title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedIdentity {
    pub media_id: u64,
    pub title: String,
    pub season_index: u32,
    /// Absolute minus season-relative episode at the time of caching.
    pub episode_offset: u32,
    pub total_episodes: Option<u32>,
    pub fetched_at: DateTime<Utc>,
}

impl CachedIdentity {
    /// Place `episode` with the stored offset, or `None` when it falls
    /// outside the cached season.
    pub fn rebase(&self, episode: u32) -> Option<ResolvedIdentity> {
        let relative = episode.checked_sub(self.episode_offset)?;
        if relative == 0 {
            return None;
        }
        if matches!(self.total_episodes, Some(total) if relative > total) {
            return None;
        }
        Some(ResolvedIdentity {
            media_id: self.media_id,
            title: self.title.clone(),
            season_index: self.season_index,
            episode_in_season: relative,
            total_episodes: self.total_episodes,
        })
    }
}

/// Cache key for a guess: the normalized title plus the season marker, so
/// `S02` files and absolutely numbered files of one show never share a row.
/// The year keeps remakes sharing a title apart.
pub fn cache_key(guess: &FilenameGuess) -> String {
    let mut key = normalize(&guess.title);
    match guess.season {
        Some(season) => key.push_str(&format!("#s{season}")),
        None => key.push_str("#abs"),
    }
    if let Some(part) = guess.part {
        key.push_str(&format!("p{part}"));
    }
    if let Some(year) = guess.year {
        key.push_str(&format!("#y{year}"));
    }
    key
}

/// SQLite-backed cache of resolved titles and the viewer id.
pub struct ListEntryCache {
    conn: Connection,
    ttl: Duration,
}

impl ListEntryCache {
    /// Open (or create) the cache at the given path and run migrations.
    pub fn open(path: &Path, ttl: Duration) -> Result<Self, TsuzukiError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn, ttl })
    }

    /// Open an in-memory cache (for tests).
    pub fn open_memory(ttl: Duration) -> Result<Self, TsuzukiError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn, ttl })
    }

    // ── Resolved titles ─────────────────────────────────────────

    pub fn lookup(&self, key: &str) -> Result<Option<CachedIdentity>, TsuzukiError> {
        self.lookup_at(key, Utc::now())
    }

    /// Expired rows are deleted before the lookup.
    pub(crate) fn lookup_at(
        &self,
        key: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CachedIdentity>, TsuzukiError> {
        let purged = self.conn.execute(
            "DELETE FROM resolved_titles WHERE fetched_at < ?1",
            params![timestamp(now - self.ttl)],
        )?;
        if purged > 0 {
            tracing::debug!(purged, "dropped expired cache rows");
        }

        self.conn
            .query_row(
                "SELECT media_id, title, season_index, episode_offset, total_episodes, fetched_at
                 FROM resolved_titles WHERE cache_key = ?1",
                params![key],
                |row| {
                    let fetched_at: String = row.get(5)?;
                    Ok(CachedIdentity {
                        media_id: row.get::<_, i64>(0)? as u64,
                        title: row.get(1)?,
                        season_index: row.get(2)?,
                        episode_offset: row.get(3)?,
                        total_episodes: row.get(4)?,
                        fetched_at: parse_datetime(&fetched_at),
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Remember how `absolute_episode` was resolved.
    pub fn store(
        &self,
        key: &str,
        resolved: &ResolvedIdentity,
        absolute_episode: u32,
    ) -> Result<(), TsuzukiError> {
        self.store_at(key, resolved, absolute_episode, Utc::now())
    }

    pub(crate) fn store_at(
        &self,
        key: &str,
        resolved: &ResolvedIdentity,
        absolute_episode: u32,
        now: DateTime<Utc>,
    ) -> Result<(), TsuzukiError> {
        let offset = absolute_episode.saturating_sub(resolved.episode_in_season);
        self.conn.execute(
            "INSERT OR REPLACE INTO resolved_titles
             (cache_key, media_id, title, season_index, episode_offset, total_episodes, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                key,
                resolved.media_id as i64,
                resolved.title,
                resolved.season_index,
                offset,
                resolved.total_episodes,
                timestamp(now),
            ],
        )?;
        Ok(())
    }

    // ── Viewer ──────────────────────────────────────────────────

    /// The cached id of the logged-in user, within the same TTL as titles.
    pub fn user_id(&self) -> Result<Option<u64>, TsuzukiError> {
        self.user_id_at(Utc::now())
    }

    pub(crate) fn user_id_at(&self, now: DateTime<Utc>) -> Result<Option<u64>, TsuzukiError> {
        let expired = self.conn.execute(
            "DELETE FROM viewer WHERE fetched_at < ?1",
            params![timestamp(now - self.ttl)],
        )?;
        if expired > 0 {
            tracing::debug!("cached viewer id expired");
        }

        self.conn
            .query_row("SELECT user_id FROM viewer WHERE id = 1", [], |row| {
                row.get::<_, i64>(0)
            })
            .optional()
            .map(|id| id.map(|id| id as u64))
            .map_err(Into::into)
    }

    pub fn store_user_id(&self, user_id: u64) -> Result<(), TsuzukiError> {
        self.store_user_id_at(user_id, Utc::now())
    }

    pub(crate) fn store_user_id_at(
        &self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> Result<(), TsuzukiError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO viewer (id, user_id, fetched_at) VALUES (1, ?1, ?2)",
            params![user_id as i64, timestamp(now)],
        )?;
        Ok(())
    }

    /// Forget the viewer, e.g. after logging in with another account.
    pub fn clear_user_id(&self) -> Result<(), TsuzukiError> {
        self.conn.execute("DELETE FROM viewer", [])?;
        Ok(())
    }
}

/// Run schema migrations using `PRAGMA user_version` for version tracking.
fn run_migrations(conn: &Connection) -> Result<(), TsuzukiError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

/// Fixed-width UTC timestamps so SQLite's text comparison orders them.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}
