use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::TsuzukiError;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub anilist: AniListConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Rules the decision engine follows when mutating a list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Add the media to the list as CURRENT when it is not there yet.
    pub add_entry_if_missing: bool,
    /// Keep updating progress while an entry is REPEATING.
    pub update_progress_while_repeating: bool,
    /// Watching episode 1 of a COMPLETED show starts a rewatch.
    pub first_episode_restarts_completed: bool,
    pub complete_current_on_last_episode: bool,
    pub complete_repeating_on_last_episode: bool,
    /// Complete on the last episode whatever the previous status was.
    pub complete_regardless_of_status: bool,
    /// Treat PAUSED and DROPPED entries like CURRENT.
    pub resume_paused_or_dropped: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            add_entry_if_missing: false,
            update_progress_while_repeating: true,
            first_episode_restarts_completed: false,
            complete_current_on_last_episode: false,
            complete_repeating_on_last_episode: true,
            complete_regardless_of_status: false,
            resume_paused_or_dropped: false,
        }
    }
}

/// Per-invocation overrides handed over by the player script as JSON.
///
/// Accepts the snake_case names and the script's historical UPPER_CASE
/// spelling. Keys that only matter to the script are ignored.
#[derive(Debug, Default, Deserialize)]
struct PolicyOverrides {
    #[serde(alias = "ADD_ENTRY_IF_MISSING")]
    add_entry_if_missing: Option<bool>,
    #[serde(alias = "UPDATE_PROGRESS_WHEN_REWATCHING")]
    update_progress_while_repeating: Option<bool>,
    #[serde(alias = "SET_COMPLETED_TO_REWATCHING_ON_FIRST_EPISODE")]
    first_episode_restarts_completed: Option<bool>,
    #[serde(alias = "SET_TO_COMPLETED_AFTER_LAST_EPISODE_CURRENT")]
    complete_current_on_last_episode: Option<bool>,
    #[serde(alias = "SET_TO_COMPLETED_AFTER_LAST_EPISODE_REWATCHING")]
    complete_repeating_on_last_episode: Option<bool>,
    complete_regardless_of_status: Option<bool>,
    resume_paused_or_dropped: Option<bool>,
}

impl PolicyConfig {
    /// Return a copy with the fields named in `json` replaced.
    pub fn with_overrides(&self, json: &str) -> Result<Self, TsuzukiError> {
        let o: PolicyOverrides = serde_json::from_str(json)
            .map_err(|e| TsuzukiError::Config(format!("invalid policy JSON: {e}")))?;
        let d = self;
        Ok(Self {
            add_entry_if_missing: o.add_entry_if_missing.unwrap_or(d.add_entry_if_missing),
            update_progress_while_repeating: o
                .update_progress_while_repeating
                .unwrap_or(d.update_progress_while_repeating),
            first_episode_restarts_completed: o
                .first_episode_restarts_completed
                .unwrap_or(d.first_episode_restarts_completed),
            complete_current_on_last_episode: o
                .complete_current_on_last_episode
                .unwrap_or(d.complete_current_on_last_episode),
            complete_repeating_on_last_episode: o
                .complete_repeating_on_last_episode
                .unwrap_or(d.complete_repeating_on_last_episode),
            complete_regardless_of_status: o
                .complete_regardless_of_status
                .unwrap_or(d.complete_regardless_of_status),
            resume_paused_or_dropped: o
                .resume_paused_or_dropped
                .unwrap_or(d.resume_paused_or_dropped),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AniListConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Overrides the default token location.
    pub token_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_hours: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.ttl_hours))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    /// Also write a daily log file under the data directory.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tsuzuki=info".into(),
            file: false,
        }
    }
}

impl AppConfig {
    /// Load config: the user file if it exists, otherwise the built-in defaults.
    pub fn load() -> Result<Self, TsuzukiError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            let user_str = std::fs::read_to_string(&user_path)?;
            Self::from_toml(&user_str)
        } else {
            Self::from_toml(DEFAULT_CONFIG)
        }
    }

    pub fn from_toml(s: &str) -> Result<Self, TsuzukiError> {
        toml::from_str(s).map_err(|e| TsuzukiError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Where the access token lives.
    pub fn token_path(&self) -> PathBuf {
        self.anilist.token_path.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|d| d.config_dir().join("anilist_token.txt"))
                .unwrap_or_else(|| PathBuf::from("anilist_token.txt"))
        })
    }

    /// Data directory holding the cache database and log files.
    pub fn data_dir() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ensure the data directory exists and return the cache DB path.
    pub fn ensure_cache_path() -> Result<PathBuf, TsuzukiError> {
        let dir = Self::data_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir.join("cache.db"))
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "tsuzuki")
    }
}
