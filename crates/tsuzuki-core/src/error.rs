use thiserror::Error;

/// No usable title or episode could be read from the input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InterpretationError {
    #[error("empty file name")]
    EmptyInput,

    #[error("no episode number in \"{name}\"")]
    NoEpisode { name: String },

    #[error("no title in \"{name}\" or its parent folders")]
    NoTitle { name: String },
}

/// The catalog could not map the guess to a single season.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("no catalog entries match \"{title}\"")]
    NoCandidates { title: String },

    #[error("no TV seasons of \"{title}\" left after filtering")]
    NoSeasons { title: String },

    #[error("episode {episode} is past the {total} episodes of \"{title}\"")]
    EpisodeOutOfRange {
        title: String,
        episode: u32,
        total: u32,
    },

    #[error("\"{title}\" has an unknown episode count, cannot place absolute episode {episode}")]
    UnknownSeasonLength { title: String, episode: u32 },

    #[error("episode number must be at least 1")]
    NonPositiveEpisode,
}

/// Every failure the pipeline can report.
#[derive(Debug, Error)]
pub enum TsuzukiError {
    #[error(transparent)]
    Interpretation(#[from] InterpretationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("catalog request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not logged in: {0}")]
    Auth(String),
}

impl TsuzukiError {
    pub fn transport(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Transport(Box::new(err))
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Storage(_) | Self::Io(_) | Self::Auth(_) => 1,
            Self::Interpretation(_) => 2,
            Self::Resolution(_) => 3,
            Self::Transport(_) => 6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_kind() {
        let interp: TsuzukiError = InterpretationError::EmptyInput.into();
        let resolution: TsuzukiError = ResolutionError::NonPositiveEpisode.into();
        let transport = TsuzukiError::transport(std::io::Error::other("offline"));
        assert_eq!(interp.exit_code(), 2);
        assert_eq!(resolution.exit_code(), 3);
        assert_eq!(transport.exit_code(), 6);
        assert_eq!(TsuzukiError::Auth("no token".into()).exit_code(), 1);
    }

    #[test]
    fn test_messages() {
        let err = ResolutionError::EpisodeOutOfRange {
            title: "Frieren".into(),
            episode: 30,
            total: 28,
        };
        assert_eq!(
            err.to_string(),
            "episode 30 is past the 28 episodes of \"Frieren\""
        );
    }
}
