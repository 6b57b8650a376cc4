use std::path::{Path, PathBuf};

use crate::error::TsuzukiError;

/// The AniList access token on disk.
///
/// The file holds the token on its first non-empty line. Older installs
/// wrote `<user id>:<token>` on that line and appended `;;`-separated cache
/// rows below it; both are cleaned up the first time the file is read.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the token, rewriting a legacy-format file in place.
    pub fn load(&self) -> Result<String, TsuzukiError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.missing());
            }
            Err(e) => return Err(e.into()),
        };

        let (token, cleaned) = clean_token_file(&content);
        let token = token.ok_or_else(|| self.missing())?;
        if cleaned != content {
            tracing::info!(path = %self.path.display(), "rewrote legacy token file");
            std::fs::write(&self.path, cleaned)?;
        }
        Ok(token)
    }

    pub fn save(&self, token: &str) -> Result<(), TsuzukiError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, format!("{}\n", token.trim()))?;
        Ok(())
    }

    fn missing(&self) -> TsuzukiError {
        TsuzukiError::Auth(format!(
            "no AniList token in {}; run `tsuzuki login` or paste a token there",
            self.path.display()
        ))
    }
}

/// Pull the token out of `content` and return it with the cleaned file body.
fn clean_token_file(content: &str) -> (Option<String>, String) {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.contains(";;"));

    let token = lines.next().map(|first| match first.split_once(':') {
        Some((user_id, token)) if user_id.chars().all(|c| c.is_ascii_digit()) => {
            token.trim().to_string()
        }
        _ => first.to_string(),
    });

    let cleaned = match &token {
        Some(token) => format!("{token}\n"),
        None => String::new(),
    };
    (token, cleaned)
}
