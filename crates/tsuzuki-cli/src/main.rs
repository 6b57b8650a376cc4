use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tsuzuki_api::anilist::{auth::OAuthApp, AniListClient};
use tsuzuki_core::{
    AppConfig, ListEntryCache, Outcome, TokenStore, Tracker, Trigger, TsuzukiError,
};

/// Prefix the player script shows on screen; everything else is log output.
const OSD_PREFIX: &str = "OSD:";

#[derive(Parser)]
#[command(
    name = "tsuzuki",
    version,
    about = "Update your AniList list from the episode you just watched"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record the episode in FILE as watched
    Update {
        /// Path, URL or title of the file that was played
        file: String,
        /// JSON object overriding [policy] options for this call
        #[arg(long)]
        policy: Option<String>,
    },
    /// Open the AniList page of the show in FILE
    Launch {
        file: String,
        #[arg(long)]
        policy: Option<String>,
    },
    /// Authorize with AniList and store the access token
    Login,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            osd(&format!("Config error: {e}"));
            return ExitCode::from(e.exit_code());
        }
    };
    let _guard = init_logging(&config);

    let code = match run(cli.command, &config).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "tsuzuki failed");
            osd(&error_message(&e));
            e.exit_code()
        }
    };
    ExitCode::from(code)
}

async fn run(command: Command, config: &AppConfig) -> Result<u8, TsuzukiError> {
    match command {
        Command::Update { file, policy } => {
            track(config, &file, Trigger::Update, policy.as_deref()).await
        }
        Command::Launch { file, policy } => {
            track(config, &file, Trigger::Launch, policy.as_deref()).await
        }
        Command::Login => login(config).await,
    }
}

async fn track(
    config: &AppConfig,
    file: &str,
    trigger: Trigger,
    overrides: Option<&str>,
) -> Result<u8, TsuzukiError> {
    let policy = match overrides {
        Some(json) => config.policy.with_overrides(json)?,
        None => config.policy,
    };
    let token = TokenStore::new(config.token_path()).load()?;
    let tracker = Tracker::new(AniListClient::new(token), open_cache(config)?);

    let outcome = tracker.resolve_and_update(file, trigger, &policy).await?;
    osd(&outcome.osd_message());
    if let Outcome::Launched { url, .. } = &outcome {
        open::that(url)?;
    }
    Ok(outcome.exit_code())
}

async fn login(config: &AppConfig) -> Result<u8, TsuzukiError> {
    let anilist = &config.anilist;
    if anilist.client_id.is_empty() || anilist.client_secret.is_empty() {
        return Err(TsuzukiError::Config(format!(
            "set [anilist] client_id and client_secret in {}",
            AppConfig::config_path().display()
        )));
    }

    let app = OAuthApp {
        client_id: &anilist.client_id,
        client_secret: &anilist.client_secret,
    };
    let token = app
        .login()
        .await
        .map_err(|e| TsuzukiError::Auth(e.to_string()))?;
    let store = TokenStore::new(config.token_path());
    store.save(&token.access_token)?;
    // A new token may belong to another account.
    open_cache(config)?.clear_user_id()?;

    tracing::info!(
        path = %store.path().display(),
        expires_in = ?token.expires_in,
        "saved AniList token"
    );
    osd("Logged in to AniList");
    Ok(0)
}

fn open_cache(config: &AppConfig) -> Result<ListEntryCache, TsuzukiError> {
    ListEntryCache::open(&AppConfig::ensure_cache_path()?, config.cache.ttl())
}

/// Logs go to stderr, and to a daily file in the data directory when enabled.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    let (file_layer, guard) = if config.logging.file {
        let appender = tracing_appender::rolling::daily(AppConfig::data_dir(), "tsuzuki.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer().with_writer(writer).with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

fn osd(message: &str) {
    println!("{OSD_PREFIX} {message}");
}

fn error_message(err: &TsuzukiError) -> String {
    match err {
        TsuzukiError::Interpretation(e) => format!("Could not read the episode: {e}"),
        TsuzukiError::Resolution(e) => format!("Could not identify the season: {e}"),
        TsuzukiError::Transport(e) => format!("AniList request failed, try again: {e}"),
        other => other.to_string(),
    }
}
