//! Chagee CLI - binary entry point.
//!
//! ```text
//! main() -> ChageeConfig::load() -> init_tracing() -> SessionStore::load()
//!        -> AppState::from_partial() -> apply flags -> run command -> SessionStore::save()
//! ```
//!
//! Logs go to `<storage dir>/logs/chagee.log`, never to stdout, so `status --json`
//! stays machine-readable.

mod commands;

use std::{
    fs::{self, OpenOptions},
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use chagee_session::{ChageeConfig, CredentialStore, SessionStore, StoragePaths};
use chagee_types::{AppState, Mode};

use commands::Command;

#[derive(Parser, Debug)]
#[command(name = "chagee", version, about = "Order Chagee tea from the terminal")]
struct Cli {
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Ordering mode (persisted)
    #[arg(long, global = true, value_parser = parse_mode)]
    mode: Option<Mode>,

    /// Region code, e.g. SG (persisted)
    #[arg(long, global = true)]
    region: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

fn parse_mode(raw: &str) -> Result<Mode, String> {
    raw.parse::<Mode>().map_err(|e| e.to_string())
}

fn init_tracing(paths: Option<&StoragePaths>) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file(paths);

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mixing logs into command output.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file(paths: Option<&StoragePaths>) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(paths) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => warnings.push(format!(
                "Failed to open log file {}: {e}",
                candidate.display()
            )),
        }
    }

    (None, warnings)
}

fn log_file_candidates(paths: Option<&StoragePaths>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if let Some(paths) = paths {
        candidates.push(paths.log_file());
    }
    candidates.push(PathBuf::from(".chagee-cli").join("logs").join("chagee.log"));
    candidates
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging is not up yet; config problems go to stderr and defaults apply.
    let config = match ChageeConfig::load() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            eprintln!("warning: {e}; using defaults");
            ChageeConfig::default()
        }
    };

    let paths = config.storage_paths();
    init_tracing(paths.as_ref());

    let paths = paths.context(
        "could not determine a storage directory; set CHAGEE_HOME or [storage] dir in config.toml",
    )?;
    let credentials = CredentialStore::new(config.secret_backend(), paths.token_file());
    tracing::debug!(
        backend = credentials.backend().label(),
        dir = %paths.dir().display(),
        "Using storage"
    );
    let store = SessionStore::new(paths, credentials);

    let loaded = store.load();
    for warning in &loaded.warnings {
        eprintln!("warning: {warning}");
    }
    let mut state = match loaded.state {
        Some(partial) => AppState::from_partial(partial),
        None => config.initial_state(),
    };

    if let Some(mode) = cli.mode {
        state.session.mode = mode;
    }
    if let Some(region) = cli.region.as_deref().map(str::trim)
        && !region.is_empty()
    {
        state.session.region = region.to_ascii_uppercase();
    }
    let json = cli.json || state.session.json_output;

    let command = cli.command.unwrap_or(Command::Status);
    commands::run(
        &command,
        &mut state,
        &store,
        json,
        &mut std::io::stdin().lock(),
        &mut std::io::stdout().lock(),
    )?;

    store
        .save(&state)
        .with_context(|| format!("failed to save session to {}", store.path().display()))?;
    Ok(())
}
