//! Storage locations.
//!
//! Everything lives under one directory, `~/.chagee-cli` by default. Tests and
//! alternate installs pass their own root through [`StoragePaths::in_dir`].

use std::env;
use std::path::{Path, PathBuf};

pub const SESSION_FILE: &str = "session.json";
pub const TOKEN_FILE: &str = "tokens.json";
pub const CONFIG_FILE: &str = "config.toml";

/// Overrides the storage directory when set and non-empty.
pub const HOME_ENV: &str = "CHAGEE_HOME";

const DEFAULT_DIR_NAME: &str = ".chagee-cli";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    dir: PathBuf,
    session_file: PathBuf,
    token_file: PathBuf,
}

impl StoragePaths {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            session_file: dir.join(SESSION_FILE),
            token_file: dir.join(TOKEN_FILE),
            dir,
        }
    }

    /// `$CHAGEE_HOME`, else `~/.chagee-cli`. `None` when no home directory exists.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        if let Ok(value) = env::var(HOME_ENV)
            && !value.trim().is_empty()
        {
            return Some(PathBuf::from(value));
        }
        dirs::home_dir().map(|home| home.join(DEFAULT_DIR_NAME))
    }

    #[must_use]
    pub fn default_location() -> Option<Self> {
        Self::default_dir().map(Self::in_dir)
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn session_file(&self) -> &Path {
        &self.session_file
    }

    #[must_use]
    pub fn token_file(&self) -> &Path {
        &self.token_file
    }

    #[must_use]
    pub fn config_file(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.dir.join("logs").join("chagee.log")
    }
}
