//! Optional `config.toml` in the storage directory.
//!
//! ```toml
//! [app]
//! mode = "dry-run"
//! region = "SG"
//!
//! [storage]
//! dir = "${HOME}/.chagee-cli"
//!
//! [credentials]
//! backend = "auto"
//! helper_timeout_ms = 5000
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chagee_types::{AppState, Mode};
use serde::Deserialize;
use thiserror::Error;

use crate::credentials::{DEFAULT_HELPER_TIMEOUT, SecretBackend};
use crate::paths::StoragePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ChageeConfig {
    pub app: Option<AppConfig>,
    pub storage: Option<StorageConfig>,
    pub credentials: Option<CredentialsConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Defaults for a fresh state. A loaded session keeps its own values.
#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    pub mode: Option<Mode>,
    pub region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Storage root. `${VAR}` references and a leading `~` are expanded.
    pub dir: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Platform secret service when available, else the fallback file.
    #[default]
    Auto,
    /// Always the fallback file.
    File,
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub backend: BackendKind,
    pub helper_timeout_ms: Option<u64>,
}

/// Replace each `${VAR}` with the variable's value (empty when unset).
/// An unterminated `${` is kept verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let var = &after[..end];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn expand_home(value: &str) -> PathBuf {
    if value == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = value.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(value)
}

impl ChageeConfig {
    /// Read `config.toml` from the default storage directory.
    ///
    /// A missing file (or no resolvable home) is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match StoragePaths::default_location() {
            Some(paths) => Self::load_from(&paths.config_file()),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Storage root from `[storage] dir`, else the default location.
    #[must_use]
    pub fn storage_paths(&self) -> Option<StoragePaths> {
        let configured = self
            .storage
            .as_ref()
            .and_then(|storage| storage.dir.as_deref())
            .map(expand_env_vars)
            .filter(|dir| !dir.trim().is_empty());

        match configured {
            Some(dir) => Some(StoragePaths::in_dir(expand_home(dir.trim()))),
            None => StoragePaths::default_location(),
        }
    }

    #[must_use]
    pub fn helper_timeout(&self) -> Duration {
        self.credentials
            .as_ref()
            .and_then(|c| c.helper_timeout_ms)
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_HELPER_TIMEOUT, Duration::from_millis)
    }

    #[must_use]
    pub fn backend_kind(&self) -> BackendKind {
        self.credentials
            .as_ref()
            .map(|c| c.backend)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn secret_backend(&self) -> SecretBackend {
        match self.backend_kind() {
            BackendKind::Auto => SecretBackend::detect(self.helper_timeout()),
            BackendKind::File => SecretBackend::FileFallback,
        }
    }

    /// [`AppState::initial`] with `[app]` defaults applied.
    #[must_use]
    pub fn initial_state(&self) -> AppState {
        let mut state = AppState::initial();
        if let Some(app) = &self.app {
            if let Some(mode) = app.mode {
                state.session.mode = mode;
            }
            if let Some(region) = app.region.as_deref().map(str::trim)
                && !region.is_empty()
            {
                state.session.region = region.to_ascii_uppercase();
            }
        }
        state
    }
}
