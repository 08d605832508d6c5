//! Auth token storage keyed by user id.
//!
//! Backend selection happens once, when the store is built:
//!
//! - [`SecretBackend::Native`]: consult the platform secret service first and use
//!   the fallback file only when it fails.
//! - [`SecretBackend::FileFallback`]: only the owner-only `tokens.json` mapping.
//!
//! Every native failure (missing entry, no keyring daemon, permission denied,
//! timeout) is treated as "not found" or "not stored" and falls through to the
//! file. Empty user ids and empty tokens are ignored by every operation.

mod fallback;
mod os_keyring;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::error::CredentialError;

pub use os_keyring::OsKeyring;

use fallback::FallbackTokenFile;

/// Service name for native secret-storage entries.
pub const KEYCHAIN_SERVICE: &str = "chagee-cli";

/// Upper bound on a single secret-service call.
pub const DEFAULT_HELPER_TIMEOUT: Duration = Duration::from_secs(5);

/// Account name for a user's token entry.
#[must_use]
pub fn token_account(user_id: &str) -> String {
    format!("auth:{user_id}")
}

#[derive(Debug, Error)]
pub enum NativeSecretError {
    #[error("secret service worker could not be started: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("secret service did not answer within {0:?}")]
    TimedOut(Duration),
    #[error("secret service worker exited without answering")]
    WorkerLost,
    #[error("no matching entry in the secret service")]
    NotFound,
    #[error("secret service returned an empty secret")]
    Empty,
    #[error("secret service failed: {0}")]
    Backend(String),
}

/// Platform secret-storage service ([`OsKeyring`], or a test double).
pub trait NativeSecretService: Send + Sync + fmt::Debug {
    fn find(&self, service: &str, account: &str) -> Result<String, NativeSecretError>;
    fn store(&self, service: &str, account: &str, secret: &str) -> Result<(), NativeSecretError>;
    fn delete(&self, service: &str, account: &str) -> Result<(), NativeSecretError>;
}

#[derive(Debug, Clone)]
pub enum SecretBackend {
    Native(Arc<dyn NativeSecretService>),
    FileFallback,
}

impl SecretBackend {
    /// The OS keyring where the target has one, the fallback file elsewhere.
    #[must_use]
    pub fn detect(helper_timeout: Duration) -> Self {
        if OsKeyring::available() {
            SecretBackend::Native(Arc::new(OsKeyring::new(helper_timeout)))
        } else {
            SecretBackend::FileFallback
        }
    }

    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self, SecretBackend::Native(_))
    }

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            SecretBackend::Native(_) => "native",
            SecretBackend::FileFallback => "file",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    backend: SecretBackend,
    fallback: FallbackTokenFile,
}

impl CredentialStore {
    pub fn new(backend: SecretBackend, fallback_path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            fallback: FallbackTokenFile::new(fallback_path.into()),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &SecretBackend {
        &self.backend
    }

    #[must_use]
    pub fn fallback_path(&self) -> &Path {
        self.fallback.path()
    }

    pub fn load(&self, user_id: &str) -> Option<String> {
        if user_id.is_empty() {
            return None;
        }

        if let SecretBackend::Native(service) = &self.backend {
            match service.find(KEYCHAIN_SERVICE, &token_account(user_id)) {
                Ok(token) if !token.is_empty() => return Some(token),
                Ok(_) => debug!(user_id, "Native secret service returned an empty token"),
                Err(e) => debug!(user_id, "Native token lookup failed: {e}"),
            }
        }

        self.fallback.load().remove(user_id)
    }

    /// Store `token` for `user_id`.
    ///
    /// Only a failed write of the fallback file is an error; a native failure
    /// just routes the token to the file.
    pub fn save(&self, user_id: &str, token: &str) -> Result<(), CredentialError> {
        if user_id.is_empty() || token.is_empty() {
            return Ok(());
        }

        if let SecretBackend::Native(service) = &self.backend {
            match service.store(KEYCHAIN_SERVICE, &token_account(user_id), token) {
                Ok(()) => return Ok(()),
                Err(e) => debug!(user_id, "Native token store failed, using fallback file: {e}"),
            }
        }

        let mut map = self.fallback.load();
        map.insert(user_id.to_string(), token.to_string());
        self.fallback.save(&map)
    }

    /// Remove every stored copy of the token for `user_id`.
    pub fn clear(&self, user_id: &str) -> Result<(), CredentialError> {
        if user_id.is_empty() {
            return Ok(());
        }

        if let SecretBackend::Native(service) = &self.backend
            && let Err(e) = service.delete(KEYCHAIN_SERVICE, &token_account(user_id))
        {
            debug!(user_id, "Native token delete failed (ignored): {e}");
        }

        let mut map = self.fallback.load();
        if map.remove(user_id).is_none() {
            return Ok(());
        }
        self.fallback.save(&map)
    }
}
