//! Session and credential persistence for the Chagee CLI.
//!
//! The session document (`session.json`) holds everything in
//! [`chagee_types::AppState`] except the auth token. Tokens live in the
//! [`CredentialStore`], which prefers the platform secret service and falls back
//! to an owner-only `tokens.json`.
//!
//! ```text
//! SessionStore::load() -> decode (versioned, per-field) -> CredentialStore::load(userId)
//! SessionStore::save() -> CredentialStore::save(userId, token) -> atomic write
//! ```

pub mod config;
pub mod credentials;
mod decode;
mod document;
mod error;
pub mod paths;
mod store;

pub use config::{BackendKind, ChageeConfig, ConfigError, expand_env_vars};
pub use credentials::{
    CredentialStore, DEFAULT_HELPER_TIMEOUT, KEYCHAIN_SERVICE, NativeSecretError,
    NativeSecretService, OsKeyring, SecretBackend, token_account,
};
pub use decode::SESSION_SCHEMA_VERSION;
pub use error::{CredentialError, SessionError};
pub use paths::StoragePaths;
pub use store::{SessionLoad, SessionStore};
