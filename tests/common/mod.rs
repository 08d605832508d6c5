//! Shared test utilities and fixtures

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chagee_session::{
    CredentialStore, NativeSecretError, NativeSecretService, SecretBackend, SessionStore,
    StoragePaths,
};
use serde_json::Value;
use tempfile::TempDir;

/// In-memory stand-in for the platform secret service.
#[derive(Debug, Default)]
pub struct FakeKeychain {
    entries: Mutex<HashMap<(String, String), String>>,
    locked: bool,
}

impl FakeKeychain {
    /// A keychain that rejects every call, as a locked or missing one would.
    pub fn locked() -> Self {
        Self {
            locked: true,
            ..Self::default()
        }
    }

    pub fn get(&self, service: &str, account: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .get(&(service.to_string(), account.to_string()))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), NativeSecretError> {
        if self.locked {
            return Err(NativeSecretError::Backend(
                "User interaction is not allowed.".to_string(),
            ));
        }
        Ok(())
    }
}

impl NativeSecretService for FakeKeychain {
    fn find(&self, service: &str, account: &str) -> Result<String, NativeSecretError> {
        self.check()?;
        self.get(service, account).ok_or(NativeSecretError::NotFound)
    }

    fn store(&self, service: &str, account: &str, secret: &str) -> Result<(), NativeSecretError> {
        self.check()?;
        self.entries.lock().unwrap().insert(
            (service.to_string(), account.to_string()),
            secret.to_string(),
        );
        Ok(())
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), NativeSecretError> {
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .remove(&(service.to_string(), account.to_string()));
        Ok(())
    }
}

/// Isolated storage root that is removed when dropped.
pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> StoragePaths {
        StoragePaths::in_dir(self.path())
    }

    pub fn session_file(&self) -> PathBuf {
        self.paths().session_file().to_path_buf()
    }

    pub fn token_file(&self) -> PathBuf {
        self.paths().token_file().to_path_buf()
    }

    /// Store backed only by the fallback token file.
    pub fn file_store(&self) -> SessionStore {
        let paths = self.paths();
        let credentials = CredentialStore::new(SecretBackend::FileFallback, paths.token_file());
        SessionStore::new(paths, credentials)
    }

    /// Store backed by `keychain`, with the fallback file beside the session.
    pub fn native_store(&self, keychain: Arc<FakeKeychain>) -> SessionStore {
        let paths = self.paths();
        let credentials = CredentialStore::new(SecretBackend::Native(keychain), paths.token_file());
        SessionStore::new(paths, credentials)
    }

    pub fn write_session(&self, doc: &Value) {
        fs::write(self.session_file(), serde_json::to_vec_pretty(doc).unwrap()).unwrap();
    }

    pub fn read_session_raw(&self) -> String {
        fs::read_to_string(self.session_file()).unwrap()
    }

    pub fn read_session(&self) -> Value {
        serde_json::from_str(&self.read_session_raw()).unwrap()
    }
}
