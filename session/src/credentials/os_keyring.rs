//! OS keyring backend: macOS keychain, Windows Credential Manager, or the
//! freedesktop Secret Service.
//!
//! Each call runs on its own worker thread and is abandoned after the configured
//! timeout, so a hung unlock prompt or D-Bus service cannot stall the CLI. An
//! abandoned call finishes detached and its answer is dropped.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use super::{NativeSecretError, NativeSecretService};

#[derive(Debug, Clone)]
pub struct OsKeyring {
    timeout: Duration,
}

impl OsKeyring {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Whether this target has a platform store. Elsewhere `keyring` only has
    /// an in-process mock, which forgets everything on exit.
    #[must_use]
    pub const fn available() -> bool {
        cfg!(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "windows",
            target_os = "linux",
            target_os = "freebsd",
            target_os = "openbsd"
        ))
    }

    fn call<T, F>(&self, service: &str, account: &str, op: F) -> Result<T, NativeSecretError>
    where
        T: Send + 'static,
        F: FnOnce(&keyring::Entry) -> keyring::Result<T> + Send + 'static,
    {
        let service = service.to_string();
        let account = account.to_string();
        with_deadline(self.timeout, move || {
            let entry = keyring::Entry::new(&service, &account)?;
            Ok(op(&entry)?)
        })
    }
}

impl From<keyring::Error> for NativeSecretError {
    fn from(error: keyring::Error) -> Self {
        match error {
            keyring::Error::NoEntry => NativeSecretError::NotFound,
            other => NativeSecretError::Backend(other.to_string()),
        }
    }
}

impl NativeSecretService for OsKeyring {
    fn find(&self, service: &str, account: &str) -> Result<String, NativeSecretError> {
        let secret = self.call(service, account, keyring::Entry::get_password)?;
        if secret.is_empty() {
            return Err(NativeSecretError::Empty);
        }
        Ok(secret)
    }

    fn store(&self, service: &str, account: &str, secret: &str) -> Result<(), NativeSecretError> {
        let secret = secret.to_string();
        self.call(service, account, move |entry| entry.set_password(&secret))
    }

    fn delete(&self, service: &str, account: &str) -> Result<(), NativeSecretError> {
        match self.call(service, account, keyring::Entry::delete_credential) {
            Err(NativeSecretError::NotFound) => Ok(()),
            other => other,
        }
    }
}

/// Run `op` on a worker thread and wait at most `timeout` for its answer.
pub(crate) fn with_deadline<T, F>(timeout: Duration, op: F) -> Result<T, NativeSecretError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, NativeSecretError> + Send + 'static,
{
    // Capacity 1: an abandoned worker can still hand off its answer and exit.
    let (tx, rx) = mpsc::sync_channel(1);
    thread::Builder::new()
        .name("chagee-keyring".to_string())
        .spawn(move || {
            let _ = tx.send(op());
        })
        .map_err(NativeSecretError::Spawn)?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(NativeSecretError::TimedOut(timeout)),
        Err(RecvTimeoutError::Disconnected) => Err(NativeSecretError::WorkerLost),
    }
}
