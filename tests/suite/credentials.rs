//! Credential store behavior across backends.

use std::fs;
use std::sync::Arc;

use chagee_session::{CredentialStore, KEYCHAIN_SERVICE, SecretBackend};

use crate::common::{FakeKeychain, TestHome};

#[test]
fn fallback_file_serves_tokens_without_native_service() {
    let home = TestHome::new();
    let store = CredentialStore::new(SecretBackend::FileFallback, home.token_file());

    store.save("u3", "tokZ").unwrap();

    assert_eq!(store.load("u3").as_deref(), Some("tokZ"));
    let raw = fs::read_to_string(home.token_file()).unwrap();
    assert!(raw.contains("tokZ"));
}

#[test]
fn native_save_keeps_token_out_of_the_file() {
    let home = TestHome::new();
    let keychain = Arc::new(FakeKeychain::default());
    let store = CredentialStore::new(SecretBackend::Native(keychain.clone()), home.token_file());

    store.save("u1", "tok1").unwrap();

    assert_eq!(keychain.get(KEYCHAIN_SERVICE, "auth:u1").as_deref(), Some("tok1"));
    assert!(!home.token_file().exists());
}

#[test]
fn locked_keychain_falls_back_to_file() {
    let home = TestHome::new();
    let store = CredentialStore::new(
        SecretBackend::Native(Arc::new(FakeKeychain::locked())),
        home.token_file(),
    );

    store.save("u1", "tok1").unwrap();
    assert_eq!(store.load("u1").as_deref(), Some("tok1"));

    store.clear("u1").unwrap();
    assert!(store.load("u1").is_none());
}

#[test]
fn tokens_for_other_users_survive_clear() {
    let home = TestHome::new();
    let store = CredentialStore::new(SecretBackend::FileFallback, home.token_file());
    store.save("u1", "a").unwrap();
    store.save("u2", "b").unwrap();

    store.clear("u1").unwrap();

    assert!(store.load("u1").is_none());
    assert_eq!(store.load("u2").as_deref(), Some("b"));
}

#[cfg(unix)]
#[test]
fn fallback_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let home = TestHome::new();
    let store = CredentialStore::new(SecretBackend::FileFallback, home.token_file());
    store.save("u1", "tok").unwrap();

    let mode = fs::metadata(home.token_file()).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);
}
