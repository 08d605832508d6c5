//! Session store load/save end to end against temporary storage roots.

use std::fs;
use std::sync::Arc;

use chagee_session::{KEYCHAIN_SERVICE, SESSION_SCHEMA_VERSION, SessionError};
use chagee_types::{AppState, AuthInfo, Mode, Phase, StoreRef};
use serde_json::json;

use crate::common::{FakeKeychain, TestHome};

#[test]
fn cold_start_yields_nothing_and_unauth() {
    let home = TestHome::new();
    let load = home.file_store().load();

    assert!(load.state.is_none());
    assert!(load.warnings.is_empty());
    assert!(!home.session_file().exists());

    let state = load
        .state
        .map_or_else(AppState::initial, AppState::from_partial);
    assert_eq!(state.phase(), Phase::Unauth);
}

#[test]
fn token_never_reaches_session_document() {
    let home = TestHome::new();
    let keychain = Arc::new(FakeKeychain::default());
    let store = home.native_store(keychain.clone());

    let mut state = AppState::initial();
    state.auth = Some(AuthInfo::new("u1", "SECRET123"));
    store.save(&state).unwrap();

    assert!(!home.read_session_raw().contains("SECRET123"));
    assert_eq!(
        keychain.get(KEYCHAIN_SERVICE, "auth:u1").as_deref(),
        Some("SECRET123")
    );

    let load = store.load();
    assert!(load.warnings.is_empty());
    let auth = load.state.unwrap().auth.unwrap();
    assert_eq!(auth.user_id, "u1");
    assert_eq!(auth.token, "SECRET123");
}

#[test]
fn token_round_trips_through_fallback_file() {
    let home = TestHome::new();
    let store = home.file_store();

    let mut state = AppState::initial();
    state.auth = Some(AuthInfo::new("u1", "SECRET123"));
    store.save(&state).unwrap();

    assert!(!home.read_session_raw().contains("SECRET123"));
    let reloaded = AppState::from_partial(store.load().state.unwrap());
    assert_eq!(reloaded.auth, state.auth);
}

#[test]
fn newer_schema_loads_with_warning() {
    let home = TestHome::new();
    home.write_session(&json!({
        "schemaVersion": SESSION_SCHEMA_VERSION + 1,
        "session": { "mode": "live", "region": "SG" },
        "selectedStore": { "storeNo": "S1", "openHours": "10-22" },
        "cart": [{ "sku": "A", "qty": 1, "toppings": ["pearl"] }],
        "cartVersion": 5,
        "loyalty": { "points": 10 }
    }));

    let load = home.file_store().load();

    assert!(!load.warnings.is_empty());
    let state = AppState::from_partial(load.state.unwrap());
    assert_eq!(state.session.mode, Mode::Live);
    assert_eq!(state.cart_version, 5);
    assert_eq!(state.selected_store.unwrap().store_no, "S1");
}

#[test]
fn auth_without_stored_token_is_dropped() {
    let home = TestHome::new();
    home.write_session(&json!({
        "schemaVersion": SESSION_SCHEMA_VERSION,
        "session": {},
        "auth": { "userId": "u2" },
        "selectedStore": { "storeNo": "S1" }
    }));

    let load = home.native_store(Arc::new(FakeKeychain::default())).load();

    let partial = load.state.unwrap();
    assert!(partial.auth.is_none());
    assert!(load.warnings.iter().any(|w| w.contains("u2")));
    assert_eq!(AppState::from_partial(partial).phase(), Phase::Unauth);
}

#[test]
fn mid_cart_state_survives_restart() {
    let home = TestHome::new();
    let store = home.file_store();

    let mut state = AppState::initial();
    state.auth = Some(AuthInfo::new("u1", "tok"));
    state.select_store(StoreRef::new("S1"));
    state.add_cart_item("A", 2);
    store.save(&state).unwrap();

    let reloaded = AppState::from_partial(store.load().state.unwrap());
    assert_eq!(reloaded.phase(), Phase::CartDirty);
    assert_eq!(reloaded.cart, state.cart);
    assert_eq!(reloaded.cart_version, state.cart_version);
}

#[test]
fn legacy_document_is_upgraded_on_next_save() {
    let home = TestHome::new();
    home.write_session(&json!({
        "schemaVersion": 1,
        "state": {
            "session": { "mode": "dry-run" },
            "auth": { "userId": "u1", "token": "legacy-tok" }
        }
    }));
    let store = home.file_store();

    let load = store.load();
    assert_eq!(load.warnings.len(), 1);
    let state = AppState::from_partial(load.state.unwrap());
    assert_eq!(state.auth.as_ref().unwrap().token, "legacy-tok");

    store.save(&state).unwrap();
    let doc = home.read_session();
    assert_eq!(doc["schemaVersion"], json!(SESSION_SCHEMA_VERSION));
    assert_eq!(doc["auth"], json!({ "userId": "u1" }));
    assert!(doc.get("state").is_none());

    let again = store.load();
    assert!(again.warnings.is_empty());
    assert_eq!(again.state.unwrap().auth.unwrap().token, "legacy-tok");
}

#[test]
fn wrong_shaped_fields_are_reported_and_dropped() {
    let home = TestHome::new();
    home.write_session(&json!({
        "schemaVersion": SESSION_SCHEMA_VERSION,
        "session": {},
        "cart": "A x2",
        "quote": 12
    }));

    let load = home.file_store().load();

    assert_eq!(load.warnings.len(), 2);
    assert!(load.warnings.iter().any(|w| w.contains("`cart`")));
    assert!(load.warnings.iter().any(|w| w.contains("`quote`")));
    let state = AppState::from_partial(load.state.unwrap());
    assert!(state.cart.is_empty());
    assert!(state.quote.is_none());
}

#[test]
fn document_without_session_is_discarded() {
    let home = TestHome::new();
    home.write_session(&json!({ "schemaVersion": 2, "cartVersion": 3 }));

    let load = home.file_store().load();
    assert!(load.state.is_none());
    assert_eq!(load.warnings.len(), 1);
}

#[test]
fn garbage_document_degrades_to_warning() {
    let home = TestHome::new();
    fs::write(home.session_file(), b"\x00\x01not json").unwrap();

    let load = home.file_store().load();
    assert!(load.state.is_none());
    assert_eq!(load.warnings.len(), 1);
}

#[test]
fn save_surfaces_write_failures() {
    let home = TestHome::new();
    let blocked = home.path().join("not-a-dir");
    fs::write(&blocked, "").unwrap();
    let paths = chagee_session::StoragePaths::in_dir(&blocked);
    let credentials = chagee_session::CredentialStore::new(
        chagee_session::SecretBackend::FileFallback,
        paths.token_file(),
    );
    let store = chagee_session::SessionStore::new(paths, credentials);

    let mut state = AppState::initial();
    assert!(matches!(store.save(&state), Err(SessionError::Io { .. })));

    state.auth = Some(AuthInfo::new("u1", "tok"));
    assert!(matches!(
        store.save(&state),
        Err(SessionError::Credential(_))
    ));
}
