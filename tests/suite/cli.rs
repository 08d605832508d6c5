//! The `chagee` binary against an isolated storage root.

use std::fs;
use std::io::Write;
use std::process::{Command, Output, Stdio};

use serde_json::Value;

use crate::common::TestHome;

fn chagee(home: &TestHome, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_chagee"))
        .args(args)
        .env("CHAGEE_HOME", home.path())
        .env_remove("RUST_LOG")
        .current_dir(home.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn file_backend_home() -> TestHome {
    let home = TestHome::new();
    fs::write(
        home.path().join("config.toml"),
        "[credentials]\nbackend = \"file\"\n",
    )
    .unwrap();
    home
}

fn status_json(home: &TestHome) -> Value {
    let out = chagee(home, &["--json", "status"], "");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    serde_json::from_slice(&out.stdout).unwrap()
}

#[test]
fn fresh_home_reports_unauth() {
    let home = file_backend_home();
    let status = status_json(&home);
    assert_eq!(status["phase"], "UNAUTH");
    assert_eq!(status["mode"], "dry-run");
    assert_eq!(status["cartVersion"], 0);
}

#[test]
fn ordering_flow_persists_between_invocations() {
    let home = file_backend_home();

    let out = chagee(&home, &["login", "u1"], "SECRET123\n");
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(status_json(&home)["phase"], "AUTH_NO_STORE");

    assert!(chagee(&home, &["store", "S1"], "").status.success());
    assert!(chagee(&home, &["cart", "add", "A", "2"], "").status.success());

    let status = status_json(&home);
    assert_eq!(status["phase"], "CART_DIRTY");
    assert_eq!(status["userId"], "u1");
    assert_eq!(status["storeNo"], "S1");
    assert_eq!(status["cartItems"], 1);

    assert!(!home.read_session_raw().contains("SECRET123"));
    assert!(fs::read_to_string(home.token_file()).unwrap().contains("SECRET123"));

    assert!(chagee(&home, &["logout"], "").status.success());
    assert_eq!(status_json(&home)["phase"], "UNAUTH");
    assert!(!fs::read_to_string(home.token_file()).unwrap().contains("SECRET123"));
}

#[test]
fn mode_flag_is_persisted() {
    let home = file_backend_home();
    assert!(chagee(&home, &["--mode", "live", "status"], "").status.success());
    assert_eq!(status_json(&home)["mode"], "live");
}

#[test]
fn load_warnings_go_to_stderr() {
    let home = file_backend_home();
    home.write_session(&serde_json::json!({
        "schemaVersion": 2,
        "session": {},
        "auth": { "userId": "u2" }
    }));

    let out = chagee(&home, &["status"], "");
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("u2"), "{stderr}");
    assert!(String::from_utf8_lossy(&out.stdout).contains("UNAUTH"));
}

#[test]
fn zero_quantity_is_rejected() {
    let home = file_backend_home();
    let out = chagee(&home, &["cart", "add", "A", "0"], "");
    assert!(!out.status.success());
}
