//! Runs the `gestio` binary and checks that stdout stays machine-readable.

use std::path::Path;
use std::process::{Command, Output};

fn gestio(storage: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gestio"))
        .args(args)
        .env("GESTIO_STORAGE_DIR", storage)
        .env("GESTIO_DEMO_MODE", "1")
        .env_remove("GESTIO_DEMO_SECRET")
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn whoami_prints_a_single_json_document() {
    let dir = tempfile::tempdir().unwrap();
    let output = gestio(dir.path(), &["whoami"]);

    assert!(output.status.success());
    let user = stdout_json(&output);
    assert_eq!(user["is_authenticated"], false);
    // Startup logging still happens, on stderr.
    assert!(!output.stderr.is_empty());
}

#[test]
fn session_persists_between_invocations() {
    let dir = tempfile::tempdir().unwrap();

    let login = gestio(dir.path(), &["login", "Jean Dupont", "password123"]);
    assert!(login.status.success());
    assert_eq!(stdout_json(&login)["name"], "Jean Dupont");

    let whoami = gestio(dir.path(), &["whoami"]);
    assert_eq!(stdout_json(&whoami)["id"], 1);

    let granted = gestio(dir.path(), &["check", "inventory.view"]);
    assert!(granted.status.success());
    let denied = gestio(dir.path(), &["check", "inventory.delete"]);
    assert_eq!(denied.status.code(), Some(1));

    assert!(gestio(dir.path(), &["logout"]).status.success());
    assert_eq!(stdout_json(&gestio(dir.path(), &["whoami"]))["is_authenticated"], false);
}
