//! `smoc` binary end to end.
//!
//! GREEN when:
//! - `config-hash` prints a hash and refuses literal secrets
//! - `update` persists through the admin-ajax endpoint and exits non-zero on
//!   any outcome that did not persist
//! - `session` submits, advances focus and honors the blur confirmation

use assert_cmd::Command;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};

const AJAX_PATH: &str = "/wp-admin/admin-ajax.php";

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let p = dir.join(name);
    std::fs::write(&p, body).unwrap();
    p
}

fn config_for(dir: &Path, endpoint: &str) -> PathBuf {
    write(
        dir,
        "reorder.yaml",
        &format!("reorder:\n  record_type: \"product\"\n  endpoint: \"{endpoint}\"\n"),
    )
}

/// Isolated from the developer's shell and any `.env.local`.
fn smoc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("smoc").unwrap();
    cmd.current_dir(dir)
        .env_remove("SMOC_ENDPOINT")
        .env_remove("SMOC_RECORD_TYPE")
        .env("RUST_LOG", "off");
    cmd
}

#[test]
fn config_hash_prints_hash_and_canonical_json() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), "https://shop.example/wp-admin/admin-ajax.php");

    smoc(dir.path())
        .arg("config-hash")
        .arg(&cfg)
        .assert()
        .success()
        .stdout(predicate::str::is_match("^config_hash=[0-9a-f]{64}\n").unwrap())
        .stdout(predicate::str::contains("\"record_type\":\"product\""));
}

#[test]
fn config_hash_refuses_secret_literal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = write(dir.path(), "bad.yaml", "reorder:\n  key: \"sk_live_0123456789\"\n");

    smoc(dir.path())
        .arg("config-hash")
        .arg(&cfg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_SECRET_DETECTED"))
        .stderr(predicate::str::contains("0123456789").not());
}

#[test]
fn update_persists_through_endpoint() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(AJAX_PATH)
            .query_param("action", "smoc_reorder")
            .query_param("_wpnonce", "abc")
            .body_contains("post_id=42")
            .body_contains("post_menu_order=7");
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &server.url(AJAX_PATH));

    smoc(dir.path())
        .arg("update")
        .arg("--config")
        .arg(&cfg)
        .args(["--post-id", "42", "--nonce", "abc", "--current", "5", "--value", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("smoc-42 outcome=updated menu_order=7"));

    mock.assert();
}

#[test]
fn update_without_nonce_is_disabled_and_sends_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(AJAX_PATH);
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &server.url(AJAX_PATH));

    smoc(dir.path())
        .arg("update")
        .arg("--config")
        .arg(&cfg)
        .args(["--post-id", "42", "--value", "7"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("The postNonce is invalid."));

    mock.assert_hits(0);
}

#[test]
fn update_against_unreachable_endpoint_fails_as_transport() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), "http://127.0.0.1:1/wp-admin/admin-ajax.php");

    smoc(dir.path())
        .arg("update")
        .arg("--config")
        .arg(&cfg)
        .args(["--post-id", "42", "--nonce", "abc", "--value", "7"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("outcome=failed origin=transport"));
}

#[test]
fn endpoint_env_override_wins_over_config() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(AJAX_PATH);
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), "http://127.0.0.1:1/unused");

    smoc(dir.path())
        .env("SMOC_ENDPOINT", server.url(AJAX_PATH))
        .arg("update")
        .arg("--config")
        .arg(&cfg)
        .args(["--post-id", "42", "--nonce", "abc", "--value", "3"])
        .assert()
        .success();

    mock.assert();
}

#[test]
fn session_submits_advances_and_confirms_blur() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(AJAX_PATH);
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &server.url(AJAX_PATH));
    let fields = write(
        dir.path(),
        "fields.yaml",
        "fields:\n  - post_id: 42\n    nonce: a42\n    menu_order: 5\n  - post_id: 43\n    nonce: a43\n    menu_order: 6\n",
    );

    smoc(dir.path())
        .arg("session")
        .arg("--config")
        .arg(&cfg)
        .arg("--fields")
        .arg(&fields)
        .write_stdin("9\nb 4\ny\nl\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "smoc-42 outcome=updated menu_order=9 next=smoc-43",
        ))
        .stdout(predicate::str::contains(
            "Should the menu order value be updated? [y/N]",
        ))
        .stdout(predicate::str::contains("smoc-43 outcome=updated menu_order=4"));

    mock.assert_hits(2);
}

#[test]
fn session_declined_blur_reverts_without_request() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(AJAX_PATH);
        then.status(200).json_body(json!({"success": true}));
    });

    let dir = tempfile::tempdir().unwrap();
    let cfg = config_for(dir.path(), &server.url(AJAX_PATH));
    let fields = write(
        dir.path(),
        "fields.yaml",
        "fields:\n  - post_id: 42\n    nonce: a42\n    menu_order: 5\n",
    );

    smoc(dir.path())
        .arg("session")
        .arg("--config")
        .arg(&cfg)
        .arg("--fields")
        .arg(&fields)
        .write_stdin("b 8\nn\nl\nq\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("smoc-42 outcome=declined"))
        .stdout(predicate::str::contains("smoc-42 menu_order=5"));

    mock.assert_hits(0);
}
