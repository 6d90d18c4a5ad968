//! Integration tests for the `cmk` CLI binary.
//!
//! These run the binary as a subprocess against an address nothing listens
//! on, so only argument handling, login URLs and error output are covered.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::process::Command;

fn run(args: &[&str], env: &[(&str, &str)]) -> (i32, String, String) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cmk"));
    cmd.args(args)
        .env("CMK_API_BASE_URL", "http://127.0.0.1:19999")
        .env_remove("CMK_TENANT")
        .env_remove("CMK_COOKIES")
        .env_remove("CMK_AUTH_URL")
        .env_remove("CMK_CONFIG_FILE")
        .env_remove("CMK_CONSOLE_ORIGIN")
        .env_remove("RUST_LOG");
    for (k, v) in env {
        cmd.env(k, v);
    }
    let output = cmd.output().expect("failed to execute cmk");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn version_flag() {
    let (code, stdout, _) = run(&["--version"], &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("cmk"), "version output: {stdout}");
}

#[test]
fn help_lists_commands() {
    let (code, stdout, _) = run(&["--help"], &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("CMK CLI"));
    for cmd in ["tenants", "key-configs", "keys", "systems", "groups", "tasks"] {
        assert!(stdout.contains(cmd), "help should list '{cmd}'");
    }
}

#[test]
fn systems_help_shows_gated_actions() {
    let (code, stdout, _) = run(&["systems", "link", "--help"], &[]);
    assert_eq!(code, 0);
    assert!(stdout.contains("--send-for-approval"));
}

// ── Login URL ────────────────────────────────────────────────────────

#[test]
fn login_url_requires_identity_provider() {
    let (code, _, stderr) = run(&["--tenant", "t1", "login-url"], &[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("CMK_AUTH_URL"), "stderr: {stderr}");
}

#[test]
fn login_url_points_at_tenant() {
    let (code, stdout, _) = run(
        &["--tenant", "t1", "login-url", "--origin", "https://console.example.com"],
        &[("CMK_AUTH_URL", "https://idp.example.com")],
    );
    assert_eq!(code, 0);
    assert!(
        stdout.contains("https://idp.example.com/sm/auth?tenant_id=t1&request_uri="),
        "stdout: {stdout}"
    );
}

#[test]
fn retry_login_url_returns_to_key_configurations() {
    let (code, stdout, _) = run(
        &["--tenant", "t1", "login-url", "--retry"],
        &[("CMK_AUTH_URL", "https://idp.example.com")],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("keyConfigs"), "stdout: {stdout}");
}

// ── Failures ─────────────────────────────────────────────────────────

#[test]
fn unreachable_backend_exits_nonzero() {
    let (code, _, stderr) = run(&["--tenant", "t1", "groups", "list"], &[]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Error:"), "stderr: {stderr}");
}

#[test]
fn invalid_base_url_is_rejected() {
    let (code, _, stderr) = run(
        &["--tenant", "t1", "keys", "get", "k1"],
        &[("CMK_API_BASE_URL", "ftp://kms.example.com")],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid API base URL"), "stderr: {stderr}");
}

#[test]
fn unreachable_console_origin_is_reported() {
    let output = Command::new(env!("CARGO_BIN_EXE_cmk"))
        .args(["--console-origin", "http://127.0.0.1:19999", "--tenant", "t1", "groups", "list"])
        .env_remove("CMK_API_BASE_URL")
        .env_remove("CMK_CONFIG_FILE")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute cmk");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load console configuration"),
        "stderr: {stderr}"
    );
}
