//! Integration tests for the `ovskit` CLI binary.
//!
//! Argument parsing, help output and error exit codes, all without a live
//! ovsdb-server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a command with env isolation: no `OVSKIT_*` variables and a
/// config directory that does not exist.
fn ovskit_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("ovskit");
    cmd.env("HOME", "/tmp/ovskit-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/ovskit-cli-test-nonexistent")
        .env_remove("OVSKIT_PROFILE")
        .env_remove("OVSKIT_TRANSPORT")
        .env_remove("OVSKIT_ENDPOINT")
        .env_remove("OVSKIT_DATABASE")
        .env_remove("OVSKIT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = ovskit_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn test_help_lists_resources() {
    ovskit_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("bridge")
            .and(predicate::str::contains("port"))
            .and(predicate::str::contains("interface")),
    );
}

#[test]
fn test_version_flag() {
    ovskit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("ovskit"));
}

#[test]
fn test_port_help_lists_subcommands() {
    ovskit_cmd().args(["port", "--help"]).assert().success().stdout(
        predicate::str::contains("add-internal")
            .and(predicate::str::contains("add-patch"))
            .and(predicate::str::contains("set-tag")),
    );
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_non_numeric_tag_is_a_usage_error() {
    ovskit_cmd()
        .args(["port", "set-tag", "br0", "p1", "ten"])
        .assert()
        .code(2);
}

#[test]
fn test_patch_interface_requires_peer() {
    ovskit_cmd()
        .args(["interface", "add", "p1", "patch-x", "--type", "patch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--peer"));
}

#[test]
fn test_remove_interface_requires_uuid() {
    ovskit_cmd()
        .args(["iface", "rm", "p1", "not-a-uuid"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_transport_is_rejected() {
    ovskit_cmd()
        .args(["--transport", "ssl", "bridge", "exists", "br0"])
        .assert()
        .code(2);
}

// ── Runtime errors ──────────────────────────────────────────────────

#[test]
fn test_unreachable_socket_exits_with_connection_code() {
    let output = ovskit_cmd()
        .args([
            "--transport",
            "unix",
            "--endpoint",
            "/tmp/ovskit-cli-test-nonexistent/db.sock",
            "bridge",
            "exists",
            "br0",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("Could not connect"));
}

#[test]
fn test_unknown_profile_exits_not_found() {
    let output = ovskit_cmd()
        .args(["--profile", "lab", "bridge", "exists", "br0"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Profile 'lab' not found"));
}

#[test]
fn test_bad_endpoint_is_a_usage_error() {
    ovskit_cmd()
        .args([
            "--transport",
            "tcp",
            "--endpoint",
            "10.0.0.1:port",
            "bridge",
            "exists",
            "br0",
        ])
        .assert()
        .code(2);
}
