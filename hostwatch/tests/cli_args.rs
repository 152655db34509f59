//! CLI arg handling tests for hostwatch
use assert_cmd::prelude::*;
use std::process::Command;

fn hostwatch(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("hostwatch").expect("binary exists");
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("HOSTWATCH_PASSWORD");
    cmd
}

fn text(out: &std::process::Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    )
}

#[test]
fn test_help_mentions_short_and_long_flags() {
    let td = tempfile::tempdir().unwrap();
    let out = hostwatch(td.path()).arg("--help").output().expect("run hostwatch --help");
    assert!(out.status.success());
    let t = text(&out);
    for flag in ["--tls-ca", "-t", "--profile", "-P", "--host", "-H", "--user", "-u", "--form", "--dry-run"] {
        assert!(t.contains(flag), "help text missing {flag}\n{t}");
    }
}

#[test]
fn test_help_explains_password_input() {
    let td = tempfile::tempdir().unwrap();
    let out = hostwatch(td.path()).arg("-h").output().expect("run hostwatch -h");
    assert!(out.status.success());
    let t = text(&out);
    assert!(t.contains("HOSTWATCH_PASSWORD"), "{t}");
    assert!(t.contains("echoed"), "{t}");
}

#[test]
fn test_help_wins_over_other_flags() {
    let td = tempfile::tempdir().unwrap();
    for args in [
        vec!["--tls-ca", "/tmp/cert.pem", "--help"],
        vec!["-t", "/tmp/cert.pem", "-h"],
        vec!["--profile", "dev", "--help"],
    ] {
        let out = hostwatch(td.path()).args(&args).output().expect("run hostwatch");
        assert!(out.status.success(), "{args:?} did not succeed");
        assert!(text(&out).contains("Usage:"));
    }
}

#[test]
fn test_bad_form_is_a_usage_error() {
    let td = tempfile::tempdir().unwrap();
    let out = hostwatch(td.path())
        .args(["--form", "chart", "ws://gw/ws"])
        .output()
        .expect("run hostwatch");
    assert_eq!(out.status.code(), Some(2));
    assert!(text(&out).contains("Unknown form"));
}

#[test]
fn test_missing_host_fails() {
    let td = tempfile::tempdir().unwrap();
    let out = hostwatch(td.path())
        .args(["-u", "root", "ws://gw/ws", "--dry-run"])
        .output()
        .expect("run hostwatch");
    assert!(!out.status.success());
    assert!(text(&out).contains("no target host"));
}

#[test]
fn test_non_websocket_url_fails() {
    let td = tempfile::tempdir().unwrap();
    let out = hostwatch(td.path())
        .args(["-H", "h", "-u", "root", "http://gw/ws", "--dry-run"])
        .output()
        .expect("run hostwatch");
    assert!(!out.status.success());
    assert!(text(&out).contains("invalid gateway url"), "{}", text(&out));
}
