use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn simulate_help_lists_session_flags() {
    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    let output = cmd
        .arg("simulate")
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    for flag in ["--peers", "--url", "--steps", "--fail-first-load", "--realtime"] {
        assert!(text.contains(flag), "simulate help missing {flag}");
    }
}

#[test]
fn offset_prints_seconds_from_sharing_link() {
    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    cmd.arg("offset")
        .arg("https://www.youtube.com/watch?v=abc&t=90s")
        .assert()
        .success()
        .stdout(predicate::eq("90\n"));
}

#[test]
fn offset_rejects_non_http_links() {
    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    cmd.arg("offset")
        .arg("ftp://example.com/movie.mp4")
        .assert()
        .failure();
}

#[test]
fn check_config_renders_file_and_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vidsync.toml");
    fs::write(
        &path,
        "default_url = \"https://example.com/movie.mp4\"\nsync_threshold_secs = 8.0\n",
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    cmd.arg("check-config")
        .arg(&path)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("https://example.com/movie.mp4")
                .and(predicate::str::contains("# warning: sync_threshold_secs")),
        );
}

#[test]
fn check_config_rejects_zero_retry_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vidsync.toml");
    fs::write(&path, "retry_timeout_secs = 0.0\n").unwrap();

    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    cmd.arg("check-config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("retry_timeout_secs"));
}

#[test]
fn short_simulation_converges() {
    let mut cmd = cargo_bin_cmd!("vidsyncctl");
    let output = cmd
        .env("RUST_LOG", "off")
        .args(["simulate", "--peers", "3", "--steps", "20"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    assert_eq!(text.matches("playing").count(), 3, "{text}");
}
