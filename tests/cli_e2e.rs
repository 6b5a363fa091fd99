//! End-to-end CLI tests for the chemresolve binary.

use assert_cmd::Command;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test that the binary exits cleanly when stdin is empty.
#[test]
fn test_binary_invocation_returns_zero() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.assert().success();
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Resolve free-text chemical names"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("chemresolve"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

/// Test that out-of-range concurrency is rejected by the parser.
#[test]
fn test_binary_concurrency_out_of_range_rejected() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.args(["-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));

    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.args(["-c", "101"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

/// Test that an unknown scheduling mode is rejected by the parser.
#[test]
fn test_binary_unknown_mode_rejected() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.args(["--mode", "threads"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mode"));
}

/// Test that -q flag works (quiet mode).
#[test]
fn test_binary_quiet_flag_accepted() {
    let mut cmd = Command::cargo_bin("chemresolve").unwrap();
    cmd.arg("-q").assert().success();
}

/// Test the full pipeline against a mock backend: names in, rows out.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_resolves_names_against_mock_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/name/curcumin/property/CanonicalSMILES/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "PropertyTable": {"Properties": [{"CID": 969_516, "CanonicalSMILES": "CCO"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let base_url = server.uri();
    // assert_cmd blocks, so run it off the async runtime
    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("chemresolve").unwrap();
        cmd.args([
            "--base-url",
            &base_url,
            "-l",
            "0",
            "-q",
            "curcumin",
            "unobtainium",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("curcumin\tCCO"))
        .stdout(predicate::str::contains("unobtainium\t\n"));
    })
    .await
    .unwrap();
}

/// Test that names are read from stdin, one per line, skipping comments.
#[tokio::test(flavor = "multi_thread")]
async fn test_binary_reads_names_from_stdin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/name/quercetin/property/CanonicalSMILES/JSON"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "PropertyTable": {"Properties": [{"CID": 5_280_343, "CanonicalSMILES": "c1ccccc1"}]}
        })))
        .mount(&server)
        .await;

    let base_url = server.uri();
    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("chemresolve").unwrap();
        cmd.args(["--base-url", &base_url, "-l", "0", "-q"])
            .write_stdin("# comment\n\nquercetin\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("quercetin\tc1ccccc1"));
    })
    .await
    .unwrap();
}
