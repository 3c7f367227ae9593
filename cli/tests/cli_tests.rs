//! CLI integration tests for the idp binary
//!
//! These tests run the compiled binary against the built-in rule catalog
//! and against catalogs loaded from temporary files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

/// Get a Command instance for the idp binary
#[allow(deprecated)]
fn idp_cmd() -> Command {
    let mut cmd = Command::cargo_bin("idp").expect("Failed to find idp binary");
    cmd.arg("--no-color").env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// --help / --version
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    idp_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("classify"))
        .stdout(predicate::str::contains("rules"));
}

#[test]
fn test_version_flag() {
    idp_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// ============================================================================
// classify
// ============================================================================

#[test]
fn test_classify_locked_account() {
    idp_cmd()
        .args(["classify", "--status", "400", "--body", "User is locked out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ids/locked_account"))
        .stdout(predicate::str::contains("Account is locked"))
        .stdout(predicate::str::contains("upstream: User is locked out"));
}

#[test]
fn test_classify_json_output() {
    let output = idp_cmd()
        .args([
            "classify",
            "--status",
            "422",
            "--body",
            "Password_Validation_Failed: too short",
            "--json",
        ])
        .output()
        .expect("Failed to run idp");

    assert!(output.status.success());
    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(report["matched"], true);
    assert_eq!(report["status_code"], 422);
    assert_eq!(report["category"]["tier"], "api");
    assert_eq!(report["category"]["kind"], "password_not_strong_enough");
}

#[test]
fn test_classify_no_match() {
    idp_cmd()
        .args([
            "classify",
            "--status",
            "500",
            "--body",
            "Database connection refused",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("no match (status 500)"));
}

#[test]
fn test_classify_no_match_json_omits_category() {
    idp_cmd()
        .args(["classify", "-s", "500", "-b", "oops", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"matched\": false"))
        .stdout(predicate::str::contains("category").not());
}

#[test]
fn test_classify_strict_fails_on_match() {
    idp_cmd()
        .args([
            "classify",
            "--strict",
            "--status",
            "400",
            "--body",
            "User is locked out",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Account is locked"));
}

#[test]
fn test_classify_strict_succeeds_without_match() {
    idp_cmd()
        .args(["classify", "--strict", "-s", "500", "-b", "oops"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn test_classify_reads_body_from_stdin() {
    idp_cmd()
        .args(["classify", "--status", "404"])
        .write_stdin("User_Not_Found")
        .assert()
        .success()
        .stdout(predicate::str::contains("api/profile_not_exist"));
}

#[test]
fn test_classify_reads_body_from_file() {
    let mut file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    write!(file, "invalid_grant: Invalid code").unwrap();

    idp_cmd()
        .args(["classify", "--status", "400", "--body-file"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ids/invalid_two_fa_code"));
}

#[test]
fn test_classify_missing_body_file_fails() {
    idp_cmd()
        .args([
            "classify",
            "--status",
            "400",
            "--body-file",
            "nonexistent/body.txt",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read body"));
}

#[test]
fn test_classify_body_conflicts_with_body_file() {
    idp_cmd()
        .args([
            "classify",
            "--status",
            "400",
            "--body",
            "x",
            "--body-file",
            "y",
        ])
        .assert()
        .failure();
}

#[test]
fn test_classify_tier_restriction() {
    idp_cmd()
        .args([
            "classify",
            "--tier",
            "ids",
            "--status",
            "422",
            "--body",
            "Password_Validation_Failed",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn test_classify_with_config_file() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("Failed to create temp file");
    writeln!(
        file,
        r#"
include_defaults = false

[[api]]
kind = "profile_not_exist"
patterns = [".*no such user.*"]
"#
    )
    .unwrap();

    idp_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["classify", "--status", "404", "--body", "No such user: bob"])
        .assert()
        .success()
        .stdout(predicate::str::contains("api/profile_not_exist"));

    idp_cmd()
        .arg("--config")
        .arg(file.path())
        .args(["classify", "--status", "400", "--body", "User is locked out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn test_missing_config_file_fails() {
    idp_cmd()
        .args(["--config", "nonexistent/idp.toml", "rules"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load"));
}

// ============================================================================
// rules
// ============================================================================

#[test]
fn test_rules_lists_default_catalog() {
    idp_cmd()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("ids/invalid_two_fa_code"))
        .stdout(predicate::str::contains("api/profile_not_exist"))
        .stdout(predicate::str::contains("20 rules"));
}

#[test]
fn test_rules_tier_filter() {
    idp_cmd()
        .args(["rules", "--tier", "api"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12 rules"))
        .stdout(predicate::str::contains("ids/").not());
}

#[test]
fn test_rules_json() {
    let output = idp_cmd()
        .args(["rules", "--tier", "ids", "--json"])
        .output()
        .expect("Failed to run idp");

    assert!(output.status.success());
    let rules: Vec<serde_json::Value> =
        serde_json::from_slice(&output.stdout).expect("stdout should be JSON");
    assert_eq!(rules.len(), 8);
    assert_eq!(rules[0]["tier"], "ids");
    assert_eq!(rules[0]["index"], 0);
}
