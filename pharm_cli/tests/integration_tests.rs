//! Integration tests for the pharmquest binary.
//!
//! These tests verify end-to-end behavior including:
//! - Catalog and level listings
//! - Content validation
//! - Auto-played years and the JSON snapshot
//! - Configuration overrides

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a scratch directory for config files
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("pharmquest"))
}

fn auto_play_json(year: &str, extra: &[&str]) -> serde_json::Value {
    let output = cli()
        .args(["play", "--year", year, "--auto", "--json"])
        .args(extra)
        .output()
        .expect("Failed to run pharmquest");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not a JSON snapshot")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Community pharmacy practice game"));
}

#[test]
fn test_levels_lists_every_year() {
    cli()
        .arg("levels")
        .assert()
        .success()
        .stdout(predicate::str::contains("Year 1"))
        .stdout(predicate::str::contains("Year 3"))
        .stdout(predicate::str::contains("rx-005"));
}

#[test]
fn test_levels_single_year() {
    cli()
        .args(["levels", "--year", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Year 2"))
        .stdout(predicate::str::contains("Year 1").not());
}

#[test]
fn test_levels_rejects_bad_year() {
    cli().args(["levels", "--year", "4"]).assert().failure();
}

#[test]
fn test_med_lookup() {
    cli()
        .args(["med", "med-003"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Amoxicillin"))
        .stdout(predicate::str::contains("Counseling questions: 3"));
}

#[test]
fn test_med_unknown_fails() {
    cli()
        .args(["med", "med-999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("med-999"));
}

#[test]
fn test_check_passes_on_builtin_content() {
    cli()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Content OK"));
}

#[test]
fn test_auto_play_year_one_narrative() {
    cli()
        .args(["play", "--year", "1", "--auto"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Chapter 1"))
        .stdout(predicate::str::contains("Counseling complete"))
        .stdout(predicate::str::contains("Year 1 complete!"));
}

#[test]
fn test_auto_play_year_one_snapshot() {
    let snapshot = auto_play_json("1", &[]);

    assert_eq!(snapshot["year"], 1);
    // Four chapters played, counter sits past the last one
    assert_eq!(snapshot["level"], 5);
    assert_eq!(snapshot["stage"], "receiving");
    assert_eq!(snapshot["allergy_conflict_detected"], false);
    assert!(snapshot["rx_points"].as_i64().unwrap() >= 300);
    assert!(snapshot["rank"].is_string());
}

#[test]
fn test_auto_play_year_three_handles_short_circuit() {
    let snapshot = auto_play_json("3", &[]);

    assert_eq!(snapshot["year"], 3);
    assert_eq!(snapshot["level"], 5);
    assert!(snapshot["rx_points"].as_i64().unwrap() > 0);
}

#[test]
fn test_config_rewards_override() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[rewards.counseling]\nscore = 40\nrx_points = 0\n\n[rewards.picking]\nscore = 70\nrx_points = 0\n",
    )
    .unwrap();

    let default_points = auto_play_json("1", &[])["rx_points"].as_i64().unwrap();
    let config_str = config_path.to_str().unwrap();
    let reduced_points = auto_play_json("1", &["--config", config_str])["rx_points"]
        .as_i64()
        .unwrap();

    // Four levels each lose picking (30) and counseling (15) points
    assert_eq!(default_points - reduced_points, 4 * (30 + 15));
}

#[test]
fn test_config_default_year_used() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[game]\ndefault_year = 2\n").unwrap();

    let output = cli()
        .args(["--config", config_path.to_str().unwrap()])
        .args(["play", "--auto", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["year"], 2);
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "[game]\ndefault_year = 9\n").unwrap();

    cli()
        .args(["--config", config_path.to_str().unwrap(), "levels"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("default_year"));
}

#[test]
fn test_interactive_play_stops_on_closed_input() {
    cli()
        .args(["play", "--year", "1"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("input closed"));
}
