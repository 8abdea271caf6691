//! Integration tests for the natal binary.
//!
//! These tests verify end-to-end behavior including:
//! - Symptom check workflow and WAL logging
//! - History view
//! - CSV rollup operations

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("natal"))
}

/// Pull the id of the first logged assessment out of the WAL
fn first_wal_id(data_dir: &std::path::Path) -> String {
    let wal = fs::read_to_string(data_dir.join("wal/assessments.wal")).unwrap();
    let record: serde_json::Value = serde_json::from_str(wal.lines().next().unwrap()).unwrap();
    record["id"].as_str().unwrap().to_string()
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Prenatal symptom triage and contraction timing",
        ));
}

#[test]
fn test_check_logs_to_wal() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "digestive", "--trimester", "first"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Assessment logged"));

    // Verify WAL file has content
    let wal_path = data_dir.join("wal/assessments.wal");
    let wal_content = fs::read_to_string(&wal_path).expect("Failed to read WAL");
    assert!(!wal_content.is_empty());
    assert!(wal_content.contains("digestive"));
}

#[test]
fn test_dry_run_does_not_log() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "skin", "--trimester", "second"])
        .arg("--dry-run")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    // Verify no WAL file was created
    let wal_path = data_dir.join("wal/assessments.wal");
    assert!(!wal_path.exists());
}

#[test]
fn test_emergency_indicator_forces_emergency() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["check", "--category", "emotional", "--trimester", "first"])
        .args(["--associated", "heavy bleeding"])
        .arg("--dry-run")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Critical"))
        .stdout(predicate::str::contains("Seek emergency care"));
}

#[test]
fn test_mild_report_gets_self_care() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["check", "--category", "emotional", "--trimester", "second"])
        .args(["--duration", "hours"])
        .arg("--dry-run")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Low"))
        .stdout(predicate::str::contains("Self-care at home"));
}

#[test]
fn test_unknown_category_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["check", "--category", "wizardry", "--trimester", "first"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_pain_scale_on_non_pain_category_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["check", "--category", "digestive", "--trimester", "first"])
        .args(["--pain-scale", "5"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_history_empty() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No assessments"));
}

#[test]
fn test_history_shows_logged_assessment() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "bleeding", "--trimester", "third"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Bleeding"));
}

#[test]
fn test_resolve_marks_assessment_resolved() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "digestive", "--trimester", "second"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    let id = first_wal_id(&data_dir);
    cli()
        .args(["resolve", &id])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("marked resolved"));

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains(&id))
        .stdout(predicate::str::contains("(resolved)"));
}

#[test]
fn test_resolve_reaches_archived_assessment() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "skin", "--trimester", "first"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();
    let id = first_wal_id(&data_dir);

    // Roll up so the record now lives in the CSV archive
    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .args(["resolve", &id])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("(resolved)"));
}

#[test]
fn test_resolve_unknown_id_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["resolve", "00000000-0000-0000-0000-000000000000"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();

    cli()
        .args(["resolve", "not-a-uuid"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_rollup_archives_wal() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "urinary", "--trimester", "second"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolled up 1 assessments"));

    // CSV exists, WAL was renamed
    assert!(data_dir.join("assessments.csv").exists());
    assert!(!data_dir.join("wal/assessments.wal").exists());
    assert!(data_dir.join("wal/assessments.wal.processed").exists());

    // History still finds the archived assessment
    cli()
        .arg("history")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Urinary"));
}

#[test]
fn test_rollup_cleanup_removes_processed_wals() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();

    cli()
        .args(["check", "--category", "other", "--trimester", "first"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success();

    cli()
        .args(["rollup", "--cleanup"])
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleaned up 1 processed WAL"));

    assert!(!data_dir.join("wal/assessments.wal.processed").exists());
}

#[test]
fn test_rollup_with_no_wal() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("rollup")
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to roll up"));
}
