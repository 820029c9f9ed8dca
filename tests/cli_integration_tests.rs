// End-to-end tests for the asset-lifecycle binary
// Each test runs against its own state directory

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("asset-lifecycle").unwrap();
    cmd.current_dir(dir.path())
        .arg("--state-dir")
        .arg(dir.path().join("state"))
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_states_lists_every_state() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("states")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ordered"))
        .stdout(predicate::str::contains("In Service"))
        .stdout(predicate::str::contains("(terminal)"));
}

#[test]
fn test_register_transition_and_history() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["register", "LAPTOP-100", "--actor", "alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered LAPTOP-100 in state 'Ordered'"));

    cli(&dir)
        .args(["next-states", "LAPTOP-100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Received"))
        .stdout(predicate::str::contains("In Service").not());

    cli(&dir)
        .args(["transition", "LAPTOP-100", "received", "--actor", "alice"])
        .assert()
        .success();

    cli(&dir)
        .args([
            "transition",
            "LAPTOP-100",
            "In Service",
            "--actor",
            "bob",
            "--reason",
            "Issued to new hire",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("In Service"));

    let output = cli(&dir)
        .args(["history", "LAPTOP-100", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["to_state"], "In Service");
    assert_eq!(records[0]["performed_by"], "bob");
    assert_eq!(records[0]["reason"], "Issued to new hire");
    assert_eq!(records[1]["to_state"], "Received");
}

#[test]
fn test_invalid_transition_fails_with_reason() {
    let dir = TempDir::new().unwrap();
    cli(&dir).args(["register", "PHONE-5"]).assert().success();

    cli(&dir)
        .args(["transition", "PHONE-5", "in-service"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Transition from 'Ordered' to 'In Service' is not allowed",
        ));
}

#[test]
fn test_disposal_requires_wipe_certificate() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["register", "DESK-9", "--state", "Received"])
        .assert()
        .success();

    cli(&dir)
        .args(["next-states", "DESK-9"])
        .assert()
        .success()
        .stdout(predicate::str::contains("requires wipe certificate"));

    cli(&dir)
        .args(["transition", "DESK-9", "Disposed"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--wipe-certificate"));

    cli(&dir)
        .args(["transition", "DESK-9", "Disposed", "--wipe-certificate", "WC-9"])
        .assert()
        .success();

    cli(&dir)
        .args(["show", "DESK-9", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Disposed\""));
}

#[test]
fn test_stale_expectation_is_rejected() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["register", "DOCK-3", "--state", "Received"])
        .assert()
        .success();

    cli(&dir)
        .args(["transition", "DOCK-3", "In Staging", "--expect", "In Service"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stale state"));
}

#[test]
fn test_stale_expectation_wins_over_graph_rejection() {
    let dir = TempDir::new().unwrap();
    cli(&dir).args(["register", "DOCK-4"]).assert().success();

    // Ordered -> In Repair is not an edge, but the stale view is reported first
    cli(&dir)
        .args(["transition", "DOCK-4", "In Repair", "--expect", "In Service"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Stale state"))
        .stderr(predicate::str::contains("not allowed").not());

    cli(&dir)
        .args(["transition", "DOCK-4", "Received", "--expect", "Ordered"])
        .assert()
        .success();
}

#[test]
fn test_register_rejects_non_initial_state() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["register", "TAB-1", "--state", "Lost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be registered as 'Ordered' or 'Received'"));
}

#[test]
fn test_sweep_with_nothing_lost() {
    let dir = TempDir::new().unwrap();
    cli(&dir).args(["register", "MON-2"]).assert().success();

    cli(&dir)
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Examined 0 lost asset(s)"));
}

#[test]
fn test_unknown_asset_fails() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["show", "GHOST-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Asset not found"));
}
