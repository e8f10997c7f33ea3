//! Smoke tests -- verify the binary runs and the subcommands behave end to end.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

const SCENARIO_CSV: &str = "\
patient_id,heart_rate,blood_pressure,glucose_level
P1,60,90,70
P2,180,200,300
P3,80,105,105
";

fn csv_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn vitalroute() -> Command {
    let mut cmd = Command::cargo_bin("vitalroute").unwrap();
    cmd.env_remove("VITALROUTE_CONFIG").env("RUST_LOG", "off");
    cmd
}

#[test]
fn test_cli_help() {
    vitalroute()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Edge/cloud triage"));
}

#[test]
fn test_cli_version() {
    vitalroute()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vitalroute"));
}

#[test]
fn test_process_reports_both_queues() {
    let input = csv_file(SCENARIO_CSV);
    vitalroute()
        .args(["process", "--input"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("edge queue (2 tasks)"))
        .stdout(predicate::str::contains("cloud queue (1 task)"))
        .stdout(predicate::str::contains("Patient P2 needs immediate attention"))
        .stdout(predicate::str::contains("3 accepted, 0 rejected"));
}

#[test]
fn test_process_json_output() {
    let input = csv_file(SCENARIO_CSV);
    let output = vitalroute()
        .args(["process", "--json", "--input"])
        .arg(input.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["edge"][0]["patient_id"], "P2");
    assert_eq!(report["edge"][0]["priority"], 2.0);
    assert_eq!(report["edge"][1]["patient_id"], "P1");
    assert_eq!(report["cloud"][0]["patient_id"], "P3");
    assert_eq!(report["alarms"].as_array().unwrap().len(), 1);
    assert_eq!(report["summary"]["accepted"], 3);
}

#[test]
fn test_process_skips_malformed_rows() {
    let input = csv_file(
        "patient_id,heart_rate,blood_pressure,glucose_level\nP1,60,90,70\nP2,abc,90,70\nP3,80,105\n",
    );
    vitalroute()
        .args(["process", "--input"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 accepted, 2 rejected"))
        .stdout(predicate::str::contains("rejected line 3"));
}

#[test]
fn test_process_single_queue() {
    let input = csv_file(SCENARIO_CSV);
    vitalroute()
        .args(["process", "--queue", "cloud", "--input"])
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud queue (1 task)"))
        .stdout(predicate::str::contains("edge queue").not());
}

#[test]
fn test_process_unknown_queue_fails() {
    let input = csv_file(SCENARIO_CSV);
    vitalroute()
        .args(["process", "--queue", "fog", "--input"])
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown queue `fog`"));
}

#[test]
fn test_process_missing_input_fails() {
    vitalroute()
        .args(["process", "--input", "/nonexistent/readings.csv"])
        .assert()
        .failure();
}

#[test]
fn test_score_subcommand() {
    vitalroute()
        .args([
            "score",
            "--heart-rate",
            "60",
            "--blood-pressure",
            "105",
            "--glucose",
            "105",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Priority:    1.00"))
        .stdout(predicate::str::contains("Destination: edge"))
        .stdout(predicate::str::contains("Alarm:       no"));
}

#[test]
fn test_score_critical_reading_alarms() {
    vitalroute()
        .args([
            "score",
            "--patient",
            "P2",
            "--heart-rate",
            "180",
            "--blood-pressure",
            "200",
            "--glucose",
            "300",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Priority:    2.00"))
        .stdout(predicate::str::contains("Alarm:       YES"));
}

#[test]
fn test_config_subcommand_prints_defaults() {
    vitalroute()
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("[thresholds]"))
        .stdout(predicate::str::contains("alarm = 1.5"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let config = csv_file("[ranges.heart_rate]\nmin = 100.0\nmax = 100.0\n");
    vitalroute()
        .arg("--config")
        .arg(config.path())
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid heart_rate range"));
}
