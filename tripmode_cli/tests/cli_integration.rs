mod common;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["self-check"], 0, "ok:", "stdout")]
#[case(&["replay"], 2, "required", "stderr")]
#[case(&["run", "--activity", "flying"], 2, "invalid value", "stderr")]
#[case(&["replay", "--recording", "does-not-exist"], 1, "could not be read", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = common::write_config(dir.path(), "");

    let mut cmd = Command::cargo_bin("tripmode").unwrap();
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn replay_scores_a_labelled_recording() {
    let dir = tempdir().unwrap();
    let cfg = common::write_config(dir.path(), "");
    let rec = common::write_walking_recording(dir.path());

    Command::cargo_bin("tripmode")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["replay", "--tick-ms", "1000", "--ticks", "--recording"])
        .arg(&rec)
        .assert()
        .success()
        .stdout(predicate::str::contains("WALKING"))
        .stdout(predicate::str::contains("accuracy: 100.0%"));
}

#[test]
fn export_svm_writes_labelled_rows() {
    let dir = tempdir().unwrap();
    let cfg = common::write_config(dir.path(), "");
    let rec = common::write_walking_recording(dir.path());
    let out = dir.path().join("train.svm");

    Command::cargo_bin("tripmode")
        .unwrap()
        .arg("--config")
        .arg(&cfg)
        .args(["export-svm", "--tick-ms", "1000", "--recording"])
        .arg(&rec)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    // ticks at 2, 3 and 4 s have a full window
    assert_eq!(lines.len(), 3);
    for l in lines {
        assert!(l.starts_with("2 0:"));
        assert_eq!(l.split(' ').count(), 19);
        assert!(l.contains(" 17:"));
    }
}

#[test]
fn missing_config_is_a_config_error() {
    Command::cargo_bin("tripmode")
        .unwrap()
        .args(["--config", "/nonexistent/tripmode.toml", "self-check"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid configuration"));
}

#[rstest]
#[case("[window]\nslack = 500\n", "slack")]
#[case("[runner]\ntick_ms = 1\n", "tick_ms")]
#[case("[logging]\nrotation = \"weekly\"\n", "rotation")]
fn invalid_config_values_exit_2(#[case] toml: &str, #[case] needle: &str) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, toml).unwrap();
    Command::cargo_bin("tripmode")
        .unwrap()
        .arg("--config")
        .arg(&path)
        .arg("self-check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains(needle));
}
