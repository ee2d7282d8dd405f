//! End-to-end tests of the `qualex` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn session_script(answers: &str) -> String {
    format!("n\nn\nr\nn\n{answers}")
}

#[test]
fn plan_prints_rows_and_sequence() {
    let output = Command::cargo_bin("qualex")
        .unwrap()
        .args(["plan", "--participant", "3", "--seed", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("participant 3: rows 3 -> 4"))
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    let slots: Vec<&str> = text.lines().skip(1).collect();
    assert_eq!(slots.len(), 12);
    assert!(slots[0].trim_start().starts_with("1 "));
    assert!(slots.iter().all(|l| l.contains("videos/")));
}

#[test]
fn seeded_plans_are_stable_across_runs() {
    let run = || {
        Command::cargo_bin("qualex")
            .unwrap()
            .args(["plan", "--participant", "8", "--seed", "42"])
            .output()
            .unwrap()
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn run_appends_one_row_per_question() {
    let dir = tempfile::tempdir().unwrap();
    let counter = dir.path().join("counter.txt");
    let output = dir.path().join("responses.csv");
    fs::write(&counter, "6").unwrap();

    Command::cargo_bin("qualex")
        .unwrap()
        .arg("run")
        .arg("--counter")
        .arg(&counter)
        .arg("--output")
        .arg(&output)
        .write_stdin(session_script(&"l\n".repeat(12)))
        .assert()
        .success()
        .stdout(predicate::str::contains("Survey completed! Thank you"));

    let csv = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 13);
    assert!(lines[0].starts_with("Timestamp,Participant_ID,Question"));
    for (i, line) in lines[1..].iter().enumerate() {
        let cols: Vec<&str> = line.split(',').collect();
        assert_eq!(cols[1], "7");
        assert_eq!(cols[2], (i + 1).to_string());
        assert_eq!(cols[4], "Left");
    }
    assert_eq!(fs::read_to_string(&counter).unwrap(), "7");
}

#[test]
fn run_writes_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("responses.jsonl");
    Command::cargo_bin("qualex")
        .unwrap()
        .arg("run")
        .arg("--counter")
        .arg(dir.path().join("counter.txt"))
        .arg("--output")
        .arg(&output)
        .args(["--format", "jsonl", "--seed", "9"])
        .write_stdin(session_script(&"r\n".repeat(12)))
        .assert()
        .success();
    let text = fs::read_to_string(&output).unwrap();
    assert_eq!(text.lines().count(), 12);
    assert!(text.lines().all(|l| l.contains("\"Choice\":\"Right\"")));
    assert!(text.lines().next().unwrap().contains("\"Participant_ID\":\"1\""));
}

#[test]
fn quitting_early_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("responses.csv");
    Command::cargo_bin("qualex")
        .unwrap()
        .arg("run")
        .arg("--counter")
        .arg(dir.path().join("counter.txt"))
        .arg("--output")
        .arg(&output)
        .write_stdin(session_script("l\nr\nq\n"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Question 3/12"));
    assert!(!output.exists());
}

#[test]
fn unwritable_output_still_completes_with_notice() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("qualex")
        .unwrap()
        .arg("run")
        .arg("--counter")
        .arg(dir.path().join("counter.txt"))
        .arg("--output")
        .arg(dir.path().join("missing").join("responses.csv"))
        .write_stdin(session_script(&"l\n".repeat(12)))
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "there was an issue saving responses",
        ));
}

#[test]
fn invalid_config_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("experiment.toml");
    fs::write(&config, "stimuli = [\"only-one.mp4\"]\n").unwrap();
    Command::cargo_bin("qualex")
        .unwrap()
        .arg("--config")
        .arg(&config)
        .args(["plan", "--participant", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid config"));
}
