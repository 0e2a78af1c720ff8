use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn diff_summary_ignores_order_and_abbreviations() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("diff")
        .arg(fixture("fixtures/configs/r1-running.txt"))
        .arg(fixture("fixtures/configs/r1-typed.txt"))
        .arg("--summary")
        .assert()
        .success()
        .stdout(predicate::str::contains("modified=0"))
        .stdout(predicate::str::contains("only_left=2"))
        .stdout(predicate::str::contains("only_right=0"));
}

#[test]
fn diff_json_outputs_structured_entries() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("diff")
        .arg(fixture("fixtures/configs/r1-running.txt"))
        .arg(fixture("fixtures/configs/r1-ospf.txt"))
        .arg("--format")
        .arg("json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\""))
        .stdout(predicate::str::contains("router ospf"));
}

#[test]
fn diff_text_marks_missing_lines() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("diff")
        .arg(fixture("fixtures/configs/r1-running.txt"))
        .arg(fixture("fixtures/configs/r1-typed.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("no service password-encryption"));
}

#[test]
fn diff_reports_missing_file() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("diff")
        .arg(fixture("fixtures/configs/missing.txt"))
        .arg(fixture("fixtures/configs/r1-typed.txt"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}
