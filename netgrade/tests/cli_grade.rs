use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::{tempdir, TempDir};
use zip::write::SimpleFileOptions;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

fn write_zip(path: &Path, entries: &[(&str, PathBuf)]) {
    let file = File::create(path).expect("create zip");
    let mut zip = zip::ZipWriter::new(file);
    for (name, source) in entries {
        let text = std::fs::read(source).expect("read fixture");
        zip.start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(&text).expect("write entry");
    }
    zip.finish().expect("finish zip");
}

/// Master with the running config of R1, student with the hand-typed copy.
fn archives() -> (TempDir, PathBuf, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let master = dir.path().join("master.zip");
    let student = dir.path().join("212.05.zip");
    write_zip(
        &master,
        &[("R1.txt", fixture("fixtures/configs/r1-running.txt"))],
    );
    write_zip(
        &student,
        &[("212.05_R1.txt", fixture("fixtures/configs/r1-typed.txt"))],
    );
    (dir, master, student)
}

#[test]
fn grade_prints_json_summary() {
    let (_dir, master, student) = archives();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg(&master)
        .arg(&student)
        .arg("")
        .arg("")
        .arg("212.05")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"final_score\": 100.0"))
        .stdout(predicate::str::contains("\"assignment_type\": \"static\""))
        .stdout(predicate::str::contains("\"static_routes\""));
}

#[test]
fn grade_text_report() {
    let (_dir, master, student) = archives();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg(&master)
        .arg(&student)
        .arg("")
        .arg("")
        .arg("212.05")
        .arg("--format")
        .arg("text")
        .assert()
        .success()
        .stdout(predicate::str::contains("final score"))
        .stdout(predicate::str::contains("graded"))
        .stdout(predicate::str::contains("file=212.05_R1"));
}

#[test]
fn grade_fails_on_bad_prefix() {
    let (_dir, master, student) = archives();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg(&master)
        .arg(&student)
        .arg("")
        .arg("")
        .arg("birthday")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to grade"))
        .stderr(predicate::str::contains("invalid prefix 'birthday'"));
}

#[test]
fn grade_error_envelope_reports_empty_archive() {
    let (dir, master, _student) = archives();
    let empty = dir.path().join("empty.zip");
    write_zip(&empty, &[]);

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg(&master)
        .arg(&empty)
        .arg("")
        .arg("")
        .arg("212.05")
        .arg("--error-envelope")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"success\": false"))
        .stdout(predicate::str::contains("is empty"))
        .stdout(predicate::str::contains("\"final_score\": 0.0"));
}

#[test]
fn grade_rejects_unknown_assignment() {
    let (_dir, master, student) = archives();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg(&master)
        .arg(&student)
        .arg("")
        .arg("")
        .arg("212.05")
        .arg("--assignment")
        .arg("bgp")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bgp"));
}

#[test]
fn grade_help_explains_feedback_order() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("grade")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("not the line order of the master configuration"));
}
