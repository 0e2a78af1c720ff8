use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn inspect_prints_normalized_config() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/configs/r1-typed.txt"))
        .assert()
        .success()
        .stdout(predicate::str::contains("\"hostname\": \"R1\""))
        .stdout(predicate::str::contains("GigabitEthernet0/1"))
        .stdout(predicate::str::contains("10.0.12.1/24"))
        .stdout(predicate::str::contains("\"unparsed\""));
}

#[test]
fn inspect_text_prints_tree() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("netgrade"));
    cmd.arg("inspect")
        .arg(fixture("fixtures/configs/r1-ospf.txt"))
        .arg("--format")
        .arg("text")
        .arg("--depth")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("router ospf"))
        .stdout(predicate::str::contains("interface GigabitEthernet0/0"));
}
