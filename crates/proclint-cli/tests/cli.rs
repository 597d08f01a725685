//! CLI smoke tests

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_describes_the_tool() {
    Command::cargo_bin("proclint")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Static linter"))
        .stdout(predicate::str::contains("--no-fail"))
        .stdout(predicate::str::contains("--report-path"));
}

#[test]
fn missing_input_fails_with_a_diagnostic() {
    Command::cargo_bin("proclint")
        .unwrap()
        .arg("/definitely/not/a/path")
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn tree_without_descriptor_is_a_discovery_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("src/main/resources")).unwrap();
    Command::cargo_bin("proclint")
        .unwrap()
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No process plugin descriptor"));
}
