//! Exit codes and report lines of the `treeprobe` binary.

#![cfg(feature = "cli")]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write_registry(dir: &TempDir, json: &str) -> String {
    let path = dir.path().join("grammars.json");
    std::fs::write(&path, json).unwrap();
    path.to_string_lossy().into_owned()
}

fn treeprobe() -> Command {
    Command::cargo_bin("treeprobe").unwrap()
}

#[test]
fn missing_libraries_fail_each_grammar() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, r#"{ "grammars": [ { "name": "fig" }, { "name": "nyx" } ] }"#);

    treeprobe()
        .args(["--registry", &registry])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("FAIL fig: Error loading Fig grammar"))
        .stdout(predicate::str::contains("FAIL nyx: Error loading Nyx grammar"))
        .stdout(predicate::str::contains("could not open grammar library"));
}

#[test]
fn grammar_filter_limits_output() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, r#"{ "grammars": [ { "name": "fig" }, { "name": "nyx" } ] }"#);

    treeprobe()
        .args(["--registry", &registry, "--grammar", "nyx"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Error loading Nyx grammar"))
        .stdout(predicate::str::contains("fig").not());
}

#[test]
fn unknown_grammar_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, r#"{ "grammars": [ { "name": "fig" } ] }"#);

    treeprobe()
        .args(["--registry", &registry, "--grammar", "rust"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown grammar `rust`"));
}

#[test]
fn malformed_registry_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let registry = write_registry(&dir, "{ not json");

    treeprobe()
        .args(["--registry", &registry])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid registry JSON"));
}
