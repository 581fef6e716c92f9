use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn amaranth_run_quickstart() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("run").arg("demos/quickstart.am");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Hello from Amaranth!"));
}

#[test]
fn amaranth_run_prints_the_final_value() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("run").arg("demos/loops.am");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("5"))
        .stdout(predicate::str::contains("80"))
        .stdout(predicate::str::contains("800"));
}

#[test]
fn amaranth_eval_snippet() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("eval").arg("1 + 2 + 3");
    cmd.assert().success().stdout(predicate::str::contains("6"));
}

#[test]
fn amaranth_eval_prints_undefined_for_nil() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("eval").arg("if (false) { 69 }");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("undefined"));
}

#[test]
fn amaranth_eval_reports_parse_diagnostics() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("eval").arg("let = 5");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("parse error"));
}

#[test]
fn amaranth_runs_a_script_from_disk() {
    let dir = tempdir().expect("create temp dir");
    let script = dir.path().join("sum.am");
    fs::write(&script, "let a = 40;\nlet b = 2;\na + b\n").expect("write script");

    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("run").arg(&script);
    cmd.assert().success().stdout(predicate::str::contains("42"));
}

#[test]
fn amaranth_run_fails_for_missing_file() {
    let mut cmd = Command::cargo_bin("amaranth").expect("binary exists");
    cmd.arg("run").arg("demos/does-not-exist.am");
    cmd.assert().failure();
}
