//! End-to-end CLI tests, driving the built `rplus` binary exactly as a
//! user would: compiling a fixture file and asserting the five-step log
//! and `.rpx` output shape, and driving the interactive REPL over stdin.

use assert_cmd::Command;
use predicates::prelude::*;

fn rplus() -> Command {
    Command::cargo_bin("rplus").unwrap()
}

#[test]
fn compile_prints_the_five_step_progress_log() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("factorial.rpx");

    rplus()
        .arg("compile")
        .arg("tests/fixtures/factorial.rp")
        .arg(&output_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Reading"))
        .stdout(predicate::str::contains("Lexed"))
        .stdout(predicate::str::contains("Parsed"))
        .stdout(predicate::str::contains("Generated"))
        .stdout(predicate::str::contains("Wrote"));

    let listing = std::fs::read_to_string(&output_path).unwrap();
    assert!(listing.contains("function fact() {"));
    assert!(listing.contains("function <script>() {"));
}

#[test]
fn bare_file_argument_compiles_to_the_default_output_path() {
    let dir = tempfile::tempdir().unwrap();
    rplus()
        .current_dir(&dir)
        .arg(
            std::env::current_dir()
                .unwrap()
                .join("tests/fixtures/factorial.rp"),
        )
        .assert()
        .success();

    assert!(dir.path().join("output.rpx").exists());
}

#[test]
fn missing_input_file_exits_nonzero() {
    rplus()
        .arg("compile")
        .arg("tests/fixtures/does_not_exist.rp")
        .assert()
        .failure();
}

#[test]
fn version_flag_prints_a_build_date() {
    rplus()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::contains("rplus"));
}

#[test]
fn run_subcommand_executes_and_prints_the_result() {
    rplus()
        .arg("run")
        .arg("tests/fixtures/factorial.rp")
        .assert()
        .success()
        .stdout(predicate::str::contains("120"));
}

#[test]
fn run_flag_selects_the_register_backend() {
    rplus()
        .env("RPLUS_BACKEND", "register")
        .arg("-r")
        .arg("tests/fixtures/factorial.rp")
        .assert()
        .success()
        .stdout(predicate::str::contains("120"));
}

#[test]
fn interactive_mode_reports_ok_and_errors_per_line() {
    rplus()
        .arg("-i")
        .write_stdin("1+1;\nbad syntax (((\nexit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"))
        .stdout(predicate::str::contains("error:"));
}
