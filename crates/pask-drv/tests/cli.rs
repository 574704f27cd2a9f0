//! End-to-end tests for the paski binary.

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn paski() -> Command {
    Command::cargo_bin("paski").expect("binary must build")
}

fn source_file(source: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{source}").expect("write source");
    file
}

#[test]
fn no_arguments_prints_help() {
    paski()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn runs_program_with_trace() {
    let file = source_file(
        "program main; var c : integer; \
         procedure sum(x, y : integer); begin c := x + y; end; \
         begin sum(2, 5); end.",
    );

    paski()
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ENTER: PROGRAM main"))
        .stdout(predicate::str::contains("ENTER: PROCEDURE sum"))
        .stdout(predicate::str::contains("LEAVE: PROCEDURE sum"))
        .stdout(predicate::str::contains("CALL STACK(memory contents):"))
        .stdout(predicate::str::contains("LEAVE: PROGRAM main"));
}

#[test]
fn quiet_suppresses_trace() {
    let file = source_file("program main; var a : integer; begin a := 1; end.");

    paski()
        .arg("--quiet")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn semantic_error_exits_nonzero() {
    let file = source_file("program main; var a, a : integer; begin end.");

    paski()
        .arg(file.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Duplicate id found"));
}

#[test]
fn runtime_error_exits_nonzero() {
    let file = source_file("program main; var a : integer; begin a := 1 // 0; end.");

    paski()
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Division by zero"));
}

#[test]
fn emit_tokens_dumps_stream() {
    let file = source_file("program main; begin end.");

    paski()
        .arg("--emit")
        .arg("tokens")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Token(PROGRAM, 'PROGRAM', position=1:1)"))
        .stdout(predicate::str::contains("Token(EOF"));
}

#[test]
fn emit_ast_dumps_tree() {
    let file = source_file("program main; begin end.");

    paski()
        .arg("--emit")
        .arg("ast")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Program {"));
}

#[test]
fn missing_file_reports_error() {
    paski()
        .arg("does-not-exist.pas")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to read"));
}
