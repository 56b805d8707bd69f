//! CLI integration tests for every subcommand.
//!
//! Uses `assert_cmd` to spawn the `courierc` binary and verify exit codes,
//! stdout content and stderr content. Sources are written to temporary
//! directories.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn courierc() -> Command {
    cargo_bin_cmd!("courierc")
}

/// Write `text` to `name` inside `dir`, returning the full path.
fn source(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, text).unwrap();
    path
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    courierc()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Courier compiler front end"));
}

#[test]
fn version_exits_0() {
    courierc()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("courierc"));
}

#[test]
fn check_requires_a_path() {
    courierc().arg("check").assert().failure();
}

// ──────────────────────────────────────────────
// 2. Lex subcommand
// ──────────────────────────────────────────────

#[test]
fn lex_prints_one_token_per_line() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "a.cour", "x := 0x1F;");
    courierc()
        .args(["lex", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1:1\tIDENTIFIER\tx"))
        .stdout(predicate::str::contains("1:3\tASSIGNMENT\t:="))
        .stdout(predicate::str::contains("1:6\tHEXADECIMAL_LITERAL\t0x1F"));
}

#[test]
fn lex_json_lists_tokens() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "a.cour", "# hi\n{ }");
    let out = courierc()
        .args(["--output", "json", "lex", file.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    let tokens = json["tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0]["kind"], "LINE_COMMENT");
    assert_eq!(tokens[0]["text"], "# hi");
    assert_eq!(tokens[1]["line"], 2);
}

#[test]
fn lex_error_renders_caret_and_exits_1() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "bad.cour", "x := $;");
    courierc()
        .args(["lex", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("x := $;\n     ^\n"))
        .stderr(predicate::str::contains("1:6: error: invalid character '$'"));
}

#[test]
fn lex_nonexistent_file_exits_1() {
    courierc()
        .args(["lex", "nonexistent_file_xyz.cour"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot read"));
}

// ──────────────────────────────────────────────
// 3. Parse subcommand
// ──────────────────────────────────────────────

#[test]
fn parse_prints_tree_dump() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "m.cour", "module Foo { { x:int32; } }");
    courierc()
        .args(["parse", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            "ModuleBlock Foo\n  CodeFragmentBlock\n    StatementsBlock\n      Variable x : int32\n",
        );
}

#[test]
fn parse_json_nests_children() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "c.cour", "{ class A inherits B { public { y:string; } } }");
    let out = courierc()
        .args(["--output", "json", "parse", file.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["kind"], "CodeFragmentBlock");
    let class = &json["children"][0]["children"][0];
    assert_eq!(class["kind"], "ClassBlock");
    assert_eq!(class["superclass"], "B");
    assert_eq!(class["children"][0]["visibility"], "public");
}

#[test]
fn parse_error_exits_1_with_diagnostic() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "p.cour", "{\n  x := 1\n}");
    courierc()
        .args(["parse", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("3:1: error: expected ';', found '}'"));
}

#[test]
fn trace_states_adds_state_stack() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "t.cour", "{ x := ; }");
    courierc()
        .args(["--trace-states", "parse", file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("while parsing: unit > code fragment"));
}

#[test]
fn debug_builds_show_state_stack_without_flag() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "d.cour", "{ x := ; }");
    let stack = predicate::str::contains("while parsing: unit > code fragment");
    let assert = courierc()
        .args(["parse", file.to_str().unwrap()])
        .assert()
        .failure();
    if cfg!(debug_assertions) {
        assert.stderr(stack);
    } else {
        assert.stderr(stack.not());
    }
}

#[test]
fn deeply_nested_expression_is_a_diagnostic() {
    let tmp = TempDir::new().unwrap();
    let chain = format!("{{ x := 1{}; }}", " + 1".repeat(20_000));
    let file = source(&tmp, "deep.cour", &chain);
    courierc()
        .args(["parse", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error: expression nested too deeply"));
}

#[test]
fn parse_error_json_on_stderr() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "j.cour", "{ class A { ");
    let out = courierc()
        .args(["--output", "json", "parse", file.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["kind"], "parse");
    assert_eq!(json["discarded"], "ClassBlock");
}

// ──────────────────────────────────────────────
// 4. Check subcommand
// ──────────────────────────────────────────────

#[test]
fn check_reports_each_file() {
    let tmp = TempDir::new().unwrap();
    let good = source(&tmp, "good.cour", "{ x := 1; }");
    let bad = source(&tmp, "bad.cour", "{ x := ; }");
    courierc()
        .args(["check", good.to_str().unwrap(), bad.to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("ok: "))
        .stdout(predicate::str::contains("2 file(s) checked, 1 failed"))
        .stderr(predicate::str::contains("expected expression, found ';'"));
}

#[test]
fn check_directory_finds_sources() {
    let tmp = TempDir::new().unwrap();
    source(&tmp, "a.cour", "{ }");
    source(&tmp, "nested/b.cour", "module B { { } }");
    source(&tmp, "notes.txt", "not courier");
    courierc()
        .args(["check", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 file(s) checked, 0 failed"));
}

#[test]
fn check_quiet_prints_nothing_on_success() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "q.cour", "{ }");
    courierc()
        .args(["--quiet", "check", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn check_same_file_twice_fails_second() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "dup.cour", "{ }");
    courierc()
        .args(["check", file.to_str().unwrap(), file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has already been tokenized"));
}

#[test]
fn check_json_summary() {
    let tmp = TempDir::new().unwrap();
    let file = source(&tmp, "s.cour", "{ x; }");
    let out = courierc()
        .args(["--output", "json", "check", file.to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["checked"], 1);
    assert_eq!(json["failed"], 0);
    assert_eq!(json["files"][0]["ok"], true);
    assert_eq!(json["files"][0]["nodes"], 3);
}
