//! End-to-end checks of the `rulegate` binary's exit codes and output.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rulegate(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("rulegate"));
    cmd.current_dir(dir)
        .env("RULEGATE_CONFIG_DIR", dir.join("no-global"))
        .env_remove("RULEGATE_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (path, content) in files {
        let path = dir.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

#[test]
fn clean_project_passes() {
    let dir = project(&[("src/app.ts", "export const x = 1;\n")]);
    rulegate(dir.path())
        .arg("check")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("PASSED"));
}

#[test]
fn error_finding_fails_with_policy_exit_code() {
    let dir = project(&[("src/app.ts", "const a = 1;\ndebugger;\n")]);
    rulegate(dir.path())
        .args(["check", "--format", "compact"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("src/app.ts:2:1: error [no-debugger]"));
}

#[test]
fn warnings_fail_only_in_strict_mode() {
    let dir = project(&[("src/a.test.ts", "it.skip('later', () => {});\n")]);
    rulegate(dir.path()).arg("check").assert().code(0);
    rulegate(dir.path())
        .args(["check", "--strict"])
        .assert()
        .code(1);
}

#[test]
fn json_report_is_written() {
    let dir = project(&[("src/app.ts", "console.log('x');\n")]);
    let output = rulegate(dir.path())
        .args(["check", "--format", "json", "--report", "report.json"])
        .assert()
        .code(1)
        .get_output()
        .clone();

    let stdout: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(stdout, written);
    assert_eq!(written["report"]["findings"][0]["rule_id"], "no-console-log");
}

#[test]
fn duplicate_rule_ids_are_a_startup_error() {
    let dir = project(&[
        ("src/app.ts", "export {};\n"),
        (
            "rulegate.toml",
            "[[pattern-rule]]\nid = \"no-debugger\"\nliteral = \"debugger\"\n",
        ),
    ]);
    rulegate(dir.path())
        .arg("check")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("duplicate rule id"));
}

#[test]
fn unknown_rule_is_a_startup_error() {
    let dir = project(&[("src/app.ts", "export {};\n")]);
    rulegate(dir.path())
        .args(["check", "--rules", "no-such-rule"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("no-such-rule"));
}

#[test]
fn init_then_list_rules() {
    let dir = TempDir::new().unwrap();
    rulegate(dir.path()).arg("init").assert().code(0);
    assert!(dir.path().join("rulegate.toml").exists());
    rulegate(dir.path()).arg("init").assert().code(2);

    rulegate(dir.path())
        .args(["list-rules", "--format", "compact"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("no-unwrap-expect"));
}
