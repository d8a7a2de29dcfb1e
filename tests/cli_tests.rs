//! Integration tests for the `sem` CLI binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn sem_cmd() -> Command {
    Command::cargo_bin("sem").unwrap()
}

#[test]
fn cli_help_command() {
    let mut cmd = sem_cmd();
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Semantic diff core"))
        .stdout(predicate::str::contains("diff"))
        .stdout(predicate::str::contains("blame"))
        .stdout(predicate::str::contains("history"));
}

#[test]
fn cli_version_command() {
    let mut cmd = sem_cmd();
    cmd.arg("--version");

    cmd.assert().success().stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn diff_outside_a_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = sem_cmd();
    cmd.args(["--repo", dir.path().to_str().unwrap(), "diff"]);

    cmd.assert().failure().stderr(predicate::str::contains("not a git repository"));
}

#[test]
fn languages_lists_builtin_plugins() {
    let mut cmd = sem_cmd();
    cmd.arg("languages");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("json"))
        .stdout(predicate::str::contains("markdown"));
}
