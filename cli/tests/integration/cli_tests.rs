//! Command surface: help, version, usage errors.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

pub fn pool_agent() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pool-agent"));
    cmd.env_clear().env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    pool_agent()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Ephemeral Azure Pipelines agent"));
}

#[test]
fn test_cli_help_lists_commands() {
    pool_agent()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_cli_version_flag_shows_version() {
    pool_agent()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pool-agent"));
}

#[test]
fn test_version_command_shows_version() {
    pool_agent()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "pool-agent {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = pool_agent()
        .args(["version", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["version"], env!("CARGO_PKG_VERSION"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    pool_agent()
        .arg("register")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unrecognized subcommand"));
}
