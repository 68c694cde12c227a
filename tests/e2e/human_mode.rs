//! Human-mode end-to-end tests.

use assert_cmd::Command;
use predicates::prelude::*;

use crate::common::assertions::{assert_contains_all, assert_no_ansi};
use crate::common::cli::CliRunner;

#[test]
fn human_new_and_list() {
    let cli = CliRunner::new();
    cli.run(&["new", "Scuffed skirting", "-l", "Bedroom 2", "-p", "low"])
        .assert_success()
        .assert_stdout_contains("[OK] Created snag");

    let result = cli.run(&["list"]);
    result
        .assert_success()
        .assert_stdout_matches(r"[0-9a-f]{8}\s+Scuffed skirting @ Bedroom 2");
    assert_contains_all(&result.stdout, &["Low", "Open"]);
    assert_no_ansi(&result.stdout);
}

#[test]
fn human_show_lists_fields() {
    let cli = CliRunner::new();
    let id = cli.create_snag("Dripping tap", &["--notes", "Kitchen sink, hot side"]);

    let result = cli.run(&["show", &id[..6]]);
    result.assert_success();
    assert_contains_all(
        &result.stdout,
        &["Dripping tap", id.as_str(), "Medium", "Kitchen sink, hot side", "No photos"],
    );
}

#[test]
fn human_error_goes_to_stderr_with_hint() {
    let cli = CliRunner::new();
    cli.run(&["delete", "abcd", "--yes"])
        .assert_failure()
        .assert_stderr_contains("[ERR]")
        .assert_stderr_contains("Run: snag list");
}

#[test]
fn no_color_env_convention_is_accepted() {
    for value in ["1", "yes", "true"] {
        let cli = CliRunner::new().with_env("NO_COLOR", value);
        cli.create_snag("Sticking door", &[]);
        let result = cli.run(&["list"]);
        result.assert_success().assert_stdout_contains("Sticking door");
        assert_no_ansi(&result.stdout);
    }

    CliRunner::new()
        .with_env("NO_COLOR", "")
        .run(&["list"])
        .assert_success();
}

#[test]
fn empty_list_message() {
    let cli = CliRunner::new();
    cli.run(&["list"]).assert_success().assert_stdout_contains("No snags");
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("snag")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sweep").and(predicate::str::contains("photo")));
}

#[test]
fn completions_generate_for_bash() {
    Command::cargo_bin("snag")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("_snag"));
}

#[test]
fn invalid_priority_is_rejected_by_parser() {
    Command::cargo_bin("snag")
        .unwrap()
        .args(["new", "x", "--priority", "urgent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("urgent"));
}
