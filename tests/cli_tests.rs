//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const REPLY: &str = r#"Sure, here you go.

<think>
The README needs a usage section.
</think>

<response>
  <pullRequest>
    <title>Document usage</title>
    <body>Adds a usage section.</body>
  </pullRequest>
  <files>
    <file>
      <path>README.md</path>
      <content><![CDATA[
# Demo

Run `demo --help`.
]]></content>
    </file>
  </files>
</response>
"#;

fn pr_pilot(cwd: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pr-pilot"));
    cmd.current_dir(cwd.path())
        .env_remove("PR_PILOT_REPO")
        .env_remove("PR_PILOT_BASE_BRANCH")
        .env_remove("PR_PILOT_NEW_BRANCH")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pr-pilot"));
    cmd.arg("--version");
    cmd.assert().success().stdout(predicate::str::contains("pr-pilot"));
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pr-pilot"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Turn a task description into a pull request"))
        .stdout(predicate::str::contains("collect"))
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn test_extract_prints_result_json() {
    let tmp = TempDir::new().expect("temp dir");
    let reply = tmp.path().join("reply.txt");
    fs::write(&reply, REPLY).expect("write reply");

    let output = pr_pilot(&tmp).arg("extract").arg(&reply).output().expect("run extract");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("valid JSON");
    assert_eq!(json["metadata"]["title"], "Document usage");
    assert_eq!(json["files"][0]["path"], "README.md");
    assert_eq!(json["files"][0]["content"], "# Demo\n\nRun `demo --help`.");
    assert_eq!(json["reasoning"], "The README needs a usage section.");
}

#[test]
fn test_extract_rejects_malformed_reply() {
    let tmp = TempDir::new().expect("temp dir");
    let reply = tmp.path().join("reply.txt");
    fs::write(&reply, "<response><pullRequest><title>t</title></pullRequest></response>")
        .expect("write reply");

    pr_pilot(&tmp)
        .arg("extract")
        .arg(&reply)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed model response"));
}

#[test]
fn test_extract_missing_file_fails() {
    let tmp = TempDir::new().expect("temp dir");
    pr_pilot(&tmp)
        .args(["extract", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read model reply"));
}

#[test]
fn test_apply_requires_repository() {
    let tmp = TempDir::new().expect("temp dir");
    let reply = tmp.path().join("reply.txt");
    fs::write(&reply, REPLY).expect("write reply");

    pr_pilot(&tmp)
        .args(["apply", "--branch", "docs", "--yes", "--response"])
        .arg(&reply)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No repository specified"));
}

#[test]
fn test_apply_validates_reply_before_network() {
    let tmp = TempDir::new().expect("temp dir");
    let reply = tmp.path().join("reply.txt");
    fs::write(&reply, "no markers here").expect("write reply");

    pr_pilot(&tmp)
        .args(["apply", "--repo", "octo/widgets", "--branch", "docs", "--yes", "--response"])
        .arg(&reply)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed model response"));
}

#[test]
fn test_collect_rejects_invalid_repository() {
    let tmp = TempDir::new().expect("temp dir");
    pr_pilot(&tmp)
        .args(["collect", "--repo", "not-a-slug"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid repository"));
}

#[test]
fn test_run_requires_model_command() {
    let tmp = TempDir::new().expect("temp dir");
    pr_pilot(&tmp)
        .args(["run", "--repo", "octo/widgets", "--branch", "x", "--task", "do it"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("model.command"));
}

#[test]
fn test_explicit_bad_config_fails() {
    let tmp = TempDir::new().expect("temp dir");
    let config = tmp.path().join("custom.toml");
    fs::write(&config, "exclude = 42\n").expect("write config");

    pr_pilot(&tmp)
        .args(["collect", "--repo", "octo/widgets", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid TOML config"));
}
