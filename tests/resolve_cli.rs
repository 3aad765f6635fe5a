//! End-to-end CLI tests for tag resolution and the dry-run pipeline.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("container_release").expect("binary builds");
    // Shield the tests from any surrounding CI environment
    cmd.env_remove("GITHUB_EVENT_NAME");
    cmd.env_remove("GITHUB_REF");
    cmd
}

#[test]
fn tag_push_resolves_to_exactly_that_tag() {
    let output = cli()
        .args(["resolve", "--event", "push", "--git-ref", "refs/tags/v1.2.3"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let payload: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(payload["image"], "greenbone/gvm-tools");
    assert_eq!(payload["tags"], serde_json::json!(["v1.2.3"]));
    assert_eq!(
        payload["references"],
        serde_json::json!(["greenbone/gvm-tools:v1.2.3"])
    );
    assert_eq!(
        payload["labels"]["org.opencontainers.image.vendor"],
        "Greenbone"
    );
    assert_eq!(payload["labels"].as_object().map(|m| m.len()), Some(3));
}

#[test]
fn default_branch_push_resolves_to_latest() {
    cli()
        .args(["resolve", "--event", "push", "--git-ref", "refs/heads/main"])
        .assert()
        .success()
        .stdout(predicate::str::contains("greenbone/gvm-tools:latest"))
        .stdout(predicate::str::contains("v1.2.3").not());
}

#[test]
fn trigger_falls_back_to_the_ci_environment() {
    cli()
        .arg("resolve")
        .env("GITHUB_EVENT_NAME", "push")
        .env("GITHUB_REF", "refs/heads/main")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"latest\""));
}

#[test]
fn explicit_flags_override_the_environment() {
    cli()
        .args(["resolve", "--event", "push", "--git-ref", "refs/tags/v9.9.9"])
        .env("GITHUB_EVENT_NAME", "push")
        .env("GITHUB_REF", "refs/heads/main")
        .assert()
        .success()
        .stdout(predicate::str::contains("v9.9.9"))
        .stdout(predicate::str::contains("latest").not());
}

#[test]
fn feature_branch_resolves_to_an_empty_tag_set() {
    cli()
        .args([
            "resolve",
            "--event",
            "push",
            "--git-ref",
            "refs/heads/feature-x",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tags\":[]"));
}

#[test]
fn run_refuses_to_build_with_nothing_to_push() {
    cli()
        .args([
            "run",
            "--dry-run",
            "--event",
            "push",
            "--git-ref",
            "refs/heads/feature-x",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("empty tag set"));
}

#[test]
fn dry_run_prints_the_buildx_invocation_without_executing() {
    cli()
        .args([
            "run",
            "--dry-run",
            "--event",
            "push",
            "--git-ref",
            "refs/tags/v1.2.3",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("buildx build"))
        .stdout(predicate::str::contains("linux/amd64,linux/arm64"))
        .stdout(predicate::str::contains("--push"))
        .stdout(predicate::str::contains("greenbone/gvm-tools:v1.2.3"));
}

#[test]
fn dispatch_on_a_version_tag_behaves_like_a_tag_push() {
    cli()
        .args([
            "resolve",
            "--event",
            "workflow_dispatch",
            "--git-ref",
            "refs/tags/v2.0.0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("greenbone/gvm-tools:v2.0.0"));
}

#[test]
fn unknown_events_are_rejected() {
    cli()
        .args([
            "resolve",
            "--event",
            "pull_request",
            "--git-ref",
            "refs/heads/main",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown trigger event"));
}

#[test]
fn config_file_overrides_image_and_default_branch() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(
        file,
        r#"
image = "acme/widget"
default_branch = "trunk"
"#
    )
    .expect("write config");

    cli()
        .args([
            "resolve",
            "--config",
            file.path().to_str().expect("utf-8 path"),
            "--event",
            "push",
            "--git-ref",
            "refs/heads/trunk",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("acme/widget:latest"));
}

#[test]
fn missing_config_file_is_an_error() {
    cli()
        .args([
            "resolve",
            "--config",
            "/nonexistent/release.toml",
            "--event",
            "push",
            "--git-ref",
            "refs/heads/main",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn conflicting_output_flags_are_rejected() {
    cli()
        .args([
            "resolve",
            "--quiet",
            "--verbose",
            "--event",
            "push",
            "--git-ref",
            "refs/heads/main",
        ])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("mutually exclusive"));
}
