//! Integration tests for the `rapman` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

const CONFIG: &str = r#"
base_image = "ubuntu"
docker_image = "robobench/app"
build_environment = ["FOO=1"]
build_script = ["echo hi"]

[[tests]]
name = "t1"
command = "run.sh"
description = "smoke"
enabled = true

[[tests]]
name = "t2"
command = "never.sh"
enabled = false

[when]
branch = "master"
"#;

fn rapman(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rapman"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run rapman")
}

fn write_config(dir: &Path) -> String {
    let path = dir.join("rapman.toml");
    fs::write(&path, CONFIG).unwrap();
    path.to_string_lossy().into_owned()
}

#[test]
fn plan_prints_script_and_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());
    let out = dir.path().join("out");

    let output = rapman(&[
        "plan",
        "--config",
        &config,
        "--out",
        out.to_str().unwrap(),
        "--build-id",
        "42",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("echo \"t1\"\n"));
    assert!(stdout.contains("run.sh\n"));
    assert!(!stdout.contains("never.sh"));
    assert!(out.join("t1").join("permissions.json").exists());
    assert!(!out.join("t2").exists());
}

#[test]
fn permissions_prints_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = rapman(&["permissions", "--config", &config, "--test", "t1"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["executable"], "run.sh");
    assert_eq!(value["description"], "smoke");
}

#[test]
fn imagefile_prints_base_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let base = rapman(&["imagefile", "--config", &config]);
    assert_eq!(
        String::from_utf8(base.stdout).unwrap(),
        "FROM ubuntu\nENV FOO=1\nRUN echo hi\n"
    );

    let output = rapman(&["imagefile", "--config", &config, "--output"]);
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "FROM robobench/app\n");
}

#[test]
fn condition_prints_json() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path());

    let output = rapman(&["condition", "--config", &config]);
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["branch"], "master");
}

#[test]
fn validate_rejects_missing_base_image() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "docker_image = \"x\"\n").unwrap();

    let output = rapman(&["validate", "--config", path.to_str().unwrap()]);
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("base_image is required"));
}

#[test]
fn validate_accepts_yaml_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".drone.yml");
    fs::write(
        &path,
        "base_image: ubuntu\ntests:\n  - name: t1\n    command: run.sh\n    enabled: true\n",
    )
    .unwrap();

    let output = rapman(&["validate", "--config", path.to_str().unwrap()]);
    assert!(output.status.success(), "{:?}", output);
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["base_image"], "ubuntu");
    assert_eq!(report["enabled_tests"], 1);
}
