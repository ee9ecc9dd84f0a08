//! CLI binary integration tests.
//!
//! These tests exercise the compiled `vaultkv` binary to verify command
//! routing, help text, error handling, and values persisting between runs.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;
use vaultkv_integration_tests::TEST_MASTER_KEY;

/// Locate the compiled `vaultkv` binary in the workspace target directory.
fn vaultkv_bin() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    // tests/integration -> workspace root
    let workspace_root = manifest_dir
        .parent()
        .expect("tests/ parent")
        .parent()
        .expect("workspace root");
    let bin = workspace_root.join("target").join("debug").join("vaultkv");
    assert!(
        bin.exists(),
        "vaultkv binary not found at {}; run `cargo build -p vaultkv-cli` first",
        bin.display()
    );
    bin
}

/// A command pointed at a throwaway file-backed config.
fn vaultkv_cmd(config: &Path) -> Command {
    let mut cmd = Command::new(vaultkv_bin());
    cmd.env("VAULTKV_CONFIG", config)
        .env("VAULTKV_MASTER_KEY", hex::encode(TEST_MASTER_KEY))
        .env_remove("VAULTKV_NAMESPACE")
        .env_remove("VAULTKV_DIR")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("vaultkv.json5");
    let store = dir.path().join("store");
    std::fs::write(
        &path,
        format!(
            "{{ namespace: 'cli', persisting_keys: ['keep'], backend: {{ kind: 'file', dir: {} }} }}",
            serde_json::to_string(&store).unwrap()
        ),
    )
    .unwrap();
    path
}

fn run(config: &Path, args: &[&str]) -> Output {
    vaultkv_cmd(config)
        .args(args)
        .output()
        .expect("failed to run vaultkv")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn test_cli_version() {
    let dir = TempDir::new().unwrap();
    let output = run(&write_config(&dir), &["version"]);
    assert!(output.status.success(), "version command should succeed");
    assert!(
        stdout(&output).contains("vaultkv"),
        "version output should contain 'vaultkv', got: {}",
        stdout(&output)
    );
}

#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = run(&write_config(&dir), &["--help"]);
    assert!(output.status.success(), "--help should succeed");
    let text = stdout(&output);
    for command in ["get", "set", "remove", "reset", "hard-reset"] {
        assert!(text.contains(command), "help should mention '{}', got: {}", command, text);
    }
}

#[test]
fn test_cli_unknown_command() {
    let dir = TempDir::new().unwrap();
    let output = run(&write_config(&dir), &["nonexistent-command"]);
    assert!(!output.status.success(), "unknown command should return non-zero exit code");
}

#[test]
fn test_cli_missing_config_file() {
    let dir = TempDir::new().unwrap();
    let output = run(&dir.path().join("absent.json5"), &["get", "k"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
}

#[test]
fn test_cli_set_then_get_across_runs() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    assert!(run(&config, &["set", "greeting", "hello"]).status.success());
    assert!(run(&config, &["set", "count", "41", "--type", "int"]).status.success());
    assert!(run(&config, &["set", "blob", "c0ffee", "--type", "raw"]).status.success());

    assert_eq!(stdout(&run(&config, &["get", "greeting"])), "hello");
    assert_eq!(stdout(&run(&config, &["get", "count", "--type", "int"])), "41");
    assert_eq!(stdout(&run(&config, &["get", "blob", "--type", "raw"])), "c0ffee");

    // Stored as a string, so it is not an integer.
    assert!(!run(&config, &["get", "greeting", "--type", "int"]).status.success());
}

#[test]
fn test_cli_remove_and_reset() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    assert!(run(&config, &["set", "keep", "me"]).status.success());
    assert!(run(&config, &["set", "drop", "me"]).status.success());
    assert!(run(&config, &["set", "gone", "me"]).status.success());

    assert!(run(&config, &["remove", "gone"]).status.success());
    assert!(!run(&config, &["get", "gone"]).status.success());

    assert!(run(&config, &["reset"]).status.success());
    assert_eq!(stdout(&run(&config, &["get", "keep"])), "me");
    assert!(!run(&config, &["get", "drop"]).status.success());

    assert!(run(&config, &["hard-reset"]).status.success());
    assert!(!run(&config, &["get", "keep"]).status.success());
}

#[test]
fn test_cli_namespace_flag_isolates_values() {
    let dir = TempDir::new().unwrap();
    let config = write_config(&dir);

    assert!(run(&config, &["set", "k", "default-ns"]).status.success());
    assert!(run(&config, &["--namespace", "other", "set", "k", "other-ns"]).status.success());

    assert_eq!(stdout(&run(&config, &["get", "k"])), "default-ns");
    assert_eq!(stdout(&run(&config, &["get", "k", "-n", "other"])), "other-ns");
}
