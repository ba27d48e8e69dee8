//! CLI Integration Tests for Dossier
//!
//! Runs the built binary for help, version and `check-config`.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

/// Run dossier-server with arguments, isolated from the caller's environment
fn run_dossier(args: &[&str], working_dir: &std::path::Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_dossier-server"))
        .args(args)
        .current_dir(working_dir)
        .env_remove("DOSSIER_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_dossier(&["--help"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Dossier"));
    assert!(stdout.contains("serve"));
    assert!(stdout.contains("research"));
    assert!(stdout.contains("check-config"));
}

#[test]
fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_dossier(&["--version"], dir.path());

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_check_config_accepts_valid_file() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("dossier.toml"),
        r#"
[server]
port = 9100

[pipeline]
step_budget = 30

[llm]
base_url = "http://localhost:11434/v1"
model = "llama3.2"
api_key_env = ""

[images]
api_key_env = ""
"#,
    )
    .unwrap();

    let output = run_dossier(&["--no-color", "check-config"], dir.path());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success(), "stdout: {stdout}");
    assert!(stdout.contains("[OK] Configuration is valid"));
    assert!(stdout.contains("127.0.0.1:9100"));
    assert!(stdout.contains("cited_sources"));
}

#[test]
fn test_check_config_rejects_zero_budget() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(
        &path,
        "[pipeline]\nstep_budget = 0\n\n[llm]\napi_key_env = \"\"\n",
    )
    .unwrap();

    let output = run_dossier(
        &["--no-color", "--config", path.to_str().unwrap(), "check-config"],
        dir.path(),
    );

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("step_budget"));
}

#[test]
fn test_check_config_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let output = run_dossier(&["--no-color", "check-config"], dir.path());

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not found"));
}
