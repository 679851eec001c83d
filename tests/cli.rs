//! Integration tests for CLI commands

#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `docchat` with config lookups confined to a temp dir
fn docchat(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docchat").unwrap();
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env_remove("DOCCHAT_BASE_URL")
        .env_remove("DOCCHAT_MAX_FILE_SIZE")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("health"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_config_path_points_into_config_dir() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .args(["config", "--path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("docchat"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_dump_applies_env_override() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .arg("config")
        .env("DOCCHAT_BASE_URL", "http://rag.internal:8080")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_url = \"http://rag.internal:8080\""))
        .stdout(predicate::str::contains("max_file_size_bytes = 10485760"));
}

#[test]
fn test_config_init_refuses_to_overwrite() {
    let home = TempDir::new().unwrap();
    docchat(&home).args(["config", "--init"]).assert().success();
    docchat(&home)
        .args(["config", "--init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_health_against_unreachable_backend_fails() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .args(["health", "--base-url", "http://127.0.0.1:9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Health check failed"));
}

#[test]
fn test_chat_rejects_unknown_mode() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .args(["chat", "--mode", "video"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown chat mode"));
}

#[test]
fn test_chat_session_quits_cleanly() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .args(["chat", "--mode", "pdf", "--base-url", "http://127.0.0.1:9"])
        .env("NO_COLOR", "1")
        .write_stdin("/help\n/files\n/quit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("══ pdf ══"))
        .stdout(predicate::str::contains("/attach"))
        .stdout(predicate::str::contains("Chưa có tệp PDF nào"))
        .stdout(predicate::str::contains("Tạm biệt!"));
}

#[test]
fn test_version_is_package_version() {
    let home = TempDir::new().unwrap();
    docchat(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::diff(format!("docchat {}\n", env!("CARGO_PKG_VERSION"))));
}
