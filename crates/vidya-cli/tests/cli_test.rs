//! Integration tests for the `vidya` binary.
//!
//! Each test points `XDG_CONFIG_HOME` at a temp dir and clears the API key
//! env vars, so nothing touches the user's config or the network.

use std::path::Path;
use std::process::{Command, Output};

fn vidya(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_vidya"))
        .args(args)
        .current_dir(config_home)
        .env("XDG_CONFIG_HOME", config_home)
        .env_remove("VIDYA_GEMINI_API_KEY")
        .env_remove("GEMINI_API_KEY")
        .env_remove("gemini_api_key")
        .env_remove("VIDYA_GEMINI_BASE_URL")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run vidya binary")
}

#[test]
fn init_writes_config_file() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = vidya(tmp.path(), &["init", "--api-key", "test-key"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let path = tmp.path().join("vidya").join("config.toml");
    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("api_key = \"test-key\""));
    assert!(contents.contains("[server]"));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("test-key"), "key must not be echoed");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let tmp = tempfile::TempDir::new().unwrap();
    assert!(vidya(tmp.path(), &["init"]).status.success());

    let second = vidya(tmp.path(), &["init"]);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    assert!(vidya(tmp.path(), &["init", "--force"]).status.success());
}

#[test]
fn search_without_key_reports_failure_result() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = vidya(tmp.path(), &["search", "Class X Science"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["status"], "error");
    assert!(
        value["error_message"]
            .as_str()
            .unwrap()
            .contains("no API key")
    );
}

#[test]
fn generate_without_key_fails_with_configuration_error() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = vidya(tmp.path(), &["generate", "Class X Science"]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("configuration error"), "stderr: {stderr}");
}
