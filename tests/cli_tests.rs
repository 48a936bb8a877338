//! CLI integration tests

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn hotprompt_bin(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("hotprompt").expect("binary built");
    cmd.arg("--config").arg(config).env_remove("RUST_LOG");
    cmd
}

fn temp_config() -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("config.toml");
    (dir, path)
}

#[test]
fn help_output() {
    Command::cargo_bin("hotprompt")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotkey"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("keys"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("--config"));
}

#[test]
fn version_output() {
    Command::cargo_bin("hotprompt")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hotprompt"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_respects_override() {
    let (_dir, path) = temp_config();
    hotprompt_bin(&path)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn default_config_path_is_namespaced() {
    Command::cargo_bin("hotprompt")
        .unwrap()
        .env_remove("HOTPROMPT_CONFIG")
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hotprompt"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_creates_file_once() {
    let (_dir, path) = temp_config();

    hotprompt_bin(&path)
        .args(["config", "init"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Config file created"));
    assert!(path.exists());

    hotprompt_bin(&path)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_get_reads_defaults_without_file() {
    let (_dir, path) = temp_config();
    hotprompt_bin(&path)
        .args(["config", "get", "pipeline.capture_attempts"])
        .assert()
        .success()
        .stdout("3\n");
    assert!(!path.exists());
}

#[test]
fn config_set_then_get() {
    let (_dir, path) = temp_config();

    hotprompt_bin(&path)
        .args(["config", "set", "hotkeys.1.log_color", "#00FF00"])
        .assert()
        .success();

    hotprompt_bin(&path)
        .args(["config", "get", "hotkeys.1.log_color"])
        .assert()
        .success()
        .stdout("#00FF00\n");
}

#[test]
fn config_set_keeps_unknown_keys() {
    let (_dir, path) = temp_config();
    std::fs::write(&path, "custom_theme = \"dark\"\n").unwrap();

    hotprompt_bin(&path)
        .args(["config", "set", "notify", "true"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.contains("custom_theme"));
    assert!(written.contains("notify = true"));
}

#[test]
fn config_set_rejects_wrong_type() {
    let (_dir, path) = temp_config();
    hotprompt_bin(&path)
        .args(["config", "set", "pipeline.capture_attempts", "many"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("integer"));
}

#[test]
fn config_list_masks_api_keys() {
    let (_dir, path) = temp_config();

    hotprompt_bin(&path)
        .args(["keys", "add", "gemini", "AIzaSyTESTKEY1234567890"])
        .assert()
        .success();

    hotprompt_bin(&path)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("providers.gemini.api_keys.0.key"))
        .stdout(predicate::str::contains("AIza...7890"))
        .stdout(predicate::str::contains("AIzaSyTESTKEY1234567890").not());
}

#[test]
fn keys_add_and_list() {
    let (_dir, path) = temp_config();

    hotprompt_bin(&path)
        .args(["keys", "add", "openai", "sk-or-test-000111222", "--label", "Work"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Work"));

    hotprompt_bin(&path)
        .args(["keys", "list", "openai"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Work"))
        .stdout(predicate::str::contains("sk-o...1222"))
        .stdout(predicate::str::contains("active"));
}

#[test]
fn keys_add_rejects_placeholder() {
    let (_dir, path) = temp_config();
    hotprompt_bin(&path)
        .args(["keys", "add", "gemini", "YOUR_API_KEY_HERE"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}
