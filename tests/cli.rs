use assert_cmd::Command;
use tempfile::tempdir;

fn assetline() -> Command {
    let mut cmd = Command::cargo_bin("assetline").expect("binary present");
    cmd.env_remove("NODE_ENV");
    cmd
}

#[test]
fn show_uses_environment_signal() {
    let output = assetline()
        .env("NODE_ENV", "development")
        .arg("show")
        .output()
        .unwrap();
    assert!(output.status.success());

    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(spec["mode"], "development");
    assert_eq!(spec["output"]["filename"], "[name].js");
    assert_eq!(spec["optimization"]["minimizers"], serde_json::json!([]));
}

#[test]
fn missing_signal_builds_for_production() {
    let output = assetline().arg("show").output().unwrap();
    assert!(output.status.success());

    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(spec["mode"], "production");
    assert_eq!(spec["output"]["filename"], "[name].[hash].js");
}

#[test]
fn mode_flag_overrides_signal() {
    let output = assetline()
        .env("NODE_ENV", "production")
        .args(["--mode", "development", "show"])
        .output()
        .unwrap();
    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(spec["mode"], "development");
}

#[test]
fn classify_reports_chain_and_pass_through() {
    let output = assetline()
        .args(["classify", "theme.scss", "notes.md"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("theme.scss: stylesheet-preprocessed [style-inject, css, postcss, sass]"));
    assert!(stdout.contains("notes.md: pass-through"));
}

#[test]
fn init_then_lock_round_trip() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("assetline.yaml");
    let lock = temp.path().join("out/assetline.lock");

    assetline()
        .args(["init", "--output"])
        .arg(&config)
        .assert()
        .success();
    assert!(config.is_file());

    assetline()
        .arg("--config")
        .arg(&config)
        .arg("lock")
        .arg(&lock)
        .assert()
        .success();
    assert!(lock.is_file());
}

#[test]
fn invalid_config_fails_validation() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("broken.yaml");
    std::fs::write(&config, "dev_server_port: 0\n").unwrap();

    let output = assetline()
        .arg("--config")
        .arg(&config)
        .arg("validate")
        .output()
        .unwrap();
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Dev server port must be non-zero"));
    assert!(stderr.contains("Pipeline validation failed with 1 error(s)"));
}

#[test]
fn valid_config_passes_validation() {
    assetline().arg("validate").assert().success();
}

#[test]
fn show_names_engine_packages() {
    let output = assetline().arg("show").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("\"package\": \"css-loader\""));
    assert!(stdout.contains("mini-css-extract-plugin"));
}

#[test]
fn unknown_plugin_in_config_is_reported() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("assetline.yaml");
    std::fs::write(&config, "plugins:\n  - stage: uglify\n").unwrap();

    let output = assetline()
        .arg("--config")
        .arg(&config)
        .arg("validate")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown stage 'uglify'"));
}
