use std::fs;

use assetline::lockfile::{build_lock, generate_lock};
use assetline::presets::generate_preset;
use assetline::rules::AssetCategory;
use assetline::{BuildMode, PipelineConfig, assemble};
use tempfile::tempdir;

#[test]
fn lockfile_generates_expected_yaml() {
    let temp = tempdir().unwrap();
    let spec = assemble(BuildMode::Production, &PipelineConfig::default()).unwrap();

    let lock_path = temp.path().join("assetline.lock");
    generate_lock(&spec, &lock_path).unwrap();

    let content = fs::read_to_string(&lock_path).unwrap();
    assert!(content.contains("mode: production"));
    assert!(content.contains("[name].[hash].js"));
    assert!(content.contains("category: stylesheet-preprocessed"));
    assert!(content.contains("params_hash"));
}

#[test]
fn stage_hashes_are_stable_and_mode_sensitive() {
    let config = PipelineConfig::default();
    let dev = build_lock(&assemble(BuildMode::Development, &config).unwrap());
    let dev_again = build_lock(&assemble(BuildMode::Development, &config).unwrap());
    let prod = build_lock(&assemble(BuildMode::Production, &config).unwrap());

    assert_eq!(dev.rules[0].stages, dev_again.rules[0].stages);
    // The extraction stage carries the hot-reload flag.
    assert_ne!(dev.rules[0].stages[0], prod.rules[0].stages[0]);
    // The parsing stage has no mode-dependent options.
    assert_eq!(dev.rules[0].stages[1], prod.rules[0].stages[1]);
    assert!(dev.optimization.is_empty());
    assert_eq!(prod.optimization.len(), 3);
}

#[test]
fn lock_records_exclusion_patterns() {
    let lock = build_lock(&assemble(BuildMode::Production, &PipelineConfig::default()).unwrap());

    let script = lock
        .rules
        .iter()
        .find(|rule| rule.category == AssetCategory::Script)
        .unwrap();
    assert_eq!(script.exclude.as_deref(), Some("node_modules"));
    assert!(
        lock.rules
            .iter()
            .filter(|rule| rule.category != AssetCategory::Script)
            .all(|rule| rule.exclude.is_none())
    );
}

#[test]
fn generated_presets_load_and_assemble() {
    let temp = tempdir().unwrap();
    for preset in ["default", "library"] {
        let path = temp.path().join(format!("{preset}.yaml"));
        let generated = generate_preset(preset, &path).expect("preset generation");
        let config = PipelineConfig::load(&generated).expect("preset loads");
        let spec = assemble(BuildMode::Production, &config).expect("preset assembles");
        assert!(spec.output().path.starts_with(temp.path()));
    }

    let library = PipelineConfig::load(&temp.path().join("library.yaml")).unwrap();
    assert_eq!(library.dev_server_port, 8080);
    assert!(library.entry.contains_key("index"));
}

#[test]
fn unknown_preset_is_rejected() {
    let temp = tempdir().unwrap();
    let err = generate_preset("webpack5", &temp.path().join("x.yaml")).unwrap_err();
    assert!(err.to_string().contains("Unknown preset 'webpack5'"));
}
