use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::PipelineConfig;

pub const PRESETS: [&str; 2] = ["default", "library"];

pub fn generate_preset(name: &str, destination: &Path) -> Result<PathBuf> {
    let preset = match name {
        "default" => PipelineConfig::default(),
        "library" => library_preset(),
        other => anyhow::bail!(
            "Unknown preset '{other}'. Available presets: {}",
            PRESETS.join(", ")
        ),
    };

    let rendered = serde_yaml::to_string(&preset)?;
    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(destination, rendered)
        .with_context(|| format!("Failed to write preset config: {}", destination.display()))?;

    Ok(destination.to_path_buf())
}

fn library_preset() -> PipelineConfig {
    let mut entry = BTreeMap::new();
    entry.insert("index".to_string(), vec!["./index.js".to_string()]);
    PipelineConfig {
        output: PathBuf::from("lib"),
        entry,
        dev_server_port: 8080,
        ..PipelineConfig::default()
    }
}
