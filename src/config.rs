use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::stage::StageOptions;

pub const DEFAULT_DEV_SERVER_PORT: u16 = 5050;
pub const ROOT_ALIAS: &str = "@";
pub const STYLES_ALIAS: &str = "@css";
pub const SCRIPTS_ALIAS: &str = "@js";

/// A stage requested by name from the config file, built through the stage
/// registry.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StageSpec {
    pub stage: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<StageOptions>,
}

/// Fixed location parameters of a pipeline. The build mode is not part of
/// this file; it is passed to the assembler separately.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the other paths are resolved against.
    pub root: PathBuf,
    /// Source root, relative to `root`.
    pub context: PathBuf,
    /// Output directory, relative to `root`. Cleaned before every build.
    pub output: PathBuf,
    /// Static asset directory copied verbatim, relative to `context`.
    pub static_dir: PathBuf,
    /// Markup template, relative to `context`.
    pub template: String,
    pub entry: BTreeMap<String, Vec<String>>,
    pub extensions: Vec<String>,
    pub dev_server_port: u16,
    /// Import aliases. Targets are relative to `context`.
    pub aliases: BTreeMap<String, PathBuf>,
    /// Extra auxiliary stages, appended after the built-in ones.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<StageSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let mut entry = BTreeMap::new();
        entry.insert(
            "main".to_string(),
            vec!["@babel/polyfill".to_string(), "./index.js".to_string()],
        );
        let aliases = BTreeMap::from([
            (ROOT_ALIAS.to_string(), PathBuf::from(".")),
            (STYLES_ALIAS.to_string(), PathBuf::from("css")),
            (SCRIPTS_ALIAS.to_string(), PathBuf::from("js")),
        ]);
        Self {
            root: PathBuf::from("."),
            context: PathBuf::from("src"),
            output: PathBuf::from("dist"),
            static_dir: PathBuf::from("img"),
            template: "./index.html".to_string(),
            entry,
            extensions: vec![".js".into(), ".json".into(), ".jsx".into()],
            dev_server_port: DEFAULT_DEV_SERVER_PORT,
            aliases,
            plugins: Vec::new(),
        }
    }
}

impl PipelineConfig {
    /// Loads a YAML config. A relative `root` is resolved against the
    /// directory holding the file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config: {}", path.display()))?;
        let mut config: PipelineConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config YAML: {}", path.display()))?;
        if config.root.is_relative()
            && let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            config.root = parent.join(&config.root);
        }
        Ok(config)
    }

    pub fn context_dir(&self) -> PathBuf {
        self.root.join(&self.context)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join(&self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_fields_take_defaults() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("assetline.yaml");
        std::fs::write(&path, "output: public\ndev_server_port: 9000\n").unwrap();

        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.output, PathBuf::from("public"));
        assert_eq!(config.dev_server_port, 9000);
        assert_eq!(config.context, PathBuf::from("src"));
        assert_eq!(config.root, temp.path().join("."));
        assert_eq!(config.output_dir(), temp.path().join(".").join("public"));
        assert_eq!(config.aliases.len(), 3);
        assert!(config.plugins.is_empty());
    }

    #[test]
    fn plugin_requests_parse_with_optional_params() {
        let config: PipelineConfig = serde_yaml::from_str(
            "plugins:\n  - stage: copy\n    params:\n      patterns:\n        - { from: a, to: b }\n  - stage: clean\n",
        )
        .unwrap();
        assert_eq!(config.plugins.len(), 2);
        assert_eq!(config.plugins[0].stage, "copy");
        assert!(config.plugins[0].params.as_ref().unwrap().contains_key("patterns"));
        assert_eq!(config.plugins[1].params, None);
    }

    #[test]
    fn unreadable_config_reports_path() {
        let err = PipelineConfig::load(Path::new("/nonexistent/assetline.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/assetline.yaml"));
    }
}
