use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::assembler::PipelineSpec;
use crate::mode::BuildMode;
use crate::rules::AssetCategory;
use crate::stage::Stage;

#[derive(Debug, Serialize)]
pub struct PipelineLock {
    pub mode: BuildMode,
    pub generated_at: DateTime<Utc>,
    pub output_filename: String,
    pub rules: Vec<RuleLock>,
    pub optimization: Vec<StageLock>,
    pub plugins: Vec<StageLock>,
}

#[derive(Debug, Serialize)]
pub struct RuleLock {
    pub category: AssetCategory,
    pub pattern: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
    pub stages: Vec<StageLock>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct StageLock {
    pub name: String,
    pub params_hash: String,
}

pub fn build_lock(spec: &PipelineSpec) -> PipelineLock {
    let rules = spec
        .rules()
        .rules()
        .iter()
        .map(|rule| RuleLock {
            category: rule.category,
            pattern: rule.matcher.test_pattern().to_string(),
            exclude: rule.matcher.exclude_pattern().map(str::to_string),
            stages: rule.chain.iter().map(lock_stage).collect(),
        })
        .collect();

    PipelineLock {
        mode: spec.mode(),
        generated_at: Utc::now(),
        output_filename: spec.naming().to_string(),
        rules,
        optimization: spec
            .optimization()
            .stages()
            .into_iter()
            .map(lock_stage)
            .collect(),
        plugins: spec.plugins().iter().map(lock_stage).collect(),
    }
}

pub fn generate_lock(spec: &PipelineSpec, path: &Path) -> Result<()> {
    let lock = build_lock(spec);

    let file = File::create(path)
        .with_context(|| format!("Failed to create lockfile: {}", path.display()))?;
    serde_yaml::to_writer(file, &lock)
        .with_context(|| format!("Failed to write lockfile: {}", path.display()))?;

    Ok(())
}

fn lock_stage(stage: &Stage) -> StageLock {
    StageLock {
        name: stage.name().to_string(),
        params_hash: hash_params(stage),
    }
}

fn hash_params(stage: &Stage) -> String {
    let mut hasher = Sha256::new();
    let serialized = serde_json::to_vec(stage.options()).unwrap_or_default();
    hasher.update(stage.name().as_bytes());
    hasher.update(serialized);
    format!("{:x}", hasher.finalize())
}
