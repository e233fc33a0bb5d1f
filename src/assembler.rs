use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::AssemblyError;
use crate::mode::BuildMode;
use crate::naming::NamingPattern;
use crate::optimize::Optimization;
use crate::rules::{Rule, RuleTable};
use crate::stage::{Stage, StageRegistry};
use crate::stages;
use crate::validation::validate_spec;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputSpec {
    pub filename: NamingPattern,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveSpec {
    pub extensions: Vec<String>,
    pub alias: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DevServerSpec {
    pub port: u16,
}

/// Immutable pipeline description handed to the bundler engine.
///
/// Only [`assemble`] produces one, and only after it passes validation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSpec {
    pub(crate) mode: BuildMode,
    pub(crate) context: PathBuf,
    pub(crate) entry: BTreeMap<String, Vec<String>>,
    pub(crate) output: OutputSpec,
    pub(crate) resolve: ResolveSpec,
    pub(crate) rules: RuleTable,
    pub(crate) optimization: Optimization,
    /// Auxiliary stages in execution order. Cleanup is always first.
    pub(crate) plugins: Vec<Stage>,
    pub(crate) dev_server: DevServerSpec,
}

impl PipelineSpec {
    pub fn mode(&self) -> BuildMode {
        self.mode
    }

    pub fn context(&self) -> &Path {
        &self.context
    }

    pub fn entry(&self) -> &BTreeMap<String, Vec<String>> {
        &self.entry
    }

    pub fn output(&self) -> &OutputSpec {
        &self.output
    }

    pub fn naming(&self) -> &NamingPattern {
        &self.output.filename
    }

    pub fn resolve(&self) -> &ResolveSpec {
        &self.resolve
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn optimization(&self) -> &Optimization {
        &self.optimization
    }

    pub fn plugins(&self) -> &[Stage] {
        &self.plugins
    }

    pub fn dev_server(&self) -> DevServerSpec {
        self.dev_server
    }

    pub fn classify(&self, identity: &str) -> Option<&Rule> {
        self.rules.classify(identity)
    }
}

/// Builds the complete pipeline for one build mode.
///
/// Pure: nothing is read from or written to disk. Any validation error aborts
/// construction as a whole.
#[instrument(skip_all, fields(mode = %mode))]
pub fn assemble(mode: BuildMode, config: &PipelineConfig) -> Result<PipelineSpec, AssemblyError> {
    let context = config.context_dir();
    let output_path = config.output_dir();

    let registry = stages::default_registry();
    let rules = RuleTable::standard(mode)?;
    let optimization = Optimization::for_mode(mode);

    let mut plugins = vec![
        stages::clean(),
        stages::copy(
            &context.join(&config.static_dir),
            &output_path.join(&config.static_dir),
        ),
        stages::html_template(&config.template, mode),
        stages::style_bundle(&NamingPattern::for_mode(mode, "css")),
    ];
    plugins.extend(requested_plugins(config, &registry)?);

    let spec = PipelineSpec {
        mode,
        entry: config.entry.clone(),
        output: OutputSpec {
            filename: NamingPattern::for_mode(mode, "js"),
            path: output_path,
        },
        resolve: ResolveSpec {
            extensions: config.extensions.clone(),
            alias: config
                .aliases
                .iter()
                .map(|(alias, target)| (alias.clone(), context.join(target)))
                .collect(),
        },
        context,
        rules,
        optimization,
        plugins,
        dev_server: DevServerSpec {
            port: config.dev_server_port,
        },
    };

    let report = validate_spec(&spec, &registry);
    for warning in &report.warnings {
        warn!("{warning}");
    }
    if !report.is_ok() {
        return Err(AssemblyError::Invalid {
            errors: report.errors,
        });
    }

    info!(
        rules = spec.rules.len(),
        optimization_stages = spec.optimization.stages().len(),
        plugins = spec.plugins.len(),
        output = %spec.output.filename,
        "Pipeline assembled"
    );
    Ok(spec)
}

fn requested_plugins(
    config: &PipelineConfig,
    registry: &StageRegistry,
) -> Result<Vec<Stage>, AssemblyError> {
    config
        .plugins
        .iter()
        .enumerate()
        .map(|(index, request)| {
            let params = request.params.clone().unwrap_or_default();
            registry
                .create(&request.stage, params)
                .map_err(|err| AssemblyError::Stage {
                    index,
                    stage: request.stage.clone(),
                    message: format!("{err:#}"),
                })
        })
        .collect()
}
