use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use assetline::lockfile::generate_lock;
use assetline::presets::generate_preset;
use assetline::stages;
use assetline::{AssemblyError, BuildMode, PipelineConfig, PipelineSpec, assemble};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_tracing()?;

    let Cli {
        mode,
        config,
        command,
    } = cli;

    match command {
        Commands::Init { preset, output } => init_config(&preset, output),
        Commands::ListStages => {
            list_stages();
            Ok(())
        }
        Commands::Validate => {
            let (mode, config) = load_inputs(mode, config.as_deref())?;
            validate_pipeline(mode, &config)
        }
        command => {
            let (mode, config) = load_inputs(mode, config.as_deref())?;
            let spec = assemble(mode, &config).context("Failed to assemble pipeline")?;
            run_with_spec(command, &spec)
        }
    }
}

fn load_inputs(
    mode: Option<BuildMode>,
    config: Option<&Path>,
) -> Result<(BuildMode, PipelineConfig)> {
    let mode = mode.unwrap_or_else(BuildMode::from_env);
    let config = match config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    Ok((mode, config))
}

fn validate_pipeline(mode: BuildMode, config: &PipelineConfig) -> Result<()> {
    match assemble(mode, config) {
        Ok(_) => {
            info!(mode = %mode, "Pipeline validation passed");
            Ok(())
        }
        Err(AssemblyError::Invalid { errors }) => {
            for error_msg in &errors {
                error!(mode = %mode, "{error_msg}");
            }
            Err(anyhow!(
                "Pipeline validation failed with {} error(s)",
                errors.len()
            ))
        }
        Err(err) => Err(err).context("Failed to assemble pipeline"),
    }
}

fn configure_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|err| anyhow!(err.to_string()))?;
    Ok(())
}

fn run_with_spec(command: Commands, spec: &PipelineSpec) -> Result<()> {
    match command {
        Commands::Show { format } => {
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(spec)?,
                OutputFormat::Yaml => serde_yaml::to_string(spec)?,
            };
            println!("{rendered}");
            Ok(())
        }
        Commands::Classify { assets } => {
            for asset in &assets {
                match spec.classify(asset) {
                    Some(rule) => {
                        let stages: Vec<_> = rule.chain.iter().map(|stage| stage.name()).collect();
                        println!("{asset}: {} [{}]", rule.category, stages.join(", "));
                    }
                    None => println!("{asset}: pass-through"),
                }
            }
            Ok(())
        }
        Commands::Lock { output } => {
            if let Some(parent) = output.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create lockfile directory: {}", parent.display())
                })?;
            }
            generate_lock(spec, &output)?;
            info!(lockfile = %output.display(), "Lockfile generated successfully");
            Ok(())
        }
        Commands::Init { .. } | Commands::ListStages | Commands::Validate => Ok(()),
    }
}

fn init_config(preset: &str, output: Option<PathBuf>) -> Result<()> {
    let destination = output.unwrap_or_else(|| PathBuf::from("assetline.yaml"));
    let generated = generate_preset(preset, &destination)?;
    info!(
        preset = %preset,
        path = %generated.display(),
        "Preset config generated"
    );
    Ok(())
}

fn list_stages() {
    let registry = stages::default_registry();
    println!("Available stages:");
    for name in registry.known_stages() {
        println!("- {name}");
    }
}

#[derive(Parser)]
#[command(
    name = "assetline",
    version,
    about = "Environment-aware asset pipeline configuration for front-end bundles"
)]
struct Cli {
    /// Build mode. Falls back to the NODE_ENV designation when omitted.
    #[arg(long, value_enum, global = true)]
    mode: Option<BuildMode>,
    /// Pipeline config file (YAML). Built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the assembled pipeline.
    Show {
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Show which rule and chain apply to each asset.
    Classify {
        #[arg(required = true)]
        assets: Vec<String>,
    },
    /// Assemble the pipeline and report every validation error.
    Validate,
    Lock {
        output: PathBuf,
    },
    /// Write a starter pipeline config.
    Init {
        #[arg(long, default_value = "default")]
        preset: String,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    ListStages,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}
