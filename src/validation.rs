use std::collections::BTreeSet;
use std::path::Component;

use serde::Serialize;

use crate::assembler::PipelineSpec;
use crate::mode::BuildMode;
use crate::naming::NamingPattern;
use crate::rules::Rule;
use crate::stage::{Stage, StageKind, StageRegistry, StageRole};

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }
}

pub fn validate_spec(spec: &PipelineSpec, registry: &StageRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();

    if spec.entry.is_empty() || spec.entry.values().all(Vec::is_empty) {
        report
            .errors
            .push("At least one entry point is required".into());
    }

    if spec.dev_server.port == 0 {
        report
            .errors
            .push("Dev server port must be non-zero".into());
    }

    report.merge(validate_naming("output", &spec.output.filename, spec.mode));
    report.merge(validate_rules(spec));
    report.merge(validate_optimization(spec));
    report.merge(validate_plugins(spec));
    report.merge(validate_aliases(spec));

    let all_stages = spec
        .rules
        .rules()
        .iter()
        .flat_map(|rule| rule.chain.stages())
        .chain(spec.optimization.stages())
        .chain(spec.plugins.iter());
    for stage in all_stages {
        report.merge(validate_stage(stage, registry));
    }

    report
}

fn validate_stage(stage: &Stage, registry: &StageRegistry) -> ValidationReport {
    let mut report = ValidationReport::default();
    if let Err(err) = registry.create(stage.name(), stage.options().clone()) {
        report.errors.push(format!(
            "{:#}",
            err.context(format!("Failed to instantiate stage '{}'", stage.name()))
        ));
    }
    report
}

fn validate_naming(label: &str, pattern: &NamingPattern, mode: BuildMode) -> ValidationReport {
    let mut report = ValidationReport::default();
    let hashes = pattern.hash_placeholders();
    let expected = match mode {
        BuildMode::Development => 0,
        BuildMode::Production => 1,
    };
    if hashes != expected {
        report.errors.push(format!(
            "{label} naming pattern '{pattern}' has {hashes} content hash placeholder(s), {mode} builds require {expected}"
        ));
    }
    report
}

fn validate_rules(spec: &PipelineSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    if spec.rules.is_empty() {
        report
            .errors
            .push("Rule table must contain at least one rule".into());
    }

    let mut seen = BTreeSet::new();
    for rule in spec.rules.rules() {
        if !seen.insert(rule.category) {
            report
                .errors
                .push(format!("Category '{}' appears more than once", rule.category));
        }
        report.merge(validate_chain(rule));
    }

    report
}

fn validate_chain(rule: &Rule) -> ValidationReport {
    let mut report = ValidationReport::default();
    let category = rule.category;

    if rule.chain.is_empty() {
        report
            .errors
            .push(format!("Category '{category}' has an empty transformation chain"));
        return report;
    }

    for stage in &rule.chain {
        if stage.kind().role() != StageRole::Loader {
            report.errors.push(format!(
                "Stage '{}' cannot be used in the '{category}' chain",
                stage.name()
            ));
        }
    }

    if let Some(variant) = category.style_variant() {
        if rule.chain.len() != variant.expected_len() {
            report.errors.push(format!(
                "Category '{category}' requires {} stage(s) but has {}",
                variant.expected_len(),
                rule.chain.len()
            ));
        }
        let kinds = rule.chain.kinds();
        let shared_base = kinds.first().is_some_and(|kind| kind.is_style_injection())
            && kinds.get(1) == Some(&StageKind::Css);
        if !shared_base {
            report.errors.push(format!(
                "Category '{category}' must start with an injection stage followed by css"
            ));
        }
    }

    report
}

fn validate_optimization(spec: &PipelineSpec) -> ValidationReport {
    let mut report = ValidationReport::default();
    let optimization = &spec.optimization;

    match spec.mode {
        BuildMode::Development => {
            if !optimization.is_inert() {
                report
                    .errors
                    .push("Optimization stages must never run in development builds".into());
            }
        }
        BuildMode::Production => {
            for required in [StageKind::StyleCompactor, StageKind::ScriptCompactor] {
                if !optimization.contains(required) {
                    report
                        .errors
                        .push(format!("Production builds require a '{required}' stage"));
                }
            }
        }
    }

    for stage in optimization.stages() {
        if stage.kind().role() != StageRole::Minimizer {
            report.errors.push(format!(
                "Stage '{}' cannot be used as an optimization stage",
                stage.name()
            ));
        }
    }

    report
}

fn validate_plugins(spec: &PipelineSpec) -> ValidationReport {
    let mut report = ValidationReport::default();

    match spec.plugins.first() {
        None => report
            .errors
            .push("Auxiliary stage list cannot be empty".into()),
        Some(stage) if stage.kind() != StageKind::Clean => report.errors.push(format!(
            "Output cleanup must run before any other auxiliary stage, found '{}' first",
            stage.name()
        )),
        Some(_) => {}
    }

    for stage in &spec.plugins {
        if stage.kind().role() != StageRole::Plugin {
            report.errors.push(format!(
                "Stage '{}' cannot be used as an auxiliary stage",
                stage.name()
            ));
        }
        if stage.kind() == StageKind::StyleBundle
            && let Some(filename) = stage.option("filename").and_then(|value| value.as_str())
        {
            let hashes = filename.matches(crate::naming::HASH_PLACEHOLDER).count();
            let expected = usize::from(spec.mode.is_production());
            if hashes != expected {
                report.errors.push(format!(
                    "Extracted style naming pattern '{filename}' does not match {} naming",
                    spec.mode
                ));
            }
        }
    }

    report
}

fn validate_aliases(spec: &PipelineSpec) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (alias, target) in &spec.resolve.alias {
        let escapes = target
            .components()
            .any(|component| component == Component::ParentDir);
        if escapes || !target.starts_with(&spec.context) {
            report.warnings.push(format!(
                "Alias '{alias}' points outside the source root: {}",
                target.display()
            ));
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::assemble;
    use crate::chain::TransformationChain;
    use crate::config::PipelineConfig;
    use crate::stages;

    fn spec(mode: BuildMode) -> PipelineSpec {
        assemble(mode, &PipelineConfig::default()).unwrap()
    }

    #[test]
    fn assembled_specs_are_valid() {
        let registry = stages::default_registry();
        for mode in [BuildMode::Development, BuildMode::Production] {
            let report = validate_spec(&spec(mode), &registry);
            assert!(report.is_ok(), "{mode}: {:?}", report.errors);
            assert!(report.warnings.is_empty());
        }
    }

    #[test]
    fn aliases_leaving_source_root_warn() {
        let mut config = PipelineConfig::default();
        config
            .aliases
            .insert("@shared".into(), "../shared".into());
        config.aliases.insert("@vendor".into(), "/opt/vendor".into());
        // Warnings never abort assembly.
        let spec = assemble(BuildMode::Production, &config).unwrap();

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(report.is_ok());
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings[0].contains("Alias '@shared' points outside the source root"));
        assert!(report.warnings[1].contains("Alias '@vendor'"));
    }

    #[test]
    fn development_with_minimizers_is_rejected() {
        let mut spec = spec(BuildMode::Development);
        spec.optimization.minimizers.push(stages::script_compactor());

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(
            report
                .errors
                .iter()
                .any(|err| err.contains("never run in development"))
        );
    }

    #[test]
    fn production_without_style_compactor_is_rejected() {
        let mut spec = spec(BuildMode::Production);
        spec.optimization.minimizers.retain(|stage| stage.kind() != StageKind::StyleCompactor);

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(report.errors.iter().any(|err| err.contains("style-compactor")));
    }

    #[test]
    fn cleanup_must_run_first() {
        let mut spec = spec(BuildMode::Production);
        spec.plugins.rotate_left(1);

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(report.errors.iter().any(|err| err.contains("cleanup")));
    }

    #[test]
    fn truncated_style_chain_is_rejected() {
        let mut spec = spec(BuildMode::Development);
        let rules = spec
            .rules
            .rules()
            .iter()
            .cloned()
            .map(|mut rule| {
                if rule.category == crate::rules::AssetCategory::StylesheetPreprocessed {
                    rule.chain = TransformationChain::single(stages::sass());
                }
                rule
            })
            .collect();
        spec.rules = crate::rules::RuleTable::from_rules(rules);

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(report.errors.iter().any(|err| err.contains("requires 4 stage(s)")));
        assert!(report.errors.iter().any(|err| err.contains("injection stage")));
    }

    #[test]
    fn misplaced_stage_role_is_rejected() {
        let mut spec = spec(BuildMode::Production);
        spec.plugins.push(stages::css());

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(
            report
                .errors
                .iter()
                .any(|err| err.contains("'css' cannot be used as an auxiliary stage"))
        );
    }

    #[test]
    fn invalid_stage_options_are_rejected() {
        let mut spec = spec(BuildMode::Production);
        spec.plugins[1] = Stage::new(StageKind::Copy);

        let report = validate_spec(&spec, &stages::default_registry());
        assert!(report.errors.iter().any(|err| err.contains("Failed to instantiate stage 'copy'")));
    }

    #[test]
    fn hashed_development_naming_is_rejected() {
        let pattern = NamingPattern::for_mode(BuildMode::Production, "js");
        let report = validate_naming("output", &pattern, BuildMode::Development);
        assert!(!report.is_ok());
    }
}
