use std::path::Path;

use anyhow::{Result, anyhow, bail};
use serde_json::{Value, json};

use crate::mode::BuildMode;
use crate::naming::NamingPattern;
use crate::stage::{Stage, StageKind, StageOptions, StageRegistry};

pub const POSTCSS_PLUGINS: [&str; 2] = ["precss", "autoprefixer"];
pub const BABEL_PRESETS: [&str; 1] = ["@babel/preset-env"];
pub const BABEL_PLUGINS: [&str; 1] = ["@babel/plugin-proposal-class-properties"];
pub const PNGQUANT_QUALITY: &str = "95-100";

pub fn default_registry() -> StageRegistry {
    let mut registry = StageRegistry::new();
    register_defaults(&mut registry);
    registry
}

pub fn register_defaults(registry: &mut StageRegistry) {
    for kind in StageKind::ALL {
        registry.register(kind.name(), move |options| from_options(kind, options));
    }
}

fn from_options(kind: StageKind, options: StageOptions) -> Result<Stage> {
    match kind {
        StageKind::StyleExtract => {
            require_bool(&options, kind, "hmr")?;
        }
        StageKind::Postcss => {
            let plugins = require_array(&options, kind, "plugins")?;
            if plugins.iter().any(|plugin| !plugin.is_string()) {
                bail!("{kind} stage 'plugins' must list plugin names");
            }
        }
        StageKind::File => {
            let name = require_string(&options, kind, "name")?;
            if name.contains(crate::naming::HASH_PLACEHOLDER) {
                bail!("{kind} stage 'name' must not be hash-qualified: {name}");
            }
            require_string(&options, kind, "outputPath")?;
        }
        StageKind::ImageCompactor => {
            let quality = options
                .get("pngquant")
                .and_then(|pngquant| pngquant.get("quality"))
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("{kind} stage requires 'pngquant.quality'"))?;
            parse_quality_range(quality)?;
        }
        StageKind::Copy => {
            let patterns = require_array(&options, kind, "patterns")?;
            if patterns.is_empty() {
                bail!("{kind} stage requires at least one pattern");
            }
            for pattern in patterns {
                if pattern.get("from").and_then(Value::as_str).is_none()
                    || pattern.get("to").and_then(Value::as_str).is_none()
                {
                    bail!("{kind} stage patterns need 'from' and 'to' paths");
                }
            }
        }
        StageKind::HtmlTemplate => {
            require_string(&options, kind, "template")?;
        }
        StageKind::StyleBundle => {
            require_string(&options, kind, "filename")?;
        }
        _ => {}
    }
    Ok(Stage::with_options(kind, options))
}

/// Extracts styles into their own file. Hot reload follows the build mode.
pub fn style_extract(mode: BuildMode) -> Stage {
    Stage::with_options(
        StageKind::StyleExtract,
        options([("hmr", json!(mode.is_development())), ("reloadAll", json!(true))]),
    )
}

pub fn style_inject() -> Stage {
    Stage::new(StageKind::StyleInject)
}

pub fn css() -> Stage {
    Stage::new(StageKind::Css)
}

pub fn less() -> Stage {
    Stage::new(StageKind::Less)
}

pub fn postcss() -> Stage {
    Stage::with_options(
        StageKind::Postcss,
        options([("plugins", json!(POSTCSS_PLUGINS))]),
    )
}

pub fn sass() -> Stage {
    Stage::new(StageKind::Sass)
}

pub fn file(output_path: &str, public_path: Option<&str>) -> Stage {
    let mut opts = options([
        ("name", json!(NamingPattern::asset().as_str())),
        ("outputPath", json!(output_path)),
    ]);
    if let Some(public_path) = public_path {
        opts.insert("publicPath".into(), json!(public_path));
    }
    Stage::with_options(StageKind::File, opts)
}

pub fn xml() -> Stage {
    Stage::new(StageKind::Xml)
}

pub fn csv() -> Stage {
    Stage::new(StageKind::Csv)
}

pub fn babel() -> Stage {
    Stage::with_options(
        StageKind::Babel,
        options([
            ("presets", json!(BABEL_PRESETS)),
            ("plugins", json!(BABEL_PLUGINS)),
        ]),
    )
}

pub fn html() -> Stage {
    Stage::new(StageKind::Html)
}

pub fn style_compactor() -> Stage {
    Stage::new(StageKind::StyleCompactor)
}

pub fn script_compactor() -> Stage {
    Stage::new(StageKind::ScriptCompactor)
}

pub fn image_compactor() -> Stage {
    Stage::with_options(
        StageKind::ImageCompactor,
        options([("pngquant", json!({ "quality": PNGQUANT_QUALITY }))]),
    )
}

pub fn clean() -> Stage {
    Stage::new(StageKind::Clean)
}

pub fn copy(from: &Path, to: &Path) -> Stage {
    Stage::with_options(
        StageKind::Copy,
        options([(
            "patterns",
            json!([{
                "from": from.to_string_lossy(),
                "to": to.to_string_lossy(),
            }]),
        )]),
    )
}

pub fn html_template(template: &str, mode: BuildMode) -> Stage {
    Stage::with_options(
        StageKind::HtmlTemplate,
        options([
            ("template", json!(template)),
            (
                "minify",
                json!({ "collapseWhitespace": mode.is_production() }),
            ),
        ]),
    )
}

pub fn style_bundle(filename: &NamingPattern) -> Stage {
    Stage::with_options(
        StageKind::StyleBundle,
        options([("filename", json!(filename.as_str()))]),
    )
}

fn options<const N: usize>(entries: [(&str, Value); N]) -> StageOptions {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

fn require_string<'a>(options: &'a StageOptions, kind: StageKind, key: &str) -> Result<&'a str> {
    options
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{kind} stage requires '{key}' parameter"))
}

fn require_bool(options: &StageOptions, kind: StageKind, key: &str) -> Result<bool> {
    options
        .get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| anyhow!("{kind} stage requires boolean '{key}' parameter"))
}

fn require_array<'a>(
    options: &'a StageOptions,
    kind: StageKind,
    key: &str,
) -> Result<&'a Vec<Value>> {
    options
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| anyhow!("{kind} stage requires list '{key}' parameter"))
}

fn parse_quality_range(value: &str) -> Result<(u8, u8)> {
    let (low, high) = value
        .split_once('-')
        .ok_or_else(|| anyhow!("Quality range must look like 'min-max', got '{value}'"))?;
    let low: u8 = low
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid quality bound '{low}'"))?;
    let high: u8 = high
        .trim()
        .parse()
        .map_err(|_| anyhow!("Invalid quality bound '{high}'"))?;
    if low > high || high > 100 {
        bail!("Quality range '{value}' must satisfy min <= max <= 100");
    }
    Ok((low, high))
}
