use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type StageOptions = Map<String, Value>;

/// Where a stage may appear in the assembled pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageRole {
    /// Per-asset transformation inside a category chain.
    Loader,
    /// Whole-bundle compaction, production only.
    Minimizer,
    /// Bundle-level auxiliary step.
    Plugin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    StyleExtract,
    StyleInject,
    Css,
    Less,
    Postcss,
    Sass,
    File,
    Xml,
    Csv,
    Babel,
    Html,
    StyleCompactor,
    ScriptCompactor,
    ImageCompactor,
    Clean,
    Copy,
    HtmlTemplate,
    StyleBundle,
}

impl StageKind {
    pub const ALL: [StageKind; 18] = [
        StageKind::StyleExtract,
        StageKind::StyleInject,
        StageKind::Css,
        StageKind::Less,
        StageKind::Postcss,
        StageKind::Sass,
        StageKind::File,
        StageKind::Xml,
        StageKind::Csv,
        StageKind::Babel,
        StageKind::Html,
        StageKind::StyleCompactor,
        StageKind::ScriptCompactor,
        StageKind::ImageCompactor,
        StageKind::Clean,
        StageKind::Copy,
        StageKind::HtmlTemplate,
        StageKind::StyleBundle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::StyleExtract => "style-extract",
            StageKind::StyleInject => "style-inject",
            StageKind::Css => "css",
            StageKind::Less => "less",
            StageKind::Postcss => "postcss",
            StageKind::Sass => "sass",
            StageKind::File => "file",
            StageKind::Xml => "xml",
            StageKind::Csv => "csv",
            StageKind::Babel => "babel",
            StageKind::Html => "html",
            StageKind::StyleCompactor => "style-compactor",
            StageKind::ScriptCompactor => "script-compactor",
            StageKind::ImageCompactor => "image-compactor",
            StageKind::Clean => "clean",
            StageKind::Copy => "copy",
            StageKind::HtmlTemplate => "html-template",
            StageKind::StyleBundle => "style-bundle",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Package the bundler engine loads to run this stage.
    pub fn implementation(self) -> &'static str {
        match self {
            StageKind::StyleExtract | StageKind::StyleBundle => "mini-css-extract-plugin",
            StageKind::StyleInject => "style-loader",
            StageKind::Css => "css-loader",
            StageKind::Less => "less-loader",
            StageKind::Postcss => "postcss-loader",
            StageKind::Sass => "sass-loader",
            StageKind::File => "file-loader",
            StageKind::Xml => "xml-loader",
            StageKind::Csv => "csv-loader",
            StageKind::Babel => "babel-loader",
            StageKind::Html => "html-loader",
            StageKind::StyleCompactor => "optimize-css-assets-webpack-plugin",
            StageKind::ScriptCompactor => "terser-webpack-plugin",
            StageKind::ImageCompactor => "imagemin-webpack-plugin",
            StageKind::Clean => "clean-webpack-plugin",
            StageKind::Copy => "copy-webpack-plugin",
            StageKind::HtmlTemplate => "html-webpack-plugin",
        }
    }

    pub fn role(self) -> StageRole {
        match self {
            StageKind::StyleCompactor | StageKind::ScriptCompactor | StageKind::ImageCompactor => {
                StageRole::Minimizer
            }
            StageKind::Clean
            | StageKind::Copy
            | StageKind::HtmlTemplate
            | StageKind::StyleBundle => StageRole::Plugin,
            _ => StageRole::Loader,
        }
    }

    /// Outermost stage of a style chain: either extracts the stylesheet into
    /// its own file or injects it at runtime.
    pub fn is_style_injection(self) -> bool {
        matches!(self, StageKind::StyleExtract | StageKind::StyleInject)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One named transformation step. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    kind: StageKind,
    /// Package the engine loads for `kind`.
    package: &'static str,
    #[serde(skip_serializing_if = "Map::is_empty")]
    options: StageOptions,
}

impl Stage {
    pub fn new(kind: StageKind) -> Self {
        Self::with_options(kind, StageOptions::new())
    }

    pub fn with_options(kind: StageKind, options: StageOptions) -> Self {
        Self {
            kind,
            package: kind.implementation(),
            options,
        }
    }

    pub fn kind(&self) -> StageKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn package(&self) -> &'static str {
        self.package
    }

    pub fn options(&self) -> &StageOptions {
        &self.options
    }

    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }
}

type StageConstructor = Arc<dyn Fn(StageOptions) -> Result<Stage> + Send + Sync>;

/// Named stage definitions. Every stage in an assembled pipeline must be
/// constructible through this registry with the options it carries.
pub struct StageRegistry {
    factories: HashMap<String, StageConstructor>,
}

impl Default for StageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl StageRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn(StageOptions) -> Result<Stage> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Arc::new(constructor));
    }

    pub fn create(&self, name: &str, options: StageOptions) -> Result<Stage> {
        let factory = self.factories.get(name).ok_or_else(|| {
            anyhow!(
                "Unknown stage '{}'. Available stages: {}",
                name,
                self.known_stages().join(", ")
            )
        })?;
        factory(options)
    }

    pub fn known_stages(&self) -> Vec<String> {
        let mut names: Vec<_> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}
