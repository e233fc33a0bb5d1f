use std::fmt;

use regex::Regex;
use serde::{Serialize, Serializer};
use tracing::debug;

use crate::chain::{StyleDialect, StyleVariant, TransformationChain, style_chain};
use crate::error::AssemblyError;
use crate::mode::BuildMode;
use crate::stages;

pub const IMAGE_OUTPUT_DIR: &str = "img/";
pub const FONT_OUTPUT_DIR: &str = "fonts/";
pub const VENDOR_DIR: &str = "node_modules";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetCategory {
    StylesheetPlain,
    StylesheetChained,
    StylesheetPreprocessed,
    RasterImage,
    Font,
    StructuredDataXml,
    StructuredDataCsv,
    Script,
    Markup,
}

impl AssetCategory {
    /// Evaluation order of the standard rule table.
    pub const ALL: [AssetCategory; 9] = [
        AssetCategory::StylesheetPlain,
        AssetCategory::StylesheetChained,
        AssetCategory::StylesheetPreprocessed,
        AssetCategory::RasterImage,
        AssetCategory::Font,
        AssetCategory::StructuredDataXml,
        AssetCategory::StructuredDataCsv,
        AssetCategory::Script,
        AssetCategory::Markup,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AssetCategory::StylesheetPlain => "stylesheet-plain",
            AssetCategory::StylesheetChained => "stylesheet-chained",
            AssetCategory::StylesheetPreprocessed => "stylesheet-preprocessed",
            AssetCategory::RasterImage => "raster-image",
            AssetCategory::Font => "font",
            AssetCategory::StructuredDataXml => "structured-data-xml",
            AssetCategory::StructuredDataCsv => "structured-data-csv",
            AssetCategory::Script => "script",
            AssetCategory::Markup => "markup",
        }
    }

    pub fn style_variant(self) -> Option<StyleVariant> {
        match self {
            AssetCategory::StylesheetPlain => Some(StyleVariant::Plain),
            AssetCategory::StylesheetChained => Some(StyleVariant::Chained(StyleDialect::Less)),
            AssetCategory::StylesheetPreprocessed => Some(StyleVariant::Preprocessed),
            _ => None,
        }
    }

    fn test_pattern(self) -> &'static str {
        match self {
            AssetCategory::StylesheetPlain => r"\.css$",
            AssetCategory::StylesheetChained => r"\.less$",
            AssetCategory::StylesheetPreprocessed => r"\.s[ac]ss$",
            AssetCategory::RasterImage => r"\.(png|jp?g|svg|gif|webp)$",
            AssetCategory::Font => r"\.(woff(2)?|ttf|eot|svg)(\?v=\d+\.\d+\.\d+)?$",
            AssetCategory::StructuredDataXml => r"\.xml$",
            AssetCategory::StructuredDataCsv => r"\.csv$",
            AssetCategory::Script => r"\.js$",
            AssetCategory::Markup => r"\.(html)$",
        }
    }

    fn exclude_pattern(self) -> Option<&'static str> {
        match self {
            AssetCategory::Script => Some(VENDOR_DIR),
            _ => None,
        }
    }

    fn chain(self, mode: BuildMode) -> Result<TransformationChain, AssemblyError> {
        if let Some(variant) = self.style_variant() {
            return style_chain(mode, variant);
        }
        let stage = match self {
            AssetCategory::RasterImage => stages::file(IMAGE_OUTPUT_DIR, Some(IMAGE_OUTPUT_DIR)),
            AssetCategory::Font => stages::file(FONT_OUTPUT_DIR, None),
            AssetCategory::StructuredDataXml => stages::xml(),
            AssetCategory::StructuredDataCsv => stages::csv(),
            AssetCategory::Script => stages::babel(),
            AssetCategory::Markup => stages::html(),
            _ => return Err(AssemblyError::EmptyChain),
        };
        Ok(TransformationChain::single(stage))
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Match predicate over an asset identity (file name or request path,
/// including any `?query` suffix).
#[derive(Debug, Clone, Serialize)]
pub struct Matcher {
    #[serde(serialize_with = "serialize_regex")]
    test: Regex,
    #[serde(
        serialize_with = "serialize_optional_regex",
        skip_serializing_if = "Option::is_none"
    )]
    exclude: Option<Regex>,
}

impl Matcher {
    pub fn new(
        category: AssetCategory,
        test: &str,
        exclude: Option<&str>,
    ) -> Result<Self, AssemblyError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|source| AssemblyError::Pattern {
                category,
                pattern: pattern.to_string(),
                source,
            })
        };
        Ok(Self {
            test: compile(test)?,
            exclude: exclude.map(compile).transpose()?,
        })
    }

    pub fn matches(&self, identity: &str) -> bool {
        self.test.is_match(identity)
            && !self
                .exclude
                .as_ref()
                .is_some_and(|exclude| exclude.is_match(identity))
    }

    pub fn test_pattern(&self) -> &str {
        self.test.as_str()
    }

    pub fn exclude_pattern(&self) -> Option<&str> {
        self.exclude.as_ref().map(Regex::as_str)
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.test_pattern() == other.test_pattern()
            && self.exclude_pattern() == other.exclude_pattern()
    }
}

fn serialize_regex<S: Serializer>(regex: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(regex.as_str())
}

fn serialize_optional_regex<S: Serializer>(
    regex: &Option<Regex>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match regex {
        Some(regex) => serializer.serialize_some(regex.as_str()),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub category: AssetCategory,
    #[serde(flatten)]
    pub matcher: Matcher,
    #[serde(rename = "use")]
    pub chain: TransformationChain,
}

/// Ordered classification table.
///
/// Rules are evaluated in table order and the first matching rule wins, so an
/// identity such as `icon.svg` that satisfies both the raster-image and the
/// font predicate is always classified as a raster image. Identities that no
/// rule matches are passed through by the bundler untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    pub fn standard(mode: BuildMode) -> Result<Self, AssemblyError> {
        let rules = AssetCategory::ALL
            .into_iter()
            .map(|category| {
                Ok(Rule {
                    category,
                    matcher: Matcher::new(
                        category,
                        category.test_pattern(),
                        category.exclude_pattern(),
                    )?,
                    chain: category.chain(mode)?,
                })
            })
            .collect::<Result<Vec<_>, AssemblyError>>()?;
        Ok(Self { rules })
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn classify(&self, identity: &str) -> Option<&Rule> {
        let rule = self.rules.iter().find(|rule| rule.matcher.matches(identity));
        match rule {
            Some(rule) => debug!(identity, category = %rule.category, "Asset classified"),
            None => debug!(identity, "No rule matched, passing through"),
        }
        rule
    }

    pub fn chain_for(&self, category: AssetCategory) -> Option<&TransformationChain> {
        self.rules
            .iter()
            .find(|rule| rule.category == category)
            .map(|rule| &rule.chain)
    }

    pub fn categories(&self) -> Vec<AssetCategory> {
        self.rules.iter().map(|rule| rule.category).collect()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
