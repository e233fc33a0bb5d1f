use std::slice;

use serde::Serialize;

use crate::error::AssemblyError;
use crate::mode::BuildMode;
use crate::stage::{Stage, StageKind};
use crate::stages;

/// Ordered stages applied to every asset of one category.
///
/// Chains are listed outermost-first: the stage that produces the final output
/// comes first and the stage closest to the raw source comes last.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransformationChain(Vec<Stage>);

impl TransformationChain {
    pub fn from_stages(stages: Vec<Stage>) -> Result<Self, AssemblyError> {
        if stages.is_empty() {
            return Err(AssemblyError::EmptyChain);
        }
        Ok(Self(stages))
    }

    pub fn single(stage: Stage) -> Self {
        Self(vec![stage])
    }

    pub fn builder() -> ChainBuilder {
        ChainBuilder::default()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.0
    }

    pub fn kinds(&self) -> Vec<StageKind> {
        self.0.iter().map(Stage::kind).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Stage> {
        self.0.first()
    }

    pub fn iter(&self) -> slice::Iter<'_, Stage> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a TransformationChain {
    type Item = &'a Stage;
    type IntoIter = slice::Iter<'a, Stage>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Append-only construction of a [`TransformationChain`].
#[derive(Debug, Default)]
pub struct ChainBuilder {
    stages: Vec<Stage>,
}

impl ChainBuilder {
    pub fn then(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn build(self) -> Result<TransformationChain, AssemblyError> {
        TransformationChain::from_stages(self.stages)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleDialect {
    Less,
}

impl StyleDialect {
    fn stage(self) -> Stage {
        match self {
            StyleDialect::Less => stages::less(),
        }
    }
}

/// Shape of a style chain. Independent of [`BuildMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleVariant {
    Plain,
    Chained(StyleDialect),
    Preprocessed,
}

impl StyleVariant {
    pub fn expected_len(self) -> usize {
        match self {
            StyleVariant::Plain => 2,
            StyleVariant::Chained(_) => 3,
            StyleVariant::Preprocessed => 4,
        }
    }
}

/// Builds the chain for a style sub-type.
///
/// Every chain starts with an injection stage followed by `css` parsing. The
/// variant decides how many stages follow; the mode only affects the options
/// of the injection stage.
pub fn style_chain(
    mode: BuildMode,
    variant: StyleVariant,
) -> Result<TransformationChain, AssemblyError> {
    let builder = TransformationChain::builder();
    let builder = match variant {
        StyleVariant::Plain | StyleVariant::Chained(_) => builder
            .then(stages::style_extract(mode))
            .then(stages::css()),
        StyleVariant::Preprocessed => builder.then(stages::style_inject()).then(stages::css()),
    };
    let builder = match variant {
        StyleVariant::Plain => builder,
        StyleVariant::Chained(dialect) => builder.then(dialect.stage()),
        StyleVariant::Preprocessed => builder.then(stages::postcss()).then(stages::sass()),
    };
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_empty_chain() {
        assert!(matches!(
            TransformationChain::builder().build(),
            Err(AssemblyError::EmptyChain)
        ));
    }

    #[test]
    fn builder_keeps_append_order() {
        let chain = TransformationChain::builder()
            .then(stages::css())
            .then(stages::sass())
            .build()
            .unwrap();
        assert_eq!(chain.kinds(), vec![StageKind::Css, StageKind::Sass]);
        assert_eq!(chain.first().map(Stage::kind), Some(StageKind::Css));
    }
}
