use serde::Serialize;

use crate::mode::BuildMode;
use crate::stage::{Stage, StageKind};
use crate::stages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitChunks {
    All,
}

/// Whole-bundle optimization, applied after every category chain has run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimization {
    pub split_chunks: SplitChunks,
    pub minimizers: Vec<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_compaction: Option<Stage>,
}

impl Optimization {
    /// Development never carries a compaction stage. Production compacts
    /// styles and scripts, then recompresses raster images.
    pub fn for_mode(mode: BuildMode) -> Self {
        match mode {
            BuildMode::Development => Self {
                split_chunks: SplitChunks::All,
                minimizers: Vec::new(),
                image_compaction: None,
            },
            BuildMode::Production => Self {
                split_chunks: SplitChunks::All,
                minimizers: vec![stages::style_compactor(), stages::script_compactor()],
                image_compaction: Some(stages::image_compactor()),
            },
        }
    }

    /// Every optimization stage in application order.
    pub fn stages(&self) -> Vec<&Stage> {
        self.minimizers
            .iter()
            .chain(self.image_compaction.as_ref())
            .collect()
    }

    pub fn is_inert(&self) -> bool {
        self.minimizers.is_empty() && self.image_compaction.is_none()
    }

    pub fn contains(&self, kind: StageKind) -> bool {
        self.stages().iter().any(|stage| stage.kind() == kind)
    }
}
