use thiserror::Error;

use crate::rules::AssetCategory;

/// Fatal pipeline construction failure. No partial pipeline is produced.
#[derive(Debug, Error)]
pub enum AssemblyError {
    #[error("Transformation chain must contain at least one stage")]
    EmptyChain,

    #[error("Invalid match pattern for {category}: {pattern}")]
    Pattern {
        category: AssetCategory,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Requested plugin #{index} ('{stage}') could not be built: {message}")]
    Stage {
        index: usize,
        stage: String,
        message: String,
    },

    #[error(
        "Pipeline validation failed with {} error(s): {}",
        .errors.len(),
        .errors.join("; ")
    )]
    Invalid { errors: Vec<String> },
}
