pub mod assembler;
pub mod chain;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod mode;
pub mod naming;
pub mod optimize;
pub mod presets;
pub mod rules;
pub mod stage;
pub mod stages;
pub mod validation;

pub use assembler::{PipelineSpec, assemble};
pub use config::PipelineConfig;
pub use error::AssemblyError;
pub use mode::BuildMode;
