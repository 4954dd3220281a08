//! Harvest module: metadata extraction and the pipeline coordinator.
//!
//! - **Extraction**: typed metadata documents and field projection via
//!   [`extract::extract`]
//! - **Pipeline**: async executor via [`pipeline::HarvestPipeline`]

pub mod extract;
pub mod pipeline;

// Re-export commonly used types
pub use extract::{DistributionFile, ExtractError, PackageDocument, PackageInfo};

pub use pipeline::{
    HarvestPipeline, HarvestReport, HarvestStats, PipelineError, SkipReason, SkippedPackage,
};
