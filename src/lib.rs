pub mod classify;
pub mod client;
pub mod collector;
pub mod export;
pub mod harvest;
pub mod model;

// Re-export common types for convenience
pub use client::{FetchError, IndexClient, MetadataSource, SearchSource};
pub use collector::{CollectError, Collector};
pub use harvest::{HarvestPipeline, HarvestReport, HarvestStats};
pub use model::{PackageRecord, SearchHit, SearchOrdering};
