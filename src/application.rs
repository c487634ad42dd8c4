//! Application layer module
//!
//! Use cases that orchestrate listing collection, product harvesting and
//! report generation.

pub mod listing_collector;
pub mod product_pipeline;
pub mod report_builder;
pub mod search_run;

pub use listing_collector::{ListingCollector, build_search_url};
pub use product_pipeline::{PipelineOutcome, ProductPipeline};
pub use report_builder::{best_item, build_report, build_report_at};
pub use search_run::{RunOutcome, SearchRun};
