//! Domain module - search inputs, harvested records and the run report
//!
//! Plain data types shared by the infrastructure and application layers.
//! Nothing in here performs I/O.

pub mod product;
pub mod product_url;
pub mod report;

pub use product::{PriceFilter, ProductRecord, SearchQuery};
pub use product_url::ProductRef;
pub use report::{Report, prune_empty};
