//! Price Scout - product listing harvester
//!
//! Collects products from a search results page, reads each product's detail
//! page for price, rating, seller, review count and image, and writes a JSON
//! report ranked by rating.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{RunOutcome, SearchRun};
pub use infrastructure::AppConfig;
