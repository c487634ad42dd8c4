//! Infrastructure layer: configuration, logging, HTTP sessions, HTML parsing
//! and report persistence.

pub mod config; // Layered configuration
pub mod http_client;
pub mod logging; // Logging infrastructure
pub mod parsing;
pub mod parsing_error; // Parsing error types
pub mod report_writer;
pub mod session_pool;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, ConfigValidationError, ExecutionMode};
pub use http_client::{FetchError, HttpClient, HttpClientConfig, PageFetcher};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{
    ContextualParser, DetailParseContext, ListingContext, ParsingConfig, ParsingError,
    ParsingResult, ProductDetailParser, ProductListParser,
};
pub use report_writer::ReportWriter;
pub use session_pool::{PooledSession, SessionPool};
