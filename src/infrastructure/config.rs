//! Configuration infrastructure
//!
//! Settings are layered, lowest precedence first:
//! 1. Compiled defaults (see [`defaults`])
//! 2. Optional config file (format picked from the extension)
//! 3. `PRICE_SCOUT__SECTION__KEY` environment variables
//! 4. Command line flags, applied by the binary after loading

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::domain::SearchQuery;
use crate::infrastructure::parsing::ParsingConfig;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "PRICE_SCOUT";

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// What to search for and where
    pub search: SearchConfig,

    /// Where the report goes
    pub output: OutputConfig,

    /// HTTP session settings
    pub http: HttpConfig,

    /// Execution discipline for detail pages
    pub pipeline: PipelineConfig,

    /// CSS selectors for listing and detail pages
    pub parsing: ParsingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Search inputs and site URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search term, also used as report title and file name
    pub term: String,

    /// Lower price bound in whole currency units
    pub price_min: u32,

    /// Upper price bound in whole currency units
    pub price_max: u32,

    /// Currency code recorded in the report
    pub currency: String,

    /// Symbol that precedes amounts on detail pages
    pub currency_symbol: String,

    /// Listing URL prefix; the encoded term is appended directly
    pub base_url: String,

    /// Detail page URL prefix; the product identifier is appended directly
    pub detail_base_url: String,

    /// Identifiers that are never treated as products
    pub blocklist: Vec<String>,
}

/// Report output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the report file is written to
    pub directory: PathBuf,
}

/// HTTP session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,

    /// Send a search-results referer with every request
    pub send_referer: bool,

    /// Per-request deadline in seconds
    pub timeout_seconds: u64,

    /// Total attempts per request (1 = no retry)
    pub max_attempts: u32,

    /// Pause before every request in milliseconds
    pub request_delay_ms: u64,

    pub follow_redirects: bool,
}

/// How detail pages are processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One product at a time in listing order
    Sequential,
    /// One task per product, joined before the report is built
    #[default]
    Concurrent,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Concurrent => f.write_str("concurrent"),
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ConfigValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(ConfigValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: ExecutionMode,

    /// Session pool size, which bounds in-flight detail fetches
    pub max_concurrent: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory; next to the executable when unset
    pub directory: Option<PathBuf>,

    /// Log file name inside the directory
    pub file_name: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            term: defaults::SEARCH_TERM.to_string(),
            price_min: defaults::PRICE_MIN,
            price_max: defaults::PRICE_MAX,
            currency: defaults::CURRENCY.to_string(),
            currency_symbol: defaults::CURRENCY_SYMBOL.to_string(),
            base_url: amazon::SEARCH_URL.to_string(),
            detail_base_url: amazon::DETAIL_URL.to_string(),
            blocklist: amazon::BLOCKLISTED_ASINS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(defaults::OUTPUT_DIRECTORY),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            accept: defaults::ACCEPT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            send_referer: true,
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            max_attempts: defaults::MAX_ATTEMPTS,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            follow_redirects: true,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::default(),
            max_concurrent: defaults::MAX_CONCURRENT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

/// Rejected configuration values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("Search term must not be empty")]
    EmptySearchTerm,

    #[error("Price range is inverted: min {min} > max {max}")]
    InvertedPriceRange { min: u32, max: u32 },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Unknown execution mode '{0}' (expected 'sequential' or 'concurrent')")]
    UnknownMode(String),
}

impl AppConfig {
    /// Check cross-field constraints before a run starts
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.search.term.trim().is_empty() {
            return Err(ConfigValidationError::EmptySearchTerm);
        }
        if self.search.price_min > self.search.price_max {
            return Err(ConfigValidationError::InvertedPriceRange {
                min: self.search.price_min,
                max: self.search.price_max,
            });
        }
        if self.pipeline.max_concurrent == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "pipeline.max_concurrent".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.http.max_attempts == 0 {
            return Err(ConfigValidationError::InvalidValue {
                field: "http.max_attempts".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.search.detail_base_url.is_empty() || self.search.base_url.is_empty() {
            return Err(ConfigValidationError::InvalidValue {
                field: "search.base_url".to_string(),
                reason: "listing and detail base URLs are required".to_string(),
            });
        }
        Ok(())
    }

    /// The immutable query that drives a run
    pub fn search_query(&self) -> SearchQuery {
        SearchQuery::new(
            self.search.term.trim(),
            self.search.price_min,
            self.search.price_max,
            self.search.currency.clone(),
        )
    }

    /// Referer sent with every request when enabled
    pub fn referer(&self) -> Option<String> {
        self.http
            .send_referer
            .then(|| utils::search_referer(&self.search.base_url, &self.search.term))
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("price-scout");

        Ok(config_dir)
    }

    /// Manager for the default per-user config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Manager for an explicit config file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
        }
    }

    /// Merge defaults, the config file (if present) and environment overrides
    pub fn load_config(&self) -> Result<AppConfig> {
        let builder = config::Config::builder()
            .add_source(config::File::from(self.config_path.as_path()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: AppConfig = builder
            .build()
            .with_context(|| format!("Failed to read configuration from {:?}", self.config_path))?
            .try_deserialize()
            .context("Configuration has invalid values")?;

        Ok(config)
    }

    /// Where the loaded configuration came from, for the startup log
    pub fn describe_source(&self) -> String {
        if self.config_path.exists() {
            format!("Loaded configuration from: {:?}", self.config_path)
        } else {
            format!("No configuration file at {:?}, using defaults", self.config_path)
        }
    }

    /// Save configuration to file as pretty JSON
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content = serde_json::to_string_pretty(config)
            .context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Write the default configuration, replacing any existing file
    pub async fn write_default(&self) -> Result<AppConfig> {
        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        Ok(default_config)
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Target site URLs and identifiers
pub mod amazon {
    /// Listing URL prefix; the encoded search term follows directly
    pub const SEARCH_URL: &str = "https://www.amazon.com/s?k=";

    /// Detail page URL prefix; the ASIN follows directly
    pub const DETAIL_URL: &str = "https://www.amazon.com/dp/";

    /// Placeholder identifiers that show up in listings but are not products
    pub const BLOCKLISTED_ASINS: &[&str] = &["B015HS4O1K"];

    /// Attribute carrying the product identifier on listing tiles
    pub const ASIN_ATTRIBUTE: &str = "data-asin";
}

/// Default configuration values
pub mod defaults {
    pub const SEARCH_TERM: &str = "ps5";
    pub const PRICE_MIN: u32 = 275;
    pub const PRICE_MAX: u32 = 650;
    pub const CURRENCY: &str = "USD";
    pub const CURRENCY_SYMBOL: &str = "$";

    /// Default report directory, relative to the working directory
    pub const OUTPUT_DIRECTORY: &str = "reports";

    pub const USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:96.0) Gecko/20100101 Firefox/96.0";
    pub const ACCEPT: &str = "text/html,*/*";
    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";

    /// Generous deadline; pages are slow to render
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 60;

    pub const MAX_ATTEMPTS: u32 = 1;
    pub const REQUEST_DELAY_MS: u64 = 0;
    pub const MAX_CONCURRENT: usize = 4;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "price-scout.log";
}

/// URL building helper functions
pub mod utils {
    /// Referer of the search results page for `term` under `base_url`
    pub fn search_referer(base_url: &str, term: &str) -> String {
        format!("{}{}&ref=nb_sb_noss", base_url, encode_term(term))
    }

    /// Query-encode a search term (spaces become `+`)
    pub fn encode_term(term: &str) -> String {
        url::form_urlencoded::byte_serialize(term.trim().as_bytes()).collect()
    }
}
