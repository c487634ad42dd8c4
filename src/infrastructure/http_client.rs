//! HTTP client for page fetching
//!
//! One `HttpClient` is one session: its own connection pool and cookie jar.
//! Requests carry browser-like default headers and a per-request deadline;
//! retry with exponential backoff only kicks in when more than one attempt
//! is configured.

#![allow(clippy::uninlined_format_args)]

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::infrastructure::config::AppConfig;

/// Why a page could not be fetched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request to {url} timed out after {timeout_seconds}s")]
    Timeout { url: String, timeout_seconds: u64 },

    #[error("HTTP error {status}: {url}")]
    HttpStatus { status: u16, url: String },

    #[error("HTTP request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Empty response from {url}")]
    EmptyBody { url: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),

    #[error("Session pool is unavailable: {0}")]
    Pool(String),
}

impl FetchError {
    /// Transient failures worth another attempt
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Request { .. } => true,
            Self::HttpStatus { status, .. } => matches!(*status, 408 | 429 | 500 | 502 | 503 | 504),
            Self::EmptyBody { .. } | Self::Client(_) | Self::Pool(_) => false,
        }
    }
}

/// Fetch capability used by the collector and the pipeline
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a page and return its HTML
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub referer: Option<String>,
    /// Request deadline in seconds
    pub timeout_seconds: u64,
    /// Total attempts per request
    pub max_attempts: u32,
    /// Pause before each request
    pub request_delay_ms: u64,
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the application configuration
    pub fn from_app_config(app_config: &AppConfig) -> Self {
        let http = &app_config.http;
        Self {
            user_agent: http.user_agent.clone(),
            accept: http.accept.clone(),
            accept_language: http.accept_language.clone(),
            referer: app_config.referer(),
            timeout_seconds: http.timeout_seconds,
            max_attempts: http.max_attempts.max(1),
            request_delay_ms: http.request_delay_ms,
            follow_redirects: http.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_app_config(&AppConfig::default())
    }
}

/// HTTP session with default headers and a request deadline
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    /// Optional context label for provenance in logs (e.g. "session-2")
    context_label: Option<String>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(Self::default_headers(&config)?)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            context_label: None,
        })
    }

    fn default_headers(config: &HttpClientConfig) -> Result<HeaderMap, FetchError> {
        let value = |name: &str, raw: &str| {
            HeaderValue::from_str(raw)
                .map_err(|e| FetchError::Client(format!("invalid {} header: {}", name, e)))
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, value("accept", &config.accept)?);
        headers.insert(ACCEPT_LANGUAGE, value("accept-language", &config.accept_language)?);
        if let Some(referer) = &config.referer {
            headers.insert(REFERER, value("referer", referer)?);
        }
        Ok(headers)
    }

    /// Set a human-readable context label for logging provenance
    pub fn with_context_label(mut self, label: &str) -> Self {
        self.context_label = Some(label.to_string());
        self
    }

    pub fn context_label(&self) -> Option<&str> {
        self.context_label.as_deref()
    }

    pub const fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Fetch HTML content as a string, retrying transient failures when
    /// more than one attempt is configured
    pub async fn fetch_html_string(&self, url: &str) -> Result<String, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.fetch_html_string_once(url).await {
                Ok(html) => {
                    debug!("Fetched {} on attempt {}", url, attempt);
                    return Ok(html);
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay_seconds = 2_u64.pow(attempt - 1);
                    warn!(
                        "Attempt {}/{} failed for {}: {} (retrying in {}s)",
                        attempt, max_attempts, url, e, delay_seconds
                    );
                    sleep(Duration::from_secs(delay_seconds)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Single attempt to fetch HTML content as string
    async fn fetch_html_string_once(&self, url: &str) -> Result<String, FetchError> {
        if self.config.request_delay_ms > 0 {
            sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        match &self.context_label {
            Some(label) => info!("🌐 HTTP GET ({}): {}", label, url),
            None => info!("🌐 HTTP GET: {}", url),
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("❌ HTTP error {}: {}", status, url);
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let html_content = response.text().await.map_err(|e| self.classify(url, &e))?;

        if html_content.trim().is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        Ok(html_content)
    }

    fn classify(&self, url: &str, error: &reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_seconds: self.config.timeout_seconds,
            }
        } else if let Some(status) = error.status() {
            FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_html_string(url).await
    }
}

/// Status codes the retry loop treats as transient
pub fn is_retryable_status(status: StatusCode) -> bool {
    FetchError::HttpStatus {
        status: status.as_u16(),
        url: String::new(),
    }
    .is_retryable()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        assert!(HttpClient::with_config(HttpClientConfig::default()).is_ok());
    }

    #[test]
    fn test_custom_config() {
        let config = HttpClientConfig {
            timeout_seconds: 10,
            max_attempts: 2,
            user_agent: "Test Agent".to_string(),
            referer: None,
            follow_redirects: false,
            ..HttpClientConfig::default()
        };
        let client = HttpClient::with_config(config).unwrap().with_context_label("session-0");
        assert_eq!(client.context_label(), Some("session-0"));
        assert_eq!(client.config().max_attempts, 2);
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        let config = HttpClientConfig {
            referer: Some("bad\nvalue".to_string()),
            ..HttpClientConfig::default()
        };
        assert!(matches!(
            HttpClient::with_config(config),
            Err(FetchError::Client(_))
        ));
    }

    #[test]
    fn default_config_sends_search_referer() {
        let config = HttpClientConfig::default();
        assert_eq!(
            config.referer.as_deref(),
            Some("https://www.amazon.com/s?k=ps5&ref=nb_sb_noss")
        );
        assert_eq!(config.timeout_seconds, 60);
    }

    #[test]
    fn retry_classification() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!FetchError::EmptyBody { url: "u".into() }.is_retryable());
    }
}
