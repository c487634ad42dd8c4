//! Pool of HTTP sessions shared by concurrent product fetches
//!
//! Each session is checked out exclusively and returned when its guard drops.
//! The pool size bounds how many requests are in flight at once.

use async_trait::async_trait;
use std::ops::Deref;
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use super::http_client::{FetchError, HttpClient, HttpClientConfig, PageFetcher};

/// Bounded set of reusable HTTP sessions
pub struct SessionPool {
    sessions: Arc<Mutex<Vec<HttpClient>>>,
    permits: Arc<Semaphore>,
    size: usize,
}

impl SessionPool {
    /// Build `size` independent sessions from one configuration
    pub fn new(size: usize, config: &HttpClientConfig) -> Result<Self, FetchError> {
        let sessions = (0..size.max(1))
            .map(|i| {
                HttpClient::with_config(config.clone())
                    .map(|client| client.with_context_label(&format!("session-{i}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_sessions(sessions))
    }

    /// Pool over already-built sessions
    pub fn from_sessions(sessions: Vec<HttpClient>) -> Self {
        let size = sessions.len();
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub const fn size(&self) -> usize {
        self.size
    }

    /// Sessions not currently checked out
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Wait for a free session
    pub async fn checkout(&self) -> Result<PooledSession, FetchError> {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|e| FetchError::Pool(e.to_string()))?;

        let client = self
            .sessions
            .lock()
            .map_err(|e| FetchError::Pool(e.to_string()))?
            .pop()
            .ok_or_else(|| FetchError::Pool("no idle session behind a free permit".to_string()))?;

        debug!(
            "Checked out {} ({} idle)",
            client.context_label().unwrap_or("session"),
            self.permits.available_permits()
        );

        Ok(PooledSession {
            client,
            sessions: Arc::clone(&self.sessions),
            _permit: permit,
        })
    }
}

#[async_trait]
impl PageFetcher for SessionPool {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let session = self.checkout().await?;
        session.fetch_html_string(url).await
    }
}

/// Exclusive use of one session; returns it to the pool on drop
pub struct PooledSession {
    client: HttpClient,
    sessions: Arc<Mutex<Vec<HttpClient>>>,
    // Released after the session is back in the idle list
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledSession {
    type Target = HttpClient;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}

impl Drop for PooledSession {
    fn drop(&mut self) {
        // Clones share the connection pool and cookie jar
        if let Ok(mut idle) = self.sessions.lock() {
            idle.push(self.client.clone());
        }
    }
}
