//! One complete run: listing, products, report file

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use super::product_pipeline::ProductPipeline;
use super::report_builder::build_report;
use crate::infrastructure::{AppConfig, HttpClientConfig, PageFetcher, ReportWriter, SessionPool};

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A report was written, possibly with zero products
    ReportWritten { path: PathBuf, product_count: usize },
    /// The listing had no products; nothing was written
    NoListings,
}

/// Search use case over validated configuration
pub struct SearchRun {
    config: AppConfig,
}

impl SearchRun {
    pub fn new(config: AppConfig) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        Ok(Self { config })
    }

    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run against the live site through a pool of HTTP sessions
    pub async fn execute(&self) -> Result<RunOutcome> {
        let pool = SessionPool::new(
            self.config.pipeline.max_concurrent,
            &HttpClientConfig::from_app_config(&self.config),
        )
        .context("Failed to create HTTP sessions")?;
        info!("🌐 Session pool ready with {} sessions", pool.size());

        self.execute_with(Arc::new(pool)).await
    }

    /// Run with any page source
    pub async fn execute_with(&self, fetcher: Arc<dyn PageFetcher>) -> Result<RunOutcome> {
        let query = self.config.search_query();
        let pipeline = ProductPipeline::from_config(&self.config, fetcher)?;

        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id, term = %query.search_term, mode = %pipeline.mode());
        let outcome = pipeline.run(&query).instrument(span).await;
        if outcome.is_stopped() {
            warn!("Run stopped: no listings, no report written");
            return Ok(RunOutcome::NoListings);
        }

        let report = build_report(
            &query.search_term,
            &query,
            &self.config.search.base_url,
            &self.config.search.currency,
            outcome.records,
        );
        let product_count = report.product_count;
        let path = ReportWriter::write(&report, &self.config.output.directory).await?;

        Ok(RunOutcome::ReportWritten {
            path,
            product_count,
        })
    }
}
