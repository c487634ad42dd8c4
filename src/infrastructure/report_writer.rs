//! Report persistence
//!
//! One pretty-printed JSON file per search term. An existing file with the
//! same name is replaced.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

use crate::domain::Report;

/// Writes run reports into an output directory
pub struct ReportWriter;

impl ReportWriter {
    /// File name for a search term; path separators become `_`
    pub fn file_name(term: &str) -> String {
        let stem: String = term
            .trim()
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("{}.json", stem)
    }

    /// Pruned JSON text exactly as it is written to disk
    pub fn render(report: &Report) -> Result<String> {
        let value = report
            .to_pruned_value()
            .context("Failed to serialize report")?;
        serde_json::to_string_pretty(&value).context("Failed to format report JSON")
    }

    /// Create `dir` if needed and write `{dir}/{title}.json`
    pub async fn write(report: &Report, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create output directory {:?}", dir))?;

        let path = dir.join(Self::file_name(&report.title));
        let content = Self::render(report)?;

        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write report to {:?}", path))?;

        info!(
            "💾 Report with {} products written to {:?}",
            report.product_count, path
        );
        Ok(path)
    }
}
