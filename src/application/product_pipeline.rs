//! Product pipeline: listing, detail fetch, extraction, validity filter
//!
//! Sequential mode handles one product at a time. Concurrent mode spawns one
//! task per product; the fetcher (a session pool in production) bounds how
//! many requests are actually in flight. Both return records in listing order.

use anyhow::{Context, Result};
use futures::future::join_all;
use scraper::Html;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, info_span, warn};

use super::listing_collector::ListingCollector;
use crate::domain::{ProductRecord, ProductRef, SearchQuery};
use crate::infrastructure::{
    AppConfig, ContextualParser, DetailParseContext, ExecutionMode, ListingContext, PageFetcher,
    ProductDetailParser, ProductListParser,
};

/// Result of one pipeline pass
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    /// Refs the listing produced, before any detail page was read
    pub listed: usize,
    /// Valid records in listing order
    pub records: Vec<ProductRecord>,
}

impl PipelineOutcome {
    pub const fn is_stopped(&self) -> bool {
        self.listed == 0
    }
}

pub struct ProductPipeline {
    collector: ListingCollector,
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<ProductDetailParser>,
    mode: ExecutionMode,
}

impl ProductPipeline {
    pub fn new(
        collector: ListingCollector,
        fetcher: Arc<dyn PageFetcher>,
        parser: ProductDetailParser,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            collector,
            fetcher,
            parser: Arc::new(parser),
            mode,
        }
    }

    /// Wire collector and extractor from configuration around one fetcher
    pub fn from_config(config: &AppConfig, fetcher: Arc<dyn PageFetcher>) -> Result<Self> {
        let list_parser = ProductListParser::with_config(&config.parsing.listing)
            .context("Invalid listing selectors")?;
        let detail_parser = ProductDetailParser::with_config(
            &config.parsing.detail,
            &config.search.currency_symbol,
        )
        .context("Invalid detail selectors")?;

        let context = ListingContext::new(config.search.detail_base_url.clone())
            .with_blocklist(config.search.blocklist.clone());
        let collector = ListingCollector::new(
            Arc::clone(&fetcher),
            list_parser,
            context,
            config.search.base_url.clone(),
        );

        Ok(Self::new(collector, fetcher, detail_parser, config.pipeline.mode))
    }

    pub const fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn collector(&self) -> &ListingCollector {
        &self.collector
    }

    /// Valid records for `query`, in listing order
    pub async fn build(&self, query: &SearchQuery) -> Vec<ProductRecord> {
        self.run(query).await.records
    }

    pub async fn run(&self, query: &SearchQuery) -> PipelineOutcome {
        let refs = self.collector.collect(query).await;
        if refs.is_empty() {
            warn!("⏹️ No products listed for '{}', stopped", query.search_term);
            return PipelineOutcome {
                listed: 0,
                records: Vec::new(),
            };
        }

        let listed = refs.len();
        info!("🚀 Harvesting {} products ({} mode)", listed, self.mode);

        let candidates = match self.mode {
            ExecutionMode::Sequential => self.harvest_sequential(refs).await,
            ExecutionMode::Concurrent => self.harvest_concurrent(refs).await,
        };

        let records: Vec<ProductRecord> = candidates
            .into_iter()
            .filter(|record| {
                let keep = record.is_valid();
                if !keep {
                    debug!("Dropping incomplete record for {}", record.asin);
                }
                keep
            })
            .collect();

        info!("✅ {} of {} products are complete", records.len(), listed);
        PipelineOutcome { listed, records }
    }

    async fn harvest_sequential(&self, refs: Vec<ProductRef>) -> Vec<ProductRecord> {
        let mut candidates = Vec::with_capacity(refs.len());
        for product in refs {
            let span = product_span(&product);
            candidates.push(
                harvest_one(self.fetcher.as_ref(), &self.parser, product)
                    .instrument(span)
                    .await,
            );
        }
        candidates
    }

    async fn harvest_concurrent(&self, refs: Vec<ProductRef>) -> Vec<ProductRecord> {
        let tasks: Vec<_> = refs
            .into_iter()
            .map(|product| {
                let fetcher = Arc::clone(&self.fetcher);
                let parser = Arc::clone(&self.parser);
                let span = product_span(&product);
                tokio::spawn(
                    async move { harvest_one(fetcher.as_ref(), &parser, product).await }
                        .instrument(span),
                )
            })
            .collect();

        // join_all keeps spawn order, which is listing order
        join_all(tasks)
            .await
            .into_iter()
            .filter_map(|joined| match joined {
                Ok(record) => Some(record),
                Err(e) => {
                    error!("Product task failed: {}", e);
                    None
                }
            })
            .collect()
    }
}

fn product_span(product: &ProductRef) -> tracing::Span {
    info_span!("product", asin = %product.asin, position = product.position)
}

/// Fetch and extract one product. A failed fetch yields an empty candidate.
async fn harvest_one(
    fetcher: &dyn PageFetcher,
    parser: &ProductDetailParser,
    product: ProductRef,
) -> ProductRecord {
    let fetched = fetcher.fetch_page(product.url()).await;
    match fetched {
        Ok(body) => {
            let record = extract_record(parser, &body, product);
            info!(
                title = record.title.as_deref().unwrap_or_default(),
                price = ?record.price,
                rating = ?record.rating,
                "Harvested {}",
                record.url
            );
            record
        }
        Err(e) => {
            warn!("Detail page for {} could not be fetched: {}", product, e);
            ProductRecord::empty(&product)
        }
    }
}

// Html is not Send, so parsing stays out of the async fn body
fn extract_record(parser: &ProductDetailParser, body: &str, product: ProductRef) -> ProductRecord {
    let html = Html::parse_document(body);
    parser.parse_with_context(&html, &DetailParseContext::new(product))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::FetchError;
    use async_trait::async_trait;
    use rstest::rstest;
    use std::collections::HashMap;
    use std::time::Duration;

    const SEARCH: &str = "https://www.amazon.com/s?k=ps5&rh=p_36%3A27500-65000";

    /// Serves canned pages; later products answer faster to scramble completion order
    struct CannedSite {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for CannedSite {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            let delay = if url.ends_with("A1") { 30 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.pages.get(url).cloned().ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                url: url.to_string(),
            })
        }
    }

    fn detail(title: &str, price: &str, rating: &str) -> String {
        format!(
            r#"<html><body>
                 <span id="productTitle">{title}</span>
                 <span class="apexPriceToPay">{price}</span>
                 <span class="a-icon-alt">{rating} out of 5 stars</span>
               </body></html>"#
        )
    }

    fn site(listing: &str) -> CannedSite {
        let mut pages = HashMap::new();
        pages.insert(SEARCH.to_string(), listing.to_string());
        pages.insert("https://www.amazon.com/dp/A1".into(), detail("One", "$10.00", "4.0"));
        pages.insert("https://www.amazon.com/dp/A2".into(), detail("Two", "$20.00", "4.5"));
        // No rating: invalid
        pages.insert(
            "https://www.amazon.com/dp/A3".into(),
            r#"<span id="productTitle">Three</span><span class="apexPriceToPay">$5</span>"#.into(),
        );
        pages.insert("https://www.amazon.com/dp/A5".into(), detail("Five", "$50.00", "3.9"));
        // No title element: empty title, still valid
        pages.insert(
            "https://www.amazon.com/dp/A6".into(),
            r#"<span class="apexPriceToPay">$10.00</span><span class="a-icon-alt">4.5 out of 5 stars</span>"#.into(),
        );
        CannedSite { pages }
    }

    fn pipeline(listing: &str, mode: ExecutionMode) -> ProductPipeline {
        let fetcher: Arc<dyn PageFetcher> = Arc::new(site(listing));
        ProductPipeline::from_config(&AppConfig::default(), fetcher)
            .unwrap()
            .with_mode(mode)
    }

    impl ProductPipeline {
        fn with_mode(mut self, mode: ExecutionMode) -> Self {
            self.mode = mode;
            self
        }
    }

    const LISTING: &str = r#"
        <div data-asin="A1"></div>
        <div data-asin="B015HS4O1K"></div>
        <div data-asin="A2"></div>
        <div data-asin="A3"></div>
        <div data-asin="A4"></div>
        <div data-asin="A5"></div>
    "#;

    #[rstest]
    #[case(ExecutionMode::Sequential)]
    #[case(ExecutionMode::Concurrent)]
    #[tokio::test]
    async fn keeps_valid_records_in_listing_order(#[case] mode: ExecutionMode) {
        let outcome = pipeline(LISTING, mode)
            .run(&SearchQuery::new("ps5", 275, 650, "USD"))
            .await;

        // A3 lacks a rating, A4 has no detail page
        assert_eq!(outcome.listed, 5);
        let asins: Vec<_> = outcome.records.iter().map(|r| r.asin.as_str()).collect();
        assert_eq!(asins, vec!["A1", "A2", "A5"]);
        assert!(outcome.records.iter().all(ProductRecord::is_valid));
    }

    #[tokio::test]
    async fn empty_listing_stops_the_run() {
        let pipeline = pipeline("<html><body></body></html>", ExecutionMode::Concurrent);
        let outcome = pipeline.run(&SearchQuery::new("ps5", 275, 650, "USD")).await;
        assert!(outcome.is_stopped());
        assert!(outcome.records.is_empty());
    }

    #[tokio::test]
    async fn build_returns_only_records() {
        let pipeline = pipeline(LISTING, ExecutionMode::Sequential);
        let records = pipeline.build(&SearchQuery::new("ps5", 275, 650, "USD")).await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].price, Some(20.0));
    }

    #[tokio::test]
    async fn untitled_page_with_price_and_rating_is_kept() {
        let pipeline = pipeline(r#"<div data-asin="A6"></div>"#, ExecutionMode::Concurrent);
        let records = pipeline.build(&SearchQuery::new("ps5", 275, 650, "USD")).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title.as_deref(), Some(""));
        assert_eq!(records[0].price, Some(10.0));
        assert_eq!(records[0].rating, Some(4.5));
    }

    #[test]
    fn collector_targets_the_configured_search_url() {
        let pipeline = pipeline(LISTING, ExecutionMode::Sequential);
        assert_eq!(
            pipeline.collector().search_url(&SearchQuery::new("ps5", 275, 650, "USD")),
            SEARCH
        );
        assert_eq!(pipeline.mode(), ExecutionMode::Sequential);
    }
}
