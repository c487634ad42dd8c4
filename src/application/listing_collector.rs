//! Listing collection: one search page in, product refs out

use scraper::Html;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{ProductRef, SearchQuery};
use crate::infrastructure::config::utils::encode_term;
use crate::infrastructure::{ContextualParser, ListingContext, PageFetcher, ProductListParser};

/// Listing URL: base URL, encoded term, then the price filter clause
pub fn build_search_url(base_url: &str, query: &SearchQuery) -> String {
    format!(
        "{}{}{}",
        base_url,
        encode_term(&query.search_term),
        query.filter.url_clause()
    )
}

/// Fetches the search results page and turns its tiles into refs
pub struct ListingCollector {
    fetcher: Arc<dyn PageFetcher>,
    parser: ProductListParser,
    context: ListingContext,
    base_url: String,
}

impl ListingCollector {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: ProductListParser,
        context: ListingContext,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            parser,
            context,
            base_url: base_url.into(),
        }
    }

    pub fn search_url(&self, query: &SearchQuery) -> String {
        build_search_url(&self.base_url, query)
    }

    /// Refs in listing order. An unreachable or empty listing gives an
    /// empty vector; the caller decides whether to stop.
    pub async fn collect(&self, query: &SearchQuery) -> Vec<ProductRef> {
        let url = self.search_url(query);
        info!("🔍 Collecting listing for '{}': {}", query.search_term, url);

        let body = match self.fetcher.fetch_page(&url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("Listing page could not be fetched: {}", e);
                return Vec::new();
            }
        };

        let refs = self.parse_listing(&body);
        info!("📦 Listing yielded {} candidate products", refs.len());
        refs
    }

    fn parse_listing(&self, body: &str) -> Vec<ProductRef> {
        let html = Html::parse_document(body);
        self.parser.parse_with_context(&html, &self.context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::FetchError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OnePage {
        body: Result<String, FetchError>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for OnePage {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.body.clone()
        }
    }

    fn collector(body: Result<String, FetchError>) -> (ListingCollector, Arc<OnePage>) {
        let fetcher = Arc::new(OnePage {
            body,
            requested: Mutex::new(Vec::new()),
        });
        let context = ListingContext::new("https://www.amazon.com/dp/")
            .with_blocklist(vec!["B015HS4O1K".to_string()]);
        let collector = ListingCollector::new(
            fetcher.clone(),
            ProductListParser::new().unwrap(),
            context,
            "https://www.amazon.com/s?k=",
        );
        (collector, fetcher)
    }

    #[test]
    fn search_url_carries_minor_unit_price_clause() {
        let query = SearchQuery::new("ps5", 275, 650, "USD");
        assert_eq!(
            build_search_url("https://www.amazon.com/s?k=", &query),
            "https://www.amazon.com/s?k=ps5&rh=p_36%3A27500-65000"
        );
    }

    #[test]
    fn search_term_is_query_encoded() {
        let query = SearchQuery::new("ps5 digital", 1, 2, "USD");
        assert_eq!(
            build_search_url("https://www.amazon.com/s?k=", &query),
            "https://www.amazon.com/s?k=ps5+digital&rh=p_36%3A100-200"
        );
    }

    #[tokio::test]
    async fn collect_fetches_the_search_url_and_drops_blocklisted() {
        let body = r#"<div data-asin="B015HS4O1K"></div><div data-asin="B08FC5L3RG"></div><div data-asin="B015HS4O1K"></div>"#;
        let (collector, fetcher) = collector(Ok(body.to_string()));

        let refs = collector.collect(&SearchQuery::new("ps5", 275, 650, "USD")).await;

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].url, "https://www.amazon.com/dp/B08FC5L3RG");
        assert_eq!(
            fetcher.requested.lock().unwrap().as_slice(),
            ["https://www.amazon.com/s?k=ps5&rh=p_36%3A27500-65000"]
        );
    }

    #[tokio::test]
    async fn unreachable_listing_is_empty_not_an_error() {
        let (collector, _) = collector(Err(FetchError::HttpStatus {
            status: 503,
            url: "u".to_string(),
        }));
        let refs = collector.collect(&SearchQuery::new("ps5", 275, 650, "USD")).await;
        assert!(refs.is_empty());
    }
}
