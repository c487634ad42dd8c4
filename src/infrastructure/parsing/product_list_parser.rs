//! Search results parser
//!
//! Pulls product identifiers out of listing tiles in DOM order and turns the
//! survivors into detail-page refs.

use scraper::Html;
use tracing::debug;

use super::config::ListingSelectors;
use super::context::ListingContext;
use super::{ContextualParser, NamedSelector, ParsingResult};
use crate::domain::ProductRef;

/// Parser for extracting product refs from search results pages
pub struct ProductListParser {
    product_tile: NamedSelector,
    identifier_attribute: String,
}

impl ProductListParser {
    /// Create a new product list parser with default selectors
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ListingSelectors::default())
    }

    /// Create parser with custom selector configuration
    pub fn with_config(selectors: &ListingSelectors) -> ParsingResult<Self> {
        Ok(Self {
            product_tile: NamedSelector::parse(&selectors.product_tile)?,
            identifier_attribute: selectors.identifier_attribute.clone(),
        })
    }

    /// Non-empty identifiers in DOM order, duplicates included
    pub fn extract_identifiers(&self, html: &Html) -> Vec<String> {
        html.select(self.product_tile.selector())
            .filter_map(|tile| tile.value().attr(&self.identifier_attribute))
            .map(str::trim)
            .filter(|identifier| !identifier.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ContextualParser for ProductListParser {
    type Output = Vec<ProductRef>;
    type Context = ListingContext;

    fn parse_with_context(&self, html: &Html, context: &Self::Context) -> Self::Output {
        let identifiers = self.extract_identifiers(html);
        let found = identifiers.len();

        let refs: Vec<ProductRef> = identifiers
            .iter()
            .filter(|identifier| !context.is_blocked(identifier))
            .enumerate()
            .map(|(position, identifier)| {
                ProductRef::from_asin(identifier, &context.detail_base_url, position)
            })
            .collect();

        debug!(
            "Listing yielded {} identifiers, {} after blocklist ({})",
            found,
            refs.len(),
            self.product_tile.css()
        );
        refs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html><body>
          <div data-asin="" class="s-result-item"></div>
          <div data-asin="B08FC5L3RG"><h2>PS5</h2></div>
          <div data-asin="B015HS4O1K"></div>
          <div data-asin="B09DFCB66S"></div>
          <span data-asin="B0NOTADIV"></span>
          <div data-asin="B015HS4O1K"></div>
          <div class="no-asin"></div>
        </body></html>
    "#;

    fn context() -> ListingContext {
        ListingContext::new("https://www.amazon.com/dp/")
            .with_blocklist(vec!["B015HS4O1K".to_string()])
    }

    #[test]
    fn test_parser_creation() {
        assert!(ProductListParser::new().is_ok());
    }

    #[test]
    fn identifiers_keep_dom_order_and_skip_empty() {
        let parser = ProductListParser::new().unwrap();
        let html = Html::parse_document(LISTING);
        assert_eq!(
            parser.extract_identifiers(&html),
            vec!["B08FC5L3RG", "B015HS4O1K", "B09DFCB66S", "B015HS4O1K"]
        );
    }

    #[test]
    fn blocklisted_identifier_never_survives() {
        let parser = ProductListParser::new().unwrap();
        let html = Html::parse_document(LISTING);
        let refs = parser.parse_with_context(&html, &context());

        let asins: Vec<_> = refs.iter().map(|r| r.asin.as_str()).collect();
        assert_eq!(asins, vec!["B08FC5L3RG", "B09DFCB66S"]);
        assert_eq!(refs[1].url, "https://www.amazon.com/dp/B09DFCB66S");
        assert_eq!(refs[1].position, 1);
    }

    #[test]
    fn page_without_tiles_gives_no_refs() {
        let parser = ProductListParser::new().unwrap();
        let html = Html::parse_document("<html><body><p>No results</p></body></html>");
        assert!(parser.parse_with_context(&html, &context()).is_empty());
    }
}
